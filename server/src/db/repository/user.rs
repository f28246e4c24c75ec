//! User Repository
//!
//! Loyalty point mutations are single conditional updates — no
//! read-then-write pairs, so concurrent debits cannot overdraw.

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::User;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub fn record_id(id: &str) -> RepoResult<RecordId> {
        parse_record_id(TABLE, id)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let rid = Self::record_id(id)?;
        let user: Option<User> = self.base.db().select(rid).await?;
        Ok(user)
    }

    pub async fn create(&self, user: User) -> RepoResult<User> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "User '{}' already exists",
                user.email
            )));
        }
        let created: Option<User> = self.base.db().create(TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Current point balance
    pub async fn get_points(&self, user_id: &str) -> RepoResult<i64> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", user_id)))?;
        Ok(user.points)
    }

    /// Atomic conditional point debit
    ///
    /// Returns `false` when the balance is below `amount` (nothing is written).
    pub async fn try_debit_points(&self, user_id: &str, amount: i64) -> RepoResult<bool> {
        let rid = Self::record_id(user_id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $user SET points -= $amount WHERE points >= $amount RETURN AFTER")
            .bind(("user", rid))
            .bind(("amount", amount))
            .await?;
        let updated: Vec<User> = result.take(0)?;
        Ok(!updated.is_empty())
    }

    /// Unconditional point credit (refunds, rewards)
    pub async fn credit_points(&self, user_id: &str, amount: i64) -> RepoResult<()> {
        let rid = Self::record_id(user_id)?;
        self.base
            .db()
            .query("UPDATE $user SET points += $amount")
            .bind(("user", rid))
            .bind(("amount", amount))
            .await?
            .check()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::utils::now_millis;

    async fn seed_user(repo: &UserRepository, points: i64) -> String {
        let mut user = User::new("Test".to_string(), "test@example.com".to_string(), now_millis());
        user.points = points;
        let created = repo.create(user).await.unwrap();
        created.id.unwrap().to_string()
    }

    #[tokio::test]
    async fn test_debit_points_insufficient_balance() {
        let db = connect_memory().await;
        let repo = UserRepository::new(db);
        let id = seed_user(&repo, 30).await;

        assert!(!repo.try_debit_points(&id, 50).await.unwrap());
        assert_eq!(repo.get_points(&id).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_debit_then_credit_roundtrip() {
        let db = connect_memory().await;
        let repo = UserRepository::new(db);
        let id = seed_user(&repo, 100).await;

        assert!(repo.try_debit_points(&id, 70).await.unwrap());
        assert_eq!(repo.get_points(&id).await.unwrap(), 30);

        repo.credit_points(&id, 70).await.unwrap();
        assert_eq!(repo.get_points(&id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = connect_memory().await;
        let repo = UserRepository::new(db);
        seed_user(&repo, 0).await;

        let dup = User::new("Other".to_string(), "test@example.com".to_string(), now_millis());
        assert!(matches!(
            repo.create(dup).await,
            Err(RepoError::Duplicate(_))
        ));
    }
}
