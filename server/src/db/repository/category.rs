//! Category Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Category, CategoryCreate, CategoryUpdate};
use crate::utils::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "category";

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category ORDER BY name")
            .await?
            .take(0)?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Category>> {
        let rid = parse_record_id(TABLE, id)?;
        let category: Option<Category> = self.base.db().select(rid).await?;
        Ok(category)
    }

    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let name = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM category WHERE name = $name LIMIT 1")
            .bind(("name", name))
            .await?;
        let categories: Vec<Category> = result.take(0)?;
        Ok(categories.into_iter().next())
    }

    pub async fn create(&self, data: CategoryCreate) -> RepoResult<Category> {
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Category '{}' already exists",
                data.name
            )));
        }

        let category = Category {
            id: None,
            name: data.name,
            description: data.description,
            created_at: now_millis(),
        };

        let created: Option<Category> = self.base.db().create(TABLE).content(category).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create category".to_string()))
    }

    pub async fn update(&self, id: &str, data: CategoryUpdate) -> RepoResult<Category> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)))?;

        if let Some(ref new_name) = data.name
            && new_name != &existing.name
            && self.find_by_name(new_name).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Category '{}' already exists",
                new_name
            )));
        }

        let rid = parse_record_id(TABLE, id)?;
        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", rid))
            .bind(("data", data))
            .await?
            .check()?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Category {} not found", id)))
    }

    /// Delete a category along with its products
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(TABLE, id)?;

        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }

        self.base
            .db()
            .query("DELETE product WHERE category = $cat_str; DELETE $cat;")
            .bind(("cat_str", rid.to_string()))
            .bind(("cat", rid))
            .await?
            .check()?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::db::models::ProductCreate;
    use crate::db::repository::ProductRepository;

    #[tokio::test]
    async fn test_create_and_duplicate_name() {
        let db = connect_memory().await;
        let repo = CategoryRepository::new(db);

        let created = repo
            .create(CategoryCreate {
                name: "Books".to_string(),
                description: None,
            })
            .await
            .unwrap();
        assert!(created.id.is_some());

        let dup = repo
            .create(CategoryCreate {
                name: "Books".to_string(),
                description: Some("again".to_string()),
            })
            .await;
        assert!(matches!(dup, Err(RepoError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_products() {
        let db = connect_memory().await;
        let categories = CategoryRepository::new(db.clone());
        let products = ProductRepository::new(db);

        let cat = categories
            .create(CategoryCreate {
                name: "Toys".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let cat_id = cat.id.unwrap().to_string();

        let product = products
            .create(ProductCreate {
                name: "Kite".to_string(),
                description: String::new(),
                price: 9.99,
                category: Some(cat_id.clone()),
                stock_quantity: 5,
            })
            .await
            .unwrap();

        assert!(categories.delete(&cat_id).await.unwrap());
        let gone = products
            .find_by_id(&product.id.unwrap().to_string())
            .await
            .unwrap();
        assert!(gone.is_none());
    }
}
