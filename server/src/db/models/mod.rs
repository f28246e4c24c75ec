//! Database Models
//!
//! Document definitions for the embedded SurrealDB tables.

pub mod cart;
pub mod category;
pub mod favorite;
pub mod notification;
pub mod order;
pub mod product;
pub mod promotion;
pub mod review;
pub mod serde_helpers;
pub mod user;
pub mod viewed_product;

pub use cart::{Cart, CartItem};
pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use favorite::Favorite;
pub use notification::Notification;
pub use order::{LineItem, Order, OrderStatus, PaymentMethod, ShippingInfo, StatusHistoryEntry};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use promotion::{Promotion, PromotionCreate, PromotionKind};
pub use review::Review;
pub use user::User;
pub use viewed_product::ViewedProduct;
