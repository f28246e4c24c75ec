//! Pricing Module
//!
//! - [`money`] - precise decimal arithmetic for monetary values
//! - [`resolver`] - checkout discount resolution (promotion codes + loyalty points)

pub mod money;
pub mod resolver;

pub use resolver::{DiscountResolver, DiscountSource, Resolution};
