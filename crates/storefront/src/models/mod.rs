//! Domain models for the storefront.
//!
//! Each model is a [`Record`](crate::gateway::Record) of one hosted table,
//! paired with a draft type for inserts and, where callers mutate rows, a
//! patch type whose `None` fields are left untouched.

pub mod cart;
pub mod catalog;
pub mod user;

pub use cart::{CartItem, CartItemPatch, NewCartItem};
pub use catalog::{Category, NewCategory, NewProduct, Product, ProductPatch};
pub use user::{NewUser, NewUserPassword, User, UserPassword};
