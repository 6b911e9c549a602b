//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod owner;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use owner::{OwnerColumns, OwnerKey, OwnerKeyError};
pub use price::{CurrencyCode, Price};
