//! Backend gateway: generic row access to the hosted tables.
//!
//! The storefront never talks to a database directly. Every read and write
//! goes through a [`Gateway`], which offers the handful of operations a
//! backend-as-a-service exposes: filtered select, single-row select,
//! insert, update by id and filtered delete.
//!
//! # Implementations
//!
//! - [`InMemoryGateway`] - process-local tables, used by tests and demos
//! - [`PgGateway`] - `PostgreSQL` tables in the `shopfront` schema
//!
//! Rows are exchanged as JSON documents, so a [`Record`] is any serde type
//! bound to a [`Table`].

pub mod memory;
pub mod postgres;

use std::fmt;
use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use shopfront_core::OwnerKey;

pub use memory::InMemoryGateway;
pub use postgres::PgGateway;

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested row was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Row in the backend is corrupted or does not match its record type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Record could not be encoded for the backend.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Query references a column the table does not have.
    #[error("unknown column {column} on {table}")]
    UnknownColumn {
        /// Table queried.
        table: Table,
        /// Offending column name.
        column: String,
    },

    /// A delete was issued without any filter condition.
    #[error("refusing to delete every row of {0}")]
    UnfilteredDelete(Table),
}

/// Hosted tables reachable through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Categories,
    Products,
    CartItems,
    Users,
    UserPasswords,
}

impl Table {
    /// Unqualified table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Products => "products",
            Self::CartItems => "cart_items",
            Self::Users => "users",
            Self::UserPasswords => "user_passwords",
        }
    }

    /// Columns of the table. Filters, orderings and writes are checked
    /// against this list.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Categories => &["id", "name", "slug", "created_at"],
            Self::Products => &[
                "id",
                "name",
                "slug",
                "description",
                "price",
                "category_id",
                "image_url",
                "in_stock",
                "created_at",
            ],
            Self::CartItems => &[
                "id",
                "user_id",
                "session_id",
                "product_id",
                "quantity",
                "unit_price",
                "created_at",
            ],
            Self::Users => &["id", "email", "created_at"],
            Self::UserPasswords => &["id", "user_id", "password_hash", "created_at"],
        }
    }

    /// Whether `column` belongs to this table.
    #[must_use]
    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    pub(crate) fn check_column(self, column: &str) -> Result<(), GatewayError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(GatewayError::UnknownColumn {
                table: self,
                column: column.to_owned(),
            })
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed row of a hosted table.
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    /// Table the record lives in.
    const TABLE: Table;

    /// Backend-generated identifier type.
    type Id: fmt::Display + Copy + Send + Sync;

    /// Insert payload: every column except the backend-generated ones.
    type Draft: Serialize + Send + Sync;
}

/// Sort direction for [`Filter::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Equality filter with an optional ordering.
///
/// Values are compared by their text form, which is how the backend renders
/// UUIDs, slugs and emails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(&'static str, String)>,
    order: Option<(&'static str, Direction)>,
}

impl Filter {
    /// An empty filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter rows by primary key.
    #[must_use]
    pub fn by_id(id: impl fmt::Display) -> Self {
        Self::new().eq("id", id)
    }

    /// Filter rows owned by `owner`.
    #[must_use]
    pub fn owned_by(owner: &OwnerKey) -> Self {
        Self::new().eq(owner.column(), owner.id_string())
    }

    /// Add an equality condition.
    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl fmt::Display) -> Self {
        self.conditions.push((column, value.to_string()));
        self
    }

    /// Order results by `column`.
    #[must_use]
    pub const fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some((column, direction));
        self
    }

    /// Equality conditions, in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[(&'static str, String)] {
        &self.conditions
    }

    /// Requested ordering, if any.
    #[must_use]
    pub const fn order(&self) -> Option<(&'static str, Direction)> {
        self.order
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.conditions.is_empty()
    }

    pub(crate) fn validate(&self, table: Table) -> Result<(), GatewayError> {
        for (column, _) in &self.conditions {
            table.check_column(column)?;
        }
        if let Some((column, _)) = self.order {
            table.check_column(column)?;
        }
        Ok(())
    }
}

/// Row-level access to the hosted backend.
///
/// All operations suspend until the backend round-trip completes. The
/// gateway is the sole arbiter of durable state; callers keep caches only.
pub trait Gateway: Send + Sync {
    /// Fetch every row of `R`'s table matching `filter`.
    fn select<R: Record>(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<R>, GatewayError>> + Send;

    /// Fetch exactly one row.
    ///
    /// Fails with [`GatewayError::NotFound`] when nothing matches and
    /// [`GatewayError::Conflict`] when more than one row does.
    fn select_one<R: Record>(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<R, GatewayError>> + Send;

    /// Insert a row, returning it with backend-generated columns filled in.
    fn insert<R: Record>(
        &self,
        draft: &R::Draft,
    ) -> impl Future<Output = Result<R, GatewayError>> + Send;

    /// Apply `patch` to the row with `id`, returning the updated row.
    ///
    /// Only the keys present in the serialized patch are written.
    fn update<R: Record, P: Serialize + Sync>(
        &self,
        id: R::Id,
        patch: &P,
    ) -> impl Future<Output = Result<R, GatewayError>> + Send;

    /// Delete every row of `table` matching `filter`, returning how many
    /// rows were removed.
    fn delete(
        &self,
        table: Table,
        filter: &Filter,
    ) -> impl Future<Output = Result<u64, GatewayError>> + Send;
}

/// Serialize a draft or patch into a JSON object, checking its keys.
pub(crate) fn to_document(
    table: Table,
    value: &impl Serialize,
) -> Result<serde_json::Map<String, serde_json::Value>, GatewayError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => {
            for column in map.keys() {
                table.check_column(column)?;
            }
            Ok(map)
        }
        other => Err(GatewayError::DataCorruption(format!(
            "{table} document must be an object, got {other}"
        ))),
    }
}

/// Decode a backend document into a record.
pub(crate) fn from_document<R: Record>(value: serde_json::Value) -> Result<R, GatewayError> {
    serde_json::from_value(value)
        .map_err(|e| GatewayError::DataCorruption(format!("invalid {} row: {e}", R::TABLE)))
}
