//! `PostgreSQL` gateway.
//!
//! Tables live in the `shopfront` schema (see `crates/storefront/migrations/`).
//! Rows travel as `jsonb`: reads select `to_jsonb(t)`, writes go through
//! `jsonb_populate_record`, so one set of queries serves every [`Record`].
//! Column names are checked against [`Table::columns`] before they are
//! spliced into SQL; values are always bound.

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::{Direction, Filter, Gateway, GatewayError, Record, Table, from_document, to_document};

const SCHEMA: &str = "shopfront";

/// `PostgreSQL` implementation of [`Gateway`].
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    /// Create a gateway over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn qualified(table: Table) -> String {
    format!("{SCHEMA}.{}", table.name())
}

fn push_where(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for (index, (column, value)) in filter.conditions().iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        builder.push(format!("t.\"{column}\"::text = "));
        builder.push_bind(value.clone());
    }
}

fn column_list(document: &serde_json::Map<String, serde_json::Value>) -> String {
    document
        .keys()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Map sqlx errors onto gateway errors, surfacing constraint violations.
fn map_write_error(e: sqlx::Error) -> GatewayError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_unique_violation()
            || db_err.is_check_violation()
            || db_err.is_foreign_key_violation())
    {
        return GatewayError::Conflict(db_err.message().to_owned());
    }
    GatewayError::Database(e)
}

impl Gateway for PgGateway {
    #[instrument(skip(self), fields(table = %R::TABLE))]
    async fn select<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, GatewayError> {
        filter.validate(R::TABLE)?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t) FROM ");
        builder.push(qualified(R::TABLE));
        builder.push(" AS t");
        push_where(&mut builder, filter);
        if let Some((column, direction)) = filter.order() {
            let direction = match direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            builder.push(format!(" ORDER BY t.\"{column}\" {direction}, t.\"id\""));
        }

        let rows: Vec<serde_json::Value> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(from_document).collect()
    }

    async fn select_one<R: Record>(&self, filter: &Filter) -> Result<R, GatewayError> {
        let mut rows = self.select::<R>(filter).await?;
        match rows.len() {
            0 => Err(GatewayError::NotFound),
            1 => rows.pop().ok_or(GatewayError::NotFound),
            n => Err(GatewayError::Conflict(format!(
                "expected one {} row, found {n}",
                R::TABLE
            ))),
        }
    }

    #[instrument(skip(self, draft), fields(table = %R::TABLE))]
    async fn insert<R: Record>(&self, draft: &R::Draft) -> Result<R, GatewayError> {
        let document = to_document(R::TABLE, draft)?;
        let table = qualified(R::TABLE);
        let columns = column_list(&document);

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {table} AS t ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, "
        ));
        builder.push_bind(serde_json::Value::Object(document));
        builder.push(") RETURNING to_jsonb(t)");

        let row: serde_json::Value = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        from_document(row)
    }

    #[instrument(skip(self, id, patch), fields(table = %R::TABLE, id = %id))]
    async fn update<R: Record, P: Serialize + Sync>(
        &self,
        id: R::Id,
        patch: &P,
    ) -> Result<R, GatewayError> {
        let document = to_document(R::TABLE, patch)?;
        if document.is_empty() {
            return self.select_one(&Filter::by_id(id)).await;
        }
        let table = qualified(R::TABLE);
        let columns = column_list(&document);

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {table} AS t SET ({columns}) = (SELECT {columns} FROM jsonb_populate_record(NULL::{table}, "
        ));
        builder.push_bind(serde_json::Value::Object(document));
        builder.push(")) WHERE t.\"id\"::text = ");
        builder.push_bind(id.to_string());
        builder.push(" RETURNING to_jsonb(t)");

        let row: Option<serde_json::Value> = builder
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.map_or(Err(GatewayError::NotFound), from_document)
    }

    #[instrument(skip(self), fields(table = %table))]
    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, GatewayError> {
        filter.validate(table)?;
        if filter.is_unfiltered() {
            return Err(GatewayError::UnfilteredDelete(table));
        }

        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder.push(qualified(table));
        builder.push(" AS t");
        push_where(&mut builder, filter);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }
}
