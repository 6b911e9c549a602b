//! Process-local gateway.
//!
//! Tables are vectors of JSON documents behind a `tokio::sync::RwLock`.
//! IDs and `created_at` timestamps are generated on insert the way the
//! hosted backend's column defaults would.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use super::{
    Direction, Filter, Gateway, GatewayError, Record, Table, from_document, to_document,
};

type Document = Map<String, Value>;

/// In-memory implementation of [`Gateway`].
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    tables: RwLock<HashMap<Table, Vec<Document>>>,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }
}

impl Gateway for InMemoryGateway {
    #[instrument(skip(self), fields(table = %R::TABLE))]
    async fn select<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, GatewayError> {
        filter.validate(R::TABLE)?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Document> = tables
            .get(&R::TABLE)
            .map(|rows| rows.iter().filter(|row| matches(row, filter)).collect())
            .unwrap_or_default();

        if let Some((column, direction)) = filter.order() {
            // Stable sort: rows with equal keys keep insertion order.
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        rows.into_iter()
            .map(|row| from_document(Value::Object(row.clone())))
            .collect()
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
        let mut document = to_document(R::TABLE, draft)?;
        document
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        if R::TABLE.has_column("created_at") {
            document
                .entry("created_at")
                .or_insert_with(|| serde_json::to_value(Utc::now()).unwrap_or(Value::Null));
        }

        // Decode before storing so a bad draft never lands in the table.
        let record = from_document::<R>(Value::Object(document.clone()))?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(R::TABLE).or_default();
        check_unique(R::TABLE, rows, &document, None)?;
        rows.push(document);
        Ok(record)
    }

    #[instrument(skip(self, id, patch), fields(table = %R::TABLE, id = %id))]
    async fn update<R: Record, P: Serialize + Sync>(
        &self,
        id: R::Id,
        patch: &P,
    ) -> Result<R, GatewayError> {
        let patch = to_document(R::TABLE, patch)?;
        let id = id.to_string();

        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(&R::TABLE).ok_or(GatewayError::NotFound)?;
        let index = rows
            .iter()
            .position(|row| text_of(row.get("id")).as_deref() == Some(id.as_str()))
            .ok_or(GatewayError::NotFound)?;

        let mut updated = rows.get(index).cloned().ok_or(GatewayError::NotFound)?;
        updated.extend(patch);
        let record = from_document::<R>(Value::Object(updated.clone()))?;
        check_unique(R::TABLE, rows, &updated, Some(index))?;

        if let Some(slot) = rows.get_mut(index) {
            *slot = updated;
        }
        Ok(record)
    }

    #[instrument(skip(self), fields(table = %table))]
    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, GatewayError> {
        filter.validate(table)?;
        if filter.is_unfiltered() {
            return Err(GatewayError::UnfilteredDelete(table));
        }

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, filter));
        Ok(u64::try_from(before - rows.len()).unwrap_or(u64::MAX))
    }
}

/// Unique keys mirrored from the `PostgreSQL` schema.
fn unique_keys(table: Table) -> &'static [&'static [&'static str]] {
    match table {
        Table::Categories | Table::Products => &[&["slug"]],
        Table::Users => &[&["email"]],
        Table::UserPasswords => &[&["user_id"]],
        Table::CartItems => &[&["user_id", "product_id"], &["session_id", "product_id"]],
    }
}

fn check_unique(
    table: Table,
    rows: &[Document],
    candidate: &Document,
    skip: Option<usize>,
) -> Result<(), GatewayError> {
    for key in unique_keys(table) {
        // NULLs never collide, as in SQL.
        let values: Option<Vec<String>> =
            key.iter().map(|column| text_of(candidate.get(*column))).collect();
        let Some(values) = values else {
            continue;
        };

        let collides = rows.iter().enumerate().any(|(index, row)| {
            Some(index) != skip
                && key
                    .iter()
                    .zip(&values)
                    .all(|(column, value)| text_of(row.get(*column)).as_ref() == Some(value))
        });
        if collides {
            return Err(GatewayError::Conflict(format!(
                "duplicate {table} ({})",
                key.join(", ")
            )));
        }
    }
    Ok(())
}

fn matches(row: &Document, filter: &Filter) -> bool {
    filter
        .conditions()
        .iter()
        .all(|(column, expected)| text_of(row.get(*column)).as_deref() == Some(expected.as_str()))
}

/// Text form of a stored value, mirroring `column::text` in SQL.
fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Order values the way the backend would: timestamps chronologically,
/// numbers numerically, everything else by text. NULLs sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (parse_timestamp(x), parse_timestamp(y)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Widget {
        id: Uuid,
        slug: String,
        name: String,
        created_at: DateTime<Utc>,
    }

    #[derive(Serialize)]
    struct NewWidget {
        slug: String,
        name: String,
    }

    impl Record for Widget {
        const TABLE: Table = Table::Categories;
        type Id = Uuid;
        type Draft = NewWidget;
    }

    fn draft(slug: &str, name: &str) -> NewWidget {
        NewWidget {
            slug: slug.to_owned(),
            name: name.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_id_and_timestamp() {
        let gateway = InMemoryGateway::new();
        let a: Widget = gateway.insert(&draft("a", "Alpha")).await.unwrap();
        let b: Widget = gateway.insert(&draft("b", "Beta")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(b.created_at >= a.created_at);
        assert_eq!(gateway.row_count(Table::Categories).await, 2);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_unique_key() {
        let gateway = InMemoryGateway::new();
        let _: Widget = gateway.insert(&draft("a", "Alpha")).await.unwrap();
        let err = gateway
            .insert::<Widget>(&draft("a", "Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let gateway = InMemoryGateway::new();
        for (slug, name) in [("c", "Cherry"), ("a", "Apple"), ("b", "Banana")] {
            let _: Widget = gateway.insert(&draft(slug, name)).await.unwrap();
        }

        let ordered: Vec<Widget> = gateway
            .select(&Filter::new().order_by("name", Direction::Desc))
            .await
            .unwrap();
        let names: Vec<_> = ordered.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["Cherry", "Banana", "Apple"]);

        let only: Vec<Widget> = gateway.select(&Filter::new().eq("slug", "b")).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].slug, "b");
    }

    #[tokio::test]
    async fn test_select_one_not_found() {
        let gateway = InMemoryGateway::new();
        let err = gateway
            .select_one::<Widget>(&Filter::new().eq("slug", "missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        #[derive(Serialize)]
        struct Rename<'a> {
            name: &'a str,
        }

        let gateway = InMemoryGateway::new();
        let widget: Widget = gateway.insert(&draft("a", "Alpha")).await.unwrap();
        let renamed: Widget = gateway
            .update(widget.id, &Rename { name: "Aleph" })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Aleph");
        assert_eq!(renamed.slug, "a");

        let err = gateway
            .update::<Widget, _>(Uuid::new_v4(), &Rename { name: "x" })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_column() {
        #[derive(Serialize)]
        struct Bogus {
            colour: &'static str,
        }

        let gateway = InMemoryGateway::new();
        let widget: Widget = gateway.insert(&draft("a", "Alpha")).await.unwrap();
        let err = gateway
            .update::<Widget, _>(widget.id, &Bogus { colour: "red" })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn test_delete_counts_rows_and_requires_filter() {
        let gateway = InMemoryGateway::new();
        let _: Widget = gateway.insert(&draft("a", "Alpha")).await.unwrap();
        let _: Widget = gateway.insert(&draft("b", "Beta")).await.unwrap();

        let removed = gateway
            .delete(Table::Categories, &Filter::new().eq("slug", "a"))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let removed = gateway
            .delete(Table::Categories, &Filter::new().eq("slug", "a"))
            .await
            .unwrap();
        assert_eq!(removed, 0);

        let err = gateway
            .delete(Table::Categories, &Filter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnfilteredDelete(_)));
    }

    #[test]
    fn test_compare_values_orders_timestamps_chronologically() {
        let early = Value::String("2026-10-17T10:00:05.5Z".to_string());
        let late = Value::String("2026-10-17T10:00:05.50001Z".to_string());
        assert_eq!(compare_values(Some(&early), Some(&late)), Ordering::Less);
        assert_eq!(compare_values(None, Some(&late)), Ordering::Greater);
    }
}
