// Enrichment composer: attaches projected fields from related rows onto
// primary records. Lookups are batched per rule - distinct foreign-key
// values are collected first and resolved with a single IN-query per
// target table, never one query per row.

use std::collections::{BTreeSet, HashMap};

use serde_json::{json, Map, Value};
use sqlx::{PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::bind_value_query;
use crate::error::ApiError;
use crate::filter::Filter;

/// Placeholder for a projected field whose target row is missing.
pub const NOT_PROVIDED: &str = "not provided";

#[derive(Debug, Clone, Copy)]
pub enum Projection {
    /// Attach `{column: value, ...}` under the output key, or null when
    /// the foreign key is unset or its row is gone.
    Object,
    /// Attach a single column's value under the output key, or the
    /// `NOT_PROVIDED` sentinel.
    Field(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct EmbedRule {
    /// Foreign-key field on the primary record.
    pub fk: &'static str,
    /// Target table the key points into.
    pub table: &'static str,
    /// Columns projected from the target row.
    pub columns: &'static [&'static str],
    /// Key the projection lands under on the output record.
    pub key: &'static str,
    pub projection: Projection,
}

/// Apply every rule to the given records in place.
pub async fn embed(
    pool: &PgPool,
    rows: &mut [Value],
    rules: &[EmbedRule],
) -> Result<(), ApiError> {
    for rule in rules {
        let ids = collect_fk_values(rows, rule.fk);
        let lookup = if ids.is_empty() {
            HashMap::new()
        } else {
            fetch_lookup(pool, rule, &ids).await?
        };
        apply(rows, rule, &lookup);
    }
    Ok(())
}

/// Distinct, non-null foreign-key values across the batch.
fn collect_fk_values(rows: &[Value], fk: &str) -> Vec<String> {
    let mut ids = BTreeSet::new();
    for row in rows {
        if let Some(id) = row.get(fk).and_then(Value::as_str) {
            ids.insert(id.to_string());
        }
    }
    ids.into_iter().collect()
}

/// One IN-query against the target table, keyed by id.
async fn fetch_lookup(
    pool: &PgPool,
    rule: &EmbedRule,
    ids: &[String],
) -> Result<HashMap<String, Value>, ApiError> {
    let mut columns: Vec<String> = vec!["id".to_string()];
    columns.extend(rule.columns.iter().map(|c| c.to_string()));

    let mut filter = Filter::new(rule.table)?;
    filter
        .select(columns)?
        .where_clause(json!({ "id": { "$in": ids } }))?;
    let inner = filter.to_sql()?;

    // row_to_json keeps the projection generic over target tables
    let query = format!("SELECT row_to_json(t) AS row FROM ({}) t", inner.query);
    let mut q = sqlx::query(&query);
    for p in inner.params.iter() {
        q = bind_value_query(q, p);
    }
    let rows = q
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::Sqlx)?;

    let mut lookup = HashMap::new();
    for row in rows {
        let value: Value = row.try_get("row").map_err(DatabaseError::Sqlx)?;
        if let Some(id) = value.get("id").and_then(Value::as_str) {
            lookup.insert(id.to_string(), value);
        }
    }
    Ok(lookup)
}

/// Map resolved target rows back onto the primary records.
fn apply(rows: &mut [Value], rule: &EmbedRule, lookup: &HashMap<String, Value>) {
    for row in rows {
        let Some(record) = row.as_object_mut() else {
            continue;
        };
        let target = record
            .get(rule.fk)
            .and_then(Value::as_str)
            .and_then(|id| lookup.get(id));

        let projected = match rule.projection {
            Projection::Object => match target {
                Some(found) => Value::Object(project_columns(found, rule.columns)),
                None => Value::Null,
            },
            Projection::Field(column) => target
                .and_then(|found| found.get(column))
                .cloned()
                .unwrap_or_else(|| Value::String(NOT_PROVIDED.to_string())),
        };
        record.insert(rule.key.to_string(), projected);
    }
}

fn project_columns(source: &Value, columns: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    for column in columns {
        out.insert(
            column.to_string(),
            source.get(*column).cloned().unwrap_or(Value::Null),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ARTIST_NAME: EmbedRule = EmbedRule {
        fk: "user_id",
        table: "users",
        columns: &["name"],
        key: "artist_name",
        projection: Projection::Field("name"),
    };

    const CLIENT_EMBED: EmbedRule = EmbedRule {
        fk: "client_id",
        table: "users",
        columns: &["name", "email"],
        key: "client",
        projection: Projection::Object,
    };

    #[test]
    fn collects_distinct_non_null_keys() {
        let rows = vec![
            json!({ "user_id": "a" }),
            json!({ "user_id": "b" }),
            json!({ "user_id": "a" }),
            json!({ "user_id": null }),
        ];
        assert_eq!(collect_fk_values(&rows, "user_id"), vec!["a", "b"]);
    }

    #[test]
    fn field_projection_attaches_value_or_placeholder() {
        let mut rows = vec![
            json!({ "id": "t1", "user_id": "a" }),
            json!({ "id": "t2", "user_id": "gone" }),
            json!({ "id": "t3", "user_id": null }),
        ];
        let mut lookup = HashMap::new();
        lookup.insert("a".to_string(), json!({ "id": "a", "name": "Ana" }));

        apply(&mut rows, &ARTIST_NAME, &lookup);

        assert_eq!(rows[0]["artist_name"], "Ana");
        assert_eq!(rows[1]["artist_name"], NOT_PROVIDED);
        assert_eq!(rows[2]["artist_name"], NOT_PROVIDED);
    }

    #[test]
    fn object_projection_attaches_selected_columns_or_null() {
        let mut rows = vec![
            json!({ "id": "b1", "client_id": "c1" }),
            json!({ "id": "b2", "client_id": null }),
        ];
        let mut lookup = HashMap::new();
        lookup.insert(
            "c1".to_string(),
            json!({ "id": "c1", "name": "Chloe", "email": "chloe@example.com", "role": "client" }),
        );

        apply(&mut rows, &CLIENT_EMBED, &lookup);

        assert_eq!(
            rows[0]["client"],
            json!({ "name": "Chloe", "email": "chloe@example.com" })
        );
        assert_eq!(rows[1]["client"], Value::Null);
    }
}
