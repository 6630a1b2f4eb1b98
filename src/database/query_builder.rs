use serde_json::{Map, Value};
use sqlx::{self, postgres::PgArguments, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::filter::validate_identifier;
use crate::filter::{Filter, FilterData};

/// Statement builder over a single named table. SELECTs are shaped by the
/// filter module; writes take JSON maps of column values and always return
/// the affected rows via RETURNING.
pub struct QueryBuilder<T> {
    table_name: String,
    filter: Option<Filter>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let name = table_name.into();
        // Reuse Filter table name validation
        Filter::new(&name).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(Self {
            table_name: name,
            filter: None,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        let mut filter =
            Filter::new(&self.table_name).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        filter
            .assign(filter_data)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        self.filter = Some(filter);
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.select_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_value_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.select_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_value_query_as(q, p);
        }
        let row = q.fetch_optional(pool).await?;
        Ok(row)
    }

    /// INSERT a single row. Null values are omitted so column defaults
    /// apply; returns the stored row.
    pub async fn insert_one(
        self,
        pool: &PgPool,
        values: &Map<String, Value>,
    ) -> Result<T, DatabaseError> {
        let (columns, params) = split_values(values)?;
        if columns.is_empty() {
            return Err(DatabaseError::QueryError(
                "insert requires at least one value".to_string(),
            ));
        }

        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("${}", i)).collect();
        let query = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            self.table_name,
            columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", "),
            placeholders.join(", "),
        );

        let mut q = sqlx::query_as::<_, T>(&query);
        for p in params.iter() {
            q = bind_value_query_as(q, p);
        }
        let row = q.fetch_one(pool).await?;
        Ok(row)
    }

    /// UPDATE rows matched by the filter; returns the updated rows. A
    /// filter is mandatory so a builder can never issue a blanket update.
    pub async fn update_all(
        self,
        pool: &PgPool,
        values: &Map<String, Value>,
    ) -> Result<Vec<T>, DatabaseError> {
        let (columns, mut params) = split_values(values)?;
        if columns.is_empty() {
            return Err(DatabaseError::QueryError(
                "update requires at least one value".to_string(),
            ));
        }

        let filter = self.filter.ok_or_else(|| {
            DatabaseError::QueryError("update requires a filter".to_string())
        })?;
        let where_result = filter
            .to_where_sql(params.len())
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        if where_result.query.is_empty() {
            return Err(DatabaseError::QueryError(
                "update requires a non-empty filter".to_string(),
            ));
        }

        let set_clause: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("\"{}\" = ${}", c, i + 1))
            .collect();
        let query = format!(
            "UPDATE \"{}\" SET {} WHERE {} RETURNING *",
            self.table_name,
            set_clause.join(", "),
            where_result.query,
        );
        params.extend(where_result.params);

        let mut q = sqlx::query_as::<_, T>(&query);
        for p in params.iter() {
            q = bind_value_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    /// DELETE rows matched by the filter; returns the deleted rows. Same
    /// mandatory-filter rule as update_all.
    pub async fn delete_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let filter = self.filter.ok_or_else(|| {
            DatabaseError::QueryError("delete requires a filter".to_string())
        })?;
        let where_result = filter
            .to_where_sql(0)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        if where_result.query.is_empty() {
            return Err(DatabaseError::QueryError(
                "delete requires a non-empty filter".to_string(),
            ));
        }

        let query = format!(
            "DELETE FROM \"{}\" WHERE {} RETURNING *",
            self.table_name, where_result.query,
        );

        let mut q = sqlx::query_as::<_, T>(&query);
        for p in where_result.params.iter() {
            q = bind_value_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    fn select_sql(&self) -> Result<crate::filter::SqlResult, DatabaseError> {
        if let Some(filter) = &self.filter {
            filter
                .to_sql()
                .map_err(|e| DatabaseError::QueryError(e.to_string()))
        } else {
            Ok(crate::filter::SqlResult {
                query: format!("SELECT * FROM \"{}\"", self.table_name),
                params: vec![],
            })
        }
    }
}

/// Split a JSON map into validated column names and bind values, skipping
/// nulls so absent optional fields never reach the statement.
fn split_values(values: &Map<String, Value>) -> Result<(Vec<String>, Vec<Value>), DatabaseError> {
    let mut columns = Vec::new();
    let mut params = Vec::new();
    for (column, value) in values {
        if value.is_null() {
            continue;
        }
        validate_identifier(column).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        columns.push(column.clone());
        params.push(value.clone());
    }
    Ok((columns, params))
}

pub(crate) fn bind_value_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        // UUID-shaped strings bind as uuid so comparisons against uuid
        // columns resolve without casts
        Value::String(s) => match uuid::Uuid::parse_str(s) {
            Ok(u) => q.bind(u),
            Err(_) => q.bind(s),
        },
        Value::Array(_) => q,
        Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

pub(crate) fn bind_value_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => match uuid::Uuid::parse_str(s) {
            Ok(u) => q.bind(u),
            Err(_) => q.bind(s),
        },
        Value::Array(_) => q,
        Value::Object(_) => q.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_values_skips_nulls_and_keeps_order() {
        let map = json!({
            "address": null,
            "email": "a@b.com",
            "name": "Ana",
        });
        let (columns, params) = split_values(map.as_object().unwrap()).unwrap();
        assert_eq!(columns, vec!["email", "name"]);
        assert_eq!(params, vec![json!("a@b.com"), json!("Ana")]);
    }

    #[test]
    fn split_values_rejects_bad_column() {
        let map = json!({ "email = 'x'; --": "a@b.com" });
        assert!(split_values(map.as_object().unwrap()).is_err());
    }
}
