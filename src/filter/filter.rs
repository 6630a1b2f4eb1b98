use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

/// Validate a SQL identifier (table or column name): alphanumerics and
/// underscores only, not starting with a digit.
pub(crate) fn validate_identifier(name: &str) -> Result<(), FilterError> {
    if name.is_empty() {
        return Err(FilterError::InvalidColumn("empty identifier".to_string()));
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !(first.is_alphabetic() || first == '_')
        || !name.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return Err(FilterError::InvalidColumn(name.to_string()));
    }
    Ok(())
}

/// A filtered SELECT over a single named table. Conditions combine
/// conjunctively; generation produces parameterized SQL.
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        validate_identifier(&table_name)
            .map_err(|_| FilterError::InvalidTableName(table_name.clone()))?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column == "*" {
                continue;
            }
            validate_identifier(column)?;
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit(
                "Limit must be non-negative".to_string(),
            ));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset(
                    "Offset must be non-negative".to_string(),
                ));
            }
        }

        // Cap page size per config
        let max_limit = crate::config::CONFIG.api.max_page_size.unwrap_or(i32::MAX);
        self.limit = Some(limit.min(max_limit));
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let (where_clause, params) = self.where_parts(0)?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", where_clause)
            },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    /// WHERE fragment alone, with parameter numbering starting after
    /// `starting_param_index` (used by UPDATE statements whose SET clause
    /// claims the leading placeholders).
    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let (query, params) = self.where_parts(starting_param_index)?;
        Ok(SqlResult { query, params })
    }

    fn where_parts(
        &self,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        match &self.where_data {
            Some(where_data) => FilterWhere::generate(where_data, starting_param_index),
            None => Ok((String::new(), vec![])),
        }
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.contains(&"*".to_string()) {
            "*".to_string()
        } else {
            self.select_columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_select_star() {
        let filter = Filter::new("users").unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"users\"");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn full_query_shape() {
        let mut filter = Filter::new("flashtattoos").unwrap();
        filter
            .assign(FilterData {
                select: Some(vec!["id".into(), "title".into()]),
                where_clause: Some(json!({ "available": true })),
                order: Some(json!("created_at desc")),
                limit: Some(20),
                offset: Some(40),
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"id\", \"title\" FROM \"flashtattoos\" WHERE \"available\" = $1 ORDER BY \"created_at\" DESC LIMIT 20 OFFSET 40"
        );
        assert_eq!(sql.params, vec![json!(true)]);
    }

    #[test]
    fn where_fragment_offsets_params() {
        let mut filter = Filter::new("bookings").unwrap();
        filter.where_clause(json!({ "id": "abc" })).unwrap();
        let sql = filter.to_where_sql(2).unwrap();
        assert_eq!(sql.query, "\"id\" = $3");
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        assert!(matches!(
            Filter::new("users; DROP TABLE users"),
            Err(FilterError::InvalidTableName(_))
        ));
        assert!(Filter::new("1users").is_err());
        assert!(Filter::new("").is_err());
    }

    #[test]
    fn negative_limit_is_rejected() {
        let mut filter = Filter::new("users").unwrap();
        assert!(filter.limit(-1, None).is_err());
        assert!(filter.limit(10, Some(-5)).is_err());
    }
}
