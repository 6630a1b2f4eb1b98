use serde_json::Value;

use super::error::FilterError;
use super::filter::validate_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Builds a parameterized WHERE clause from JSON-shaped conditions:
/// `{ "role": "client", "price": { "$gte": 10, "$lte": 50 } }`.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// Generate the WHERE clause SQL and its bind parameters. Parameter
    /// placeholders start at `$starting_param_index + 1`.
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause(
                "WHERE must be an object".to_string(),
            )),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions = std::mem::take(&mut self.conditions);
        for condition in &conditions {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }

        Ok((sql_conditions.join(" AND "), std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Object(obj) => {
                for (key, value) in obj {
                    self.parse_field_condition(key, value)?;
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause(
                "WHERE must be an object".to_string(),
            )),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        validate_identifier(field).map_err(|_| FilterError::InvalidColumn(field.to_string()))?;

        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                self.conditions.push(FilterWhereInfo {
                    column: field.to_string(),
                    operator,
                    data: op_val.clone(),
                });
            }
        } else {
            // Implicit equality: { field: value }
            self.conditions.push(FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            });
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);

        Ok(match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() {
                    format!("{} IS NULL", quoted_column)
                } else {
                    format!("{} = {}", quoted_column, self.param(condition.data.clone()))
                }
            }
            FilterOp::Ne => {
                if condition.data.is_null() {
                    format!("{} IS NOT NULL", quoted_column)
                } else {
                    format!("{} <> {}", quoted_column, self.param(condition.data.clone()))
                }
            }
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Like => {
                format!("{} LIKE {}", quoted_column, self.param(condition.data.clone()))
            }
            FilterOp::ILike => {
                format!("{} ILIKE {}", quoted_column, self.param(condition.data.clone()))
            }
            FilterOp::In => {
                if let Value::Array(values) = &condition.data {
                    // An empty set matches nothing
                    if values.is_empty() {
                        return Ok("1=0".to_string());
                    }
                    let params: Vec<String> =
                        values.iter().map(|v| self.param(v.clone())).collect();
                    format!("{} IN ({})", quoted_column, params.join(", "))
                } else {
                    format!("{} = {}", quoted_column, self.param(condition.data.clone()))
                }
            }
        })
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality() {
        let (sql, params) = FilterWhere::generate(&json!({ "role": "client" }), 0).unwrap();
        assert_eq!(sql, "\"role\" = $1");
        assert_eq!(params, vec![json!("client")]);
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "shop_id": null }), 0).unwrap();
        assert_eq!(sql, "\"shop_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "price": { "$gte": 10.0, "$lte": 50.0 } }), 0).unwrap();
        assert_eq!(sql, "\"price\" >= $1 AND \"price\" <= $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn ilike_pattern() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "name": { "$ilike": "%rose%" } }), 0).unwrap();
        assert_eq!(sql, "\"name\" ILIKE $1");
        assert_eq!(params, vec![json!("%rose%")]);
    }

    #[test]
    fn in_set_expands_params() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "id": { "$in": ["a", "b", "c"] } }), 0).unwrap();
        assert_eq!(sql, "\"id\" IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_set_matches_nothing() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn params_continue_from_starting_index() {
        let (sql, _) = FilterWhere::generate(&json!({ "status": "pending" }), 3).unwrap();
        assert_eq!(sql, "\"status\" = $4");
    }

    #[test]
    fn bad_column_name_is_rejected() {
        let result = FilterWhere::generate(&json!({ "id; DROP TABLE users": 1 }), 0);
        assert!(matches!(result, Err(FilterError::InvalidColumn(_))));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let result = FilterWhere::generate(&json!({ "id": { "$regex": ".*" } }), 0);
        assert!(matches!(result, Err(FilterError::UnsupportedOperator(_))));
    }
}
