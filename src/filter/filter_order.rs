use serde_json::Value;

use super::error::FilterError;
use super::filter::validate_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Array of strings like ["created_at desc", "name asc"]
                let mut out = Vec::new();
                for v in arr {
                    if let Value::String(s) = v {
                        out.extend(Self::parse_order_string(s));
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "created_at": "desc", "name": "asc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    let sort = match v.as_str().unwrap_or("asc").to_ascii_lowercase().as_str() {
                        "desc" => SortDirection::Desc,
                        _ => SortDirection::Asc,
                    };
                    out.push(FilterOrderInfo {
                        column: k.clone(),
                        sort,
                    });
                }
                out
            }
            _ => vec![],
        };

        for info in &infos {
            validate_identifier(&info.column)
                .map_err(|_| FilterError::InvalidColumn(info.column.clone()))?;
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                out.push(FilterOrderInfo {
                    column: col.to_string(),
                    sort,
                });
            }
        }
        out
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_order_string_with_direction() {
        let infos = FilterOrder::validate_and_parse(&json!("created_at desc, name")).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].column, "created_at");
        assert_eq!(infos[0].sort, SortDirection::Desc);
        assert_eq!(infos[1].sort, SortDirection::Asc);
        assert_eq!(
            FilterOrder::generate(&infos),
            "ORDER BY \"created_at\" DESC, \"name\" ASC"
        );
    }

    #[test]
    fn rejects_invalid_order_column() {
        let result = FilterOrder::validate_and_parse(&json!("created_at;--"));
        assert!(result.is_err());
    }
}
