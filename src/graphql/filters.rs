//! Filter compiler for the generic `filters` / `subfilters` JSON arguments
//!
//! A filter is a nested object `{field: {operator: value}}`:
//!
//! ```json
//! { "name": { "contains": "coffee" }, "value": { "ge": 5, "lt": 20 } }
//! ```
//!
//! Supported operators:
//! - gt, lt, ge, le, eq, ne (comparisons)
//! - in (list membership)
//! - contains (case-insensitive substring match, text fields only, via `REGEXP`)
//!
//! Field names arrive in camelCase and are resolved against the entity's
//! allow-listed field table after conversion to snake_case. Every operand is
//! bound as a query parameter; nothing from the request is spliced into SQL.

use chrono::{DateTime, Utc};
use convert_case::{Case, Casing};
use serde_json::Value;

use crate::error::ValidationError;
use crate::graphql::orm::{DatabaseEntity, FieldDef, FieldKind, Predicate, SqlValue};

/// The closed set of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    In,
    Contains,
}

impl FilterOperator {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "ge" => Some(Self::Ge),
            "le" => Some(Self::Le),
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "in" => Some(Self::In),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::In => "in",
            Self::Contains => "contains",
        }
    }

    /// SQL operator for the direct comparisons.
    fn comparison_sql(&self) -> Option<&'static str> {
        match self {
            Self::Gt => Some(">"),
            Self::Lt => Some("<"),
            Self::Ge => Some(">="),
            Self::Le => Some("<="),
            Self::Eq => Some("="),
            Self::Ne => Some("!="),
            Self::In | Self::Contains => None,
        }
    }
}

/// Convert an external camelCase field name to the internal snake_case one.
pub fn field_key(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Compile a filter object into predicates over `E`'s columns.
///
/// `None` and JSON `null` compile to no predicates (match all).
pub fn compile_filters<E: DatabaseEntity>(
    filters: Option<&Value>,
) -> Result<Vec<Predicate>, ValidationError> {
    let object = match filters {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(object)) => object,
        Some(other) => {
            return Err(ValidationError::MalformedFilter(format!(
                "expected an object of fields, got {}",
                json_type(other)
            )));
        }
    };

    let mut predicates = Vec::new();
    for (raw_field, operators) in object {
        let field = E::field(&field_key(raw_field)).ok_or_else(|| {
            ValidationError::UnknownField {
                entity: E::ENTITY_NAME,
                field: raw_field.clone(),
            }
        })?;

        let operators = operators.as_object().ok_or_else(|| {
            ValidationError::MalformedFilter(format!(
                "operators for `{}` must be an object, got {}",
                raw_field,
                json_type(operators)
            ))
        })?;

        for (raw_operator, operand) in operators {
            let operator = FilterOperator::parse(raw_operator).ok_or_else(|| {
                ValidationError::UnsupportedOperator {
                    field: raw_field.clone(),
                    operator: raw_operator.clone(),
                }
            })?;
            let condition = Condition {
                field,
                name: raw_field,
                operator,
            };
            predicates.push(condition.compile(operand)?);
        }
    }

    Ok(predicates)
}

/// One `(field, operator)` pair being compiled.
struct Condition<'a> {
    field: &'static FieldDef,
    /// Field name as the client spelled it, for error messages
    name: &'a str,
    operator: FilterOperator,
}

impl Condition<'_> {
    fn compile(&self, operand: &Value) -> Result<Predicate, ValidationError> {
        let column = self.field.column;
        match self.operator {
            FilterOperator::Contains => self.compile_contains(operand),
            FilterOperator::In => {
                let Value::Array(items) = operand else {
                    return Err(self.invalid(format!("expected a list, got {}", json_type(operand))));
                };
                let values = items
                    .iter()
                    .map(|item| self.coerce(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Predicate::in_list(column, values))
            }
            FilterOperator::Eq | FilterOperator::Ne if operand.is_null() => {
                if !self.field.nullable {
                    return Err(self.invalid("field is not nullable"));
                }
                let test = if self.operator == FilterOperator::Eq {
                    "IS NULL"
                } else {
                    "IS NOT NULL"
                };
                Ok(Predicate::new(format!("{} {}", column, test), Vec::new()))
            }
            operator => {
                let sql_operator = operator
                    .comparison_sql()
                    .ok_or_else(|| self.unsupported())?;
                let value = self.coerce(operand)?;
                Ok(Predicate::new(
                    format!("{} {} ?", column, sql_operator),
                    vec![value],
                ))
            }
        }
    }

    fn compile_contains(&self, operand: &Value) -> Result<Predicate, ValidationError> {
        if self.field.kind != FieldKind::Text {
            return Err(self.unsupported());
        }
        match operand {
            Value::String(needle) => Ok(Predicate::new(
                format!("{} REGEXP ?", self.field.column),
                vec![SqlValue::String(contains_pattern(needle))],
            )),
            Value::Array(_) => Err(self.invalid(
                "list containment needs an array-valued field; use a string to match a substring",
            )),
            other => Err(self.invalid(format!("expected a string, got {}", json_type(other)))),
        }
    }

    /// Convert a JSON operand to the bound value for this field's kind.
    fn coerce(&self, value: &Value) -> Result<SqlValue, ValidationError> {
        if value.is_null() {
            return Err(self.invalid("null is only allowed with eq/ne on nullable fields"));
        }
        match self.field.kind {
            FieldKind::Integer => value
                .as_i64()
                .map(SqlValue::Int)
                .ok_or_else(|| self.invalid(format!("expected an integer, got {}", value))),
            FieldKind::Real => value
                .as_f64()
                .map(SqlValue::Float)
                .ok_or_else(|| self.invalid(format!("expected a number, got {}", value))),
            FieldKind::Text => value
                .as_str()
                .map(|s| SqlValue::String(s.to_string()))
                .ok_or_else(|| self.invalid(format!("expected a string, got {}", value))),
            FieldKind::Timestamp => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|ts| SqlValue::Timestamp(ts.with_timezone(&Utc)))
                .ok_or_else(|| {
                    self.invalid(format!("expected an RFC 3339 timestamp, got {}", value))
                }),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::InvalidValue {
            field: self.name.to_string(),
            operator: self.operator.as_str().to_string(),
            reason: reason.into(),
        }
    }

    fn unsupported(&self) -> ValidationError {
        ValidationError::UnsupportedOperator {
            field: self.name.to_string(),
            operator: self.operator.as_str().to_string(),
        }
    }
}

/// Case-insensitive literal substring pattern. Folding is Unicode-aware,
/// unlike SQLite's own `LOWER` and `LIKE`.
fn contains_pattern(needle: &str) -> String {
    format!("(?i){}", regex::escape(needle))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::graphql::entities::{Category, Transaction};

    fn compile(filters: Value) -> Result<Vec<Predicate>, ValidationError> {
        compile_filters::<Transaction>(Some(&filters))
    }

    #[test]
    fn absent_and_null_filters_match_everything() {
        assert!(compile_filters::<Transaction>(None).unwrap().is_empty());
        assert!(compile(Value::Null).unwrap().is_empty());
        assert!(compile(json!({})).unwrap().is_empty());
    }

    #[test]
    fn camel_case_fields_resolve_to_columns() {
        assert_eq!(field_key("categoryId"), "category_id");
        assert_eq!(field_key("createdAt"), "created_at");
        assert_eq!(field_key("category_id"), "category_id");
        assert_eq!(field_key("name"), "name");

        let predicates = compile(json!({"categoryId": {"eq": 4}})).unwrap();
        assert_eq!(
            predicates,
            vec![Predicate::new("category_id = ?", vec![SqlValue::Int(4)])]
        );
    }

    #[test]
    fn comparisons_bind_typed_values() {
        let predicates = compile(json!({"value": {"gt": 100, "le": 250.5}})).unwrap();
        assert_eq!(
            predicates,
            vec![
                Predicate::new("value > ?", vec![SqlValue::Float(100.0)]),
                Predicate::new("value <= ?", vec![SqlValue::Float(250.5)]),
            ]
        );
    }

    #[test]
    fn contains_is_case_insensitive_substring() {
        let predicates = compile(json!({"name": {"contains": "Coffee"}})).unwrap();
        assert_eq!(
            predicates,
            vec![Predicate::new(
                "name REGEXP ?",
                vec![SqlValue::String("(?i)Coffee".into())]
            )]
        );
    }

    #[test]
    fn contains_matches_the_needle_literally() {
        let predicates = compile(json!({"name": {"contains": "50%_off (1.5x)"}})).unwrap();
        assert_eq!(
            predicates[0].values,
            vec![SqlValue::String("(?i)50%_off \\(1\\.5x\\)".into())]
        );
    }

    #[test]
    fn contains_rejects_non_text_fields_and_lists() {
        assert_matches!(
            compile(json!({"value": {"contains": "1"}})),
            Err(ValidationError::UnsupportedOperator { field, operator })
                if field == "value" && operator == "contains"
        );
        assert_matches!(
            compile(json!({"name": {"contains": ["a", "b"]}})),
            Err(ValidationError::InvalidValue { .. })
        );
    }

    #[test]
    fn in_builds_membership_and_empty_matches_nothing() {
        let predicates = compile(json!({"id": {"in": [1, 2, 3]}})).unwrap();
        assert_eq!(predicates[0].sql, "id IN (?, ?, ?)");
        assert_eq!(predicates[0].values.len(), 3);

        let predicates = compile(json!({"id": {"in": []}})).unwrap();
        assert_eq!(predicates[0].sql, "1 = 0");
    }

    #[test]
    fn null_equality_on_nullable_fields() {
        let predicates = compile(json!({"description": {"eq": null}})).unwrap();
        assert_eq!(predicates[0].sql, "description IS NULL");
        let predicates = compile(json!({"description": {"ne": null}})).unwrap();
        assert_eq!(predicates[0].sql, "description IS NOT NULL");

        assert_matches!(
            compile(json!({"name": {"eq": null}})),
            Err(ValidationError::InvalidValue { .. })
        );
    }

    #[test]
    fn timestamps_parse_rfc3339() {
        let predicates = compile(json!({"createdAt": {"ge": "2024-01-01T00:00:00Z"}})).unwrap();
        assert_matches!(&predicates[0].values[0], SqlValue::Timestamp(_));

        assert_matches!(
            compile(json!({"createdAt": {"ge": "yesterday"}})),
            Err(ValidationError::InvalidValue { .. })
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert_eq!(
            compile(json!({"password": {"eq": "x"}})),
            Err(ValidationError::UnknownField {
                entity: "transaction",
                field: "password".into()
            })
        );
        // The category entity has no value column
        assert_matches!(
            compile_filters::<Category>(Some(&json!({"value": {"gt": 1}}))),
            Err(ValidationError::UnknownField { entity: "category", .. })
        );
    }

    #[test]
    fn unknown_operators_are_rejected() {
        assert_eq!(
            compile(json!({"name": {"like": "x"}})),
            Err(ValidationError::UnsupportedOperator {
                field: "name".into(),
                operator: "like".into()
            })
        );
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        assert_matches!(compile(json!([1, 2])), Err(ValidationError::MalformedFilter(_)));
        assert_matches!(
            compile(json!({"name": "coffee"})),
            Err(ValidationError::MalformedFilter(_))
        );
        assert_matches!(
            compile(json!({"id": {"eq": "one"}})),
            Err(ValidationError::InvalidValue { .. })
        );
    }
}
