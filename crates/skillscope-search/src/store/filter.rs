//! Translation from wire-level filter clauses to store predicates
//!
//! Filters arrive as flat `(field, operator, value)` triples and are
//! compiled once per request into a single conjunctive [`Filter`]: `eq`,
//! `in` and ranges land in `must`, `neq` and `nin` in `must_not`. A field
//! name the payload never carries compiles fine and matches nothing; that
//! is the store's concern, not a validation failure.

use qdrant_client::qdrant::{Condition, Filter, Range};
use serde_json::Value;

use skillscope_core::{Error, FilterOperator, FilterSpec, Result};

/// Stateless compiler from filter clauses to a store-native predicate.
pub struct FilterTranslator;

impl FilterTranslator {
    /// Compile clauses into one conjunctive filter.
    ///
    /// Returns a validation error for operator/value combinations the
    /// store cannot express: float equality, non-array `in`/`nin`
    /// operands, non-numeric range bounds.
    pub fn compile(specs: &[FilterSpec]) -> Result<Filter> {
        let mut must = Vec::new();
        let mut must_not = Vec::new();

        for spec in specs {
            match spec.operator {
                FilterOperator::Eq => must.push(Self::match_condition(spec)?),
                FilterOperator::Neq => must_not.push(Self::match_condition(spec)?),
                FilterOperator::In => must.push(Self::set_condition(spec)?),
                FilterOperator::Nin => must_not.push(Self::set_condition(spec)?),
                FilterOperator::Gt
                | FilterOperator::Gte
                | FilterOperator::Lt
                | FilterOperator::Lte => must.push(Self::range_condition(spec)?),
            }
        }

        Ok(Filter {
            must,
            must_not,
            ..Default::default()
        })
    }

    /// Equality over a single scalar. A null operand means
    /// "absent or explicitly null", which the store expresses as emptiness.
    fn match_condition(spec: &FilterSpec) -> Result<Condition> {
        let field = spec.field.clone();
        match &spec.value {
            Value::Null => Ok(Condition::is_empty(field)),
            Value::Bool(b) => Ok(Condition::matches(field, *b)),
            Value::String(s) => Ok(Condition::matches(field, s.clone())),
            Value::Number(n) => {
                let int = n.as_i64().ok_or_else(|| {
                    Error::Validation(format!(
                        "field '{}': equality on floating point values is not supported",
                        spec.field
                    ))
                })?;
                Ok(Condition::matches(field, int))
            }
            other => Err(Error::Validation(format!(
                "field '{}': cannot match against {other}",
                spec.field
            ))),
        }
    }

    /// Membership over a homogeneous array of keywords or integers.
    fn set_condition(spec: &FilterSpec) -> Result<Condition> {
        let Value::Array(items) = &spec.value else {
            return Err(Error::Validation(format!(
                "field '{}': '{}' requires an array operand",
                spec.field, spec.operator
            )));
        };

        if items.iter().all(|v| v.is_string()) {
            let keywords: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            return Ok(Condition::matches(spec.field.clone(), keywords));
        }

        if items.iter().all(|v| v.as_i64().is_some()) {
            let integers: Vec<i64> = items.iter().filter_map(Value::as_i64).collect();
            return Ok(Condition::matches(spec.field.clone(), integers));
        }

        Err(Error::Validation(format!(
            "field '{}': '{}' requires a homogeneous array of strings or integers",
            spec.field, spec.operator
        )))
    }

    /// Ordered comparison, numeric operands only.
    fn range_condition(spec: &FilterSpec) -> Result<Condition> {
        let bound = spec.value.as_f64().ok_or_else(|| {
            Error::Validation(format!(
                "field '{}': '{}' requires a numeric operand",
                spec.field, spec.operator
            ))
        })?;

        let range = match spec.operator {
            FilterOperator::Gt => Range {
                gt: Some(bound),
                ..Default::default()
            },
            FilterOperator::Gte => Range {
                gte: Some(bound),
                ..Default::default()
            },
            FilterOperator::Lt => Range {
                lt: Some(bound),
                ..Default::default()
            },
            FilterOperator::Lte => Range {
                lte: Some(bound),
                ..Default::default()
            },
            _ => unreachable!("range_condition called for non-range operator"),
        };

        Ok(Condition::range(spec.field.clone(), range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_goes_to_must() {
        let filter =
            FilterTranslator::compile(&[FilterSpec::new("lang", FilterOperator::Eq, json!("en"))])
                .unwrap();
        assert_eq!(filter.must.len(), 1);
        assert!(filter.must_not.is_empty());
    }

    #[test]
    fn test_neq_and_nin_go_to_must_not() {
        let filter = FilterTranslator::compile(&[
            FilterSpec::new("provider", FilterOperator::Neq, json!("rome")),
            FilterSpec::new("type", FilterOperator::Nin, json!(["certification"])),
        ])
        .unwrap();
        assert!(filter.must.is_empty());
        assert_eq!(filter.must_not.len(), 2);
    }

    #[test]
    fn test_clauses_are_conjunctive() {
        let filter = FilterTranslator::compile(&[
            FilterSpec::new("lang", FilterOperator::Eq, json!("en")),
            FilterSpec::new("type", FilterOperator::Eq, json!("skill")),
            FilterSpec::new("metadata.level", FilterOperator::Gte, json!(3)),
        ])
        .unwrap();
        assert_eq!(filter.must.len(), 3);
    }

    #[test]
    fn test_eq_null_compiles_to_is_empty() {
        let filter = FilterTranslator::compile(&[FilterSpec::new(
            "category",
            FilterOperator::Eq,
            json!(null),
        )])
        .unwrap();
        assert_eq!(filter.must.len(), 1);
    }

    #[test]
    fn test_float_equality_rejected() {
        let err =
            FilterTranslator::compile(&[FilterSpec::new("score", FilterOperator::Eq, json!(0.5))])
                .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_range_on_string_rejected() {
        let err = FilterTranslator::compile(&[FilterSpec::new(
            "title",
            FilterOperator::Gt,
            json!("abc"),
        )])
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_in_requires_array() {
        let err =
            FilterTranslator::compile(&[FilterSpec::new("lang", FilterOperator::In, json!("en"))])
                .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_in_with_mixed_types_rejected() {
        let err = FilterTranslator::compile(&[FilterSpec::new(
            "lang",
            FilterOperator::In,
            json!(["en", 3]),
        )])
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_integer_membership() {
        let filter = FilterTranslator::compile(&[FilterSpec::new(
            "metadata.level",
            FilterOperator::In,
            json!([1, 2, 3]),
        )])
        .unwrap();
        assert_eq!(filter.must.len(), 1);
    }

    #[test]
    fn test_empty_specs_compile_to_empty_filter() {
        let filter = FilterTranslator::compile(&[]).unwrap();
        assert!(filter.must.is_empty());
        assert!(filter.must_not.is_empty());
    }
}
