//! Generic filter specification
//!
//! Filters compose with conjunction only; there is no disjunction or negation
//! grouping. This is a stated design limitation of the engine, not an
//! omission. Field names are dotted paths resolved against the stored
//! payload, so `"lang"` and `"metadata.scope.access"` are both valid.

use serde::{Deserialize, Serialize};

/// Comparison operator of a single filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Exact equality. `eq null` matches absent-or-null fields.
    Eq,
    /// Exact inequality (complement of `eq`)
    Neq,
    /// Set membership; value must be an array
    In,
    /// Set exclusion; value must be an array
    Nin,
    /// Numeric greater-than
    Gt,
    /// Numeric greater-than-or-equal
    Gte,
    /// Numeric less-than
    Lt,
    /// Numeric less-than-or-equal
    Lte,
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::In => "in",
            FilterOperator::Nin => "nin",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
        };
        f.write_str(name)
    }
}

/// A single filter condition over the stored payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Dotted path into the payload (e.g. `"provider"`, `"metadata.scope"`)
    pub field: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Scalar or array comparison value
    pub value: serde_json::Value,
}

impl FilterSpec {
    /// Convenience constructor
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_wire_names() {
        let ops = [
            (FilterOperator::Eq, "\"eq\""),
            (FilterOperator::Neq, "\"neq\""),
            (FilterOperator::In, "\"in\""),
            (FilterOperator::Nin, "\"nin\""),
            (FilterOperator::Gt, "\"gt\""),
            (FilterOperator::Gte, "\"gte\""),
            (FilterOperator::Lt, "\"lt\""),
            (FilterOperator::Lte, "\"lte\""),
        ];
        for (op, wire) in ops {
            assert_eq!(serde_json::to_string(&op).unwrap(), wire);
        }
    }

    #[test]
    fn test_filter_wire_shape() {
        let json = serde_json::json!({
            "field": "metadata.level",
            "operator": "gte",
            "value": 3,
        });
        let spec: FilterSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.field, "metadata.level");
        assert_eq!(spec.operator, FilterOperator::Gte);
        assert_eq!(spec.value, serde_json::json!(3));
    }
}
