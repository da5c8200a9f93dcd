//! Declarative attribute predicates evaluated lazily by collection views.
//!
//! Keyword form follows the `attribute_op=value` convention, e.g. `age_gt=3`
//! or `color_in=["red", "blue"]`. A keyword without a recognised suffix is an
//! equality test on the whole keyword.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GraphError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CmpOp {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "eq" => CmpOp::Eq,
            "ne" => CmpOp::Ne,
            "lt" => CmpOp::Lt,
            "le" => CmpOp::Le,
            "gt" => CmpOp::Gt,
            "ge" => CmpOp::Ge,
            "in" => CmpOp::In,
            "notin" => CmpOp::NotIn,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub attribute: String,
    pub op: CmpOp,
    pub literal: Value,
}

impl Predicate {
    pub fn new(attribute: &str, op: CmpOp, literal: Value) -> Result<Self, GraphError> {
        if attribute.trim().is_empty() {
            return Err(GraphError::invalid_operation("predicate attribute must be set"));
        }
        if matches!(op, CmpOp::In | CmpOp::NotIn) && !literal.is_array() {
            return Err(GraphError::invalid_operation(format!(
                "'{attribute}' membership test needs an array literal"
            )));
        }
        Ok(Self {
            attribute: attribute.to_string(),
            op,
            literal,
        })
    }

    pub fn equals(attribute: &str, literal: Value) -> Result<Self, GraphError> {
        Self::new(attribute, CmpOp::Eq, literal)
    }

    pub fn from_keyword(keyword: &str, literal: Value) -> Result<Self, GraphError> {
        if let Some((attribute, suffix)) = keyword.rsplit_once('_') {
            if let Some(op) = CmpOp::from_suffix(suffix) {
                return Self::new(attribute, op, literal);
            }
        }
        Self::new(keyword, CmpOp::Eq, literal)
    }

    /// Missing attributes never match, except under `Ne` and `NotIn`.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return matches!(self.op, CmpOp::Ne | CmpOp::NotIn);
        };
        match self.op {
            CmpOp::Eq => loosely_equal(value, &self.literal),
            CmpOp::Ne => !loosely_equal(value, &self.literal),
            CmpOp::Lt => compare(value, &self.literal) == Some(Ordering::Less),
            CmpOp::Le => matches!(
                compare(value, &self.literal),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CmpOp::Gt => compare(value, &self.literal) == Some(Ordering::Greater),
            CmpOp::Ge => matches!(
                compare(value, &self.literal),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CmpOp::In => self.members().any(|m| loosely_equal(value, m)),
            CmpOp::NotIn => !self.members().any(|m| loosely_equal(value, m)),
        }
    }

    fn members(&self) -> impl Iterator<Item = &Value> {
        self.literal.as_array().into_iter().flatten()
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_keyword_parsing_picks_operator_suffix() {
        let p = Predicate::from_keyword("age_gt", json!(3)).expect("predicate");
        assert_eq!(p.attribute, "age");
        assert_eq!(p.op, CmpOp::Gt);

        let p = Predicate::from_keyword("first_name", json!("ada")).expect("predicate");
        assert_eq!(p.attribute, "first_name");
        assert_eq!(p.op, CmpOp::Eq);
    }

    #[test]
    fn test_membership_requires_array() {
        let err = Predicate::from_keyword("color_in", json!("red")).expect_err("array");
        assert!(matches!(err, GraphError::InvalidOperation(_)));
    }

    #[test]
    fn test_numeric_comparisons_mix_int_and_float() {
        let p = Predicate::new("w", CmpOp::Le, json!(2.5)).expect("predicate");
        assert!(p.matches(Some(&json!(2))));
        assert!(!p.matches(Some(&json!(3))));
        assert!(Predicate::equals("w", json!(1)).unwrap().matches(Some(&json!(1.0))));
    }

    #[test]
    fn test_missing_values_only_match_negations() {
        let gt = Predicate::new("w", CmpOp::Gt, json!(0)).unwrap();
        let ne = Predicate::new("w", CmpOp::Ne, json!(0)).unwrap();
        assert!(!gt.matches(None));
        assert!(ne.matches(None));
        assert!(ne.matches(Some(&Value::Null)));
    }

    #[test]
    fn test_incomparable_types_never_order() {
        let p = Predicate::new("w", CmpOp::Lt, json!("b")).unwrap();
        assert!(p.matches(Some(&json!("a"))));
        assert!(!p.matches(Some(&json!(1))));
    }
}
