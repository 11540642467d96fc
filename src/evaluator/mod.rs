//! Condition evaluation shared by the `if` and `loop` nodes.
//!
//! Comparison is numeric-first: when both sides coerce to a number the
//! operator applies numerically; otherwise both sides fall back to string
//! comparison with the same operator set.

use std::str::FromStr;

use serde_json::Value;

use crate::error::NodeError;

/// The six comparison operators the condition nodes accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FromStr for CompareOp {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            other => Err(NodeError::ConfigError(format!(
                "unknown comparison operator: '{}'",
                other
            ))),
        }
    }
}

/// Coerce a JSON value to a number for comparison purposes.
///
/// Numbers pass through, numeric strings parse, booleans map to 0/1.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Render a value the way it appears in prompts and combined text: strings
/// unquoted, everything else as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Compare two values with the given operator, numeric comparison first,
/// string comparison as the fallback.
pub fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (coerce_number(left), coerce_number(right)) {
        return match op {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        };
    }

    let a = value_text(left);
    let b = value_text(right);
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_parse() {
        assert_eq!("==".parse::<CompareOp>().unwrap(), CompareOp::Eq);
        assert_eq!("<=".parse::<CompareOp>().unwrap(), CompareOp::Le);
        assert!("~=".parse::<CompareOp>().is_err());
    }

    #[test]
    fn test_numeric_comparison() {
        assert!(compare(CompareOp::Lt, &json!(2), &json!(3)));
        assert!(!compare(CompareOp::Lt, &json!(3), &json!(3)));
        assert!(compare(CompareOp::Ge, &json!(3.5), &json!(3)));
    }

    #[test]
    fn test_numeric_strings_compare_numerically() {
        // "10" < "9" lexicographically, but both parse as numbers.
        assert!(compare(CompareOp::Gt, &json!("10"), &json!("9")));
        assert!(compare(CompareOp::Eq, &json!("42"), &json!(42)));
    }

    #[test]
    fn test_string_fallback() {
        assert!(compare(CompareOp::Eq, &json!("apple"), &json!("apple")));
        assert!(compare(CompareOp::Lt, &json!("apple"), &json!("banana")));
        assert!(!compare(CompareOp::Eq, &json!("apple"), &json!("pear")));
    }

    #[test]
    fn test_bool_coercion() {
        assert!(compare(CompareOp::Eq, &json!(true), &json!(1)));
        assert!(compare(CompareOp::Ne, &json!(false), &json!(1)));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("hi")), "hi");
        assert_eq!(value_text(&json!(3)), "3");
        assert_eq!(value_text(&json!(null)), "");
        assert_eq!(value_text(&json!({"a": 1})), "{\"a\":1}");
    }
}
