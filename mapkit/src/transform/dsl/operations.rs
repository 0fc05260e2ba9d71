//! Column operations.
//!
//! Each operation maps one cell value to a new one. Operations run as a
//! compiled [`Pipeline`]: `replace` patterns are compiled once, and an
//! invalid pattern fails compilation. Running never fails: a value an
//! operation cannot handle is passed through unchanged, except for
//! `to_number` which yields `null` when no digits are present.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{DslError, DslResult};
use crate::models::render_value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Trim,

    Uppercase,

    Lowercase,

    /// Replace every regex match.
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    PadStart {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: char,
    },

    PadEnd {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: char,
    },

    EnsurePrefix { value: String },

    EnsureSuffix { value: String },

    /// Lookup table. Unmapped values become `default`, or stay as they are.
    Map {
        mapping: BTreeMap<String, String>,
        #[serde(default)]
        case_insensitive: bool,
        #[serde(default)]
        default: Option<String>,
    },

    ToBoolean {
        #[serde(default = "default_true_values")]
        true_values: Vec<String>,
    },

    /// Keep the digits (and a leading minus) as an integer.
    ToNumber,

    /// Characters `start..start + length`.
    Substring {
        start: usize,
        #[serde(default)]
        length: Option<usize>,
    },

    Alphanumeric,

    DigitsOnly,
}

fn default_pad_char() -> char {
    '0'
}

fn default_true_values() -> Vec<String> {
    ["true", "1", "yes", "y"].iter().map(|s| s.to_string()).collect()
}

/// Text of a scalar value. Arrays, objects and `null` have none.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(render_value(value)),
        _ => None,
    }
}

fn pad(s: &str, length: usize, fill: char, at_start: bool) -> String {
    let count = s.chars().count();
    if count >= length {
        return s.to_string();
    }
    let padding: String = std::iter::repeat(fill).take(length - count).collect();
    if at_start {
        padding + s
    } else {
        format!("{}{}", s, padding)
    }
}

impl Operation {
    /// Compile the regex this operation needs, if any.
    fn compile(&self) -> DslResult<Option<Regex>> {
        match self {
            Operation::Replace { pattern, .. } => Regex::new(pattern)
                .map(Some)
                .map_err(|source| DslError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }),
            _ => Ok(None),
        }
    }

    fn apply(&self, value: &Value, regex: Option<&Regex>) -> Value {
        match self {
            Operation::ToBoolean { true_values } => {
                if let Value::Bool(b) = value {
                    return Value::Bool(*b);
                }
                let matched = text(value)
                    .map(|s| {
                        let s = s.trim().to_lowercase();
                        true_values.iter().any(|t| t.to_lowercase() == s)
                    })
                    .unwrap_or(false);
                Value::Bool(matched)
            }
            Operation::ToNumber => match value {
                Value::Number(_) => value.clone(),
                _ => text(value).and_then(|s| to_number(&s)).unwrap_or(Value::Null),
            },
            _ => match text(value) {
                Some(s) => Value::String(self.apply_text(s, regex)),
                None => value.clone(),
            },
        }
    }

    fn apply_text(&self, s: String, regex: Option<&Regex>) -> String {
        match self {
            Operation::Trim => s.trim().to_string(),
            Operation::Uppercase => s.to_uppercase(),
            Operation::Lowercase => s.to_lowercase(),
            Operation::Replace { value, .. } => match regex {
                Some(re) => re.replace_all(&s, value.as_str()).into_owned(),
                None => s,
            },
            Operation::PadStart { length, char } => pad(&s, *length, *char, true),
            Operation::PadEnd { length, char } => pad(&s, *length, *char, false),
            Operation::EnsurePrefix { value } => {
                if s.starts_with(value.as_str()) {
                    s
                } else {
                    format!("{}{}", value, s)
                }
            }
            Operation::EnsureSuffix { value } => {
                if s.ends_with(value.as_str()) {
                    s
                } else {
                    s + value
                }
            }
            Operation::Map {
                mapping,
                case_insensitive,
                default,
            } => {
                let found = if *case_insensitive {
                    let key = s.to_lowercase();
                    mapping
                        .iter()
                        .find(|(k, _)| k.to_lowercase() == key)
                        .map(|(_, v)| v)
                } else {
                    mapping.get(&s)
                };
                match (found, default) {
                    (Some(v), _) => v.clone(),
                    (None, Some(d)) => d.clone(),
                    (None, None) => s,
                }
            }
            Operation::Substring { start, length } => {
                let chars = s.chars().skip(*start);
                match length {
                    Some(n) => chars.take(*n).collect(),
                    None => chars.collect(),
                }
            }
            Operation::Alphanumeric => s.chars().filter(|c| c.is_alphanumeric()).collect(),
            Operation::DigitsOnly => s.chars().filter(|c| c.is_ascii_digit()).collect(),
            Operation::ToBoolean { .. } | Operation::ToNumber => s,
        }
    }
}

fn to_number(s: &str) -> Option<Value> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let signed = if s.trim_start().starts_with('-') {
        format!("-{}", digits)
    } else {
        digits
    };
    signed.parse::<i64>().ok().map(|n| Value::Number(n.into()))
}

/// Operations of one column, ready to run in order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<(Operation, Option<Regex>)>,
}

impl Pipeline {
    pub fn compile(operations: &[Operation]) -> DslResult<Self> {
        let steps = operations
            .iter()
            .map(|op| Ok((op.clone(), op.compile()?)))
            .collect::<DslResult<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn apply(&self, value: &Value) -> Value {
        self.steps
            .iter()
            .fold(value.clone(), |acc, (op, regex)| op.apply(&acc, regex.as_ref()))
    }
}

/// Human-readable table of the available operations.
pub fn operations_description() -> String {
    r#"Available column operations:

| Operation | Description | Parameters |
|-----------|-------------|------------|
| trim | Remove leading/trailing whitespace | - |
| uppercase | Convert to uppercase | - |
| lowercase | Convert to lowercase | - |
| replace | Regex replacement of every match | pattern, value |
| pad_start | Pad at start to a length | length, char (default "0") |
| pad_end | Pad at end to a length | length, char (default "0") |
| ensure_prefix | Add prefix if missing | value |
| ensure_suffix | Add suffix if missing | value |
| map | Lookup table | mapping, case_insensitive, default |
| to_boolean | Convert to boolean | true_values |
| to_number | Keep digits as an integer | - |
| substring | Characters from start | start, length (optional) |
| alphanumeric | Keep alphanumeric characters | - |
| digits_only | Keep digits | - |

Example:
[
  {"type": "trim"},
  {"type": "replace", "pattern": "[-. ]", "value": ""},
  {"type": "ensure_prefix", "value": "IN-"}
]"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(op: Operation, value: Value) -> Value {
        Pipeline::compile(&[op]).unwrap().apply(&value)
    }

    #[test]
    fn test_text_operations() {
        assert_eq!(run(Operation::Trim, json!("  Pune ")), json!("Pune"));
        assert_eq!(run(Operation::Uppercase, json!("mh")), json!("MH"));
        assert_eq!(
            run(Operation::PadStart { length: 6, char: '0' }, json!(4110)),
            json!("004110")
        );
        assert_eq!(
            run(Operation::Substring { start: 3, length: Some(3) }, json!("IN-411001")),
            json!("411")
        );
    }

    #[test]
    fn test_ensure_prefix() {
        let op = Operation::EnsurePrefix { value: "IN-".into() };
        assert_eq!(run(op.clone(), json!("411001")), json!("IN-411001"));
        assert_eq!(run(op, json!("IN-411001")), json!("IN-411001"));
    }

    #[test]
    fn test_map() {
        let mapping: BTreeMap<String, String> =
            [("MH".to_string(), "Maharashtra".to_string())].into_iter().collect();

        let op = Operation::Map {
            mapping: mapping.clone(),
            case_insensitive: true,
            default: None,
        };
        assert_eq!(run(op.clone(), json!("mh")), json!("Maharashtra"));
        assert_eq!(run(op, json!("KA")), json!("KA"));

        let op = Operation::Map {
            mapping,
            case_insensitive: false,
            default: Some("Other".into()),
        };
        assert_eq!(run(op, json!("mh")), json!("Other"));
    }

    #[test]
    fn test_to_number_and_boolean() {
        assert_eq!(run(Operation::ToNumber, json!("411-001")), json!(411001));
        assert_eq!(run(Operation::ToNumber, json!("-42")), json!(-42));
        assert_eq!(run(Operation::ToNumber, json!("n/a")), Value::Null);

        let op = Operation::ToBoolean { true_values: default_true_values() };
        assert_eq!(run(op.clone(), json!("Yes")), json!(true));
        assert_eq!(run(op, json!("no")), json!(false));
    }

    #[test]
    fn test_deserialize_and_chain() {
        let ops: Vec<Operation> = serde_json::from_str(
            r#"[{"type": "digits_only"}, {"type": "pad_start", "length": 6}]"#,
        )
        .unwrap();
        let pipeline = Pipeline::compile(&ops).unwrap();
        assert_eq!(pipeline.apply(&json!("41-10")), json!("004110"));
    }

    #[test]
    fn test_replace_compiled_once_and_reused() {
        let op = Operation::Replace { pattern: "[-. ]".into(), value: String::new() };
        let pipeline = Pipeline::compile(&[op]).unwrap();
        assert_eq!(pipeline.apply(&json!("411-001")), json!("411001"));
        assert_eq!(pipeline.apply(&json!("560 001")), json!("560001"));
    }

    #[test]
    fn test_invalid_pattern_fails_compilation() {
        let op = Operation::Replace { pattern: "(".into(), value: String::new() };
        let err = Pipeline::compile(&[Operation::Trim, op]).unwrap_err();
        assert!(matches!(err, DslError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }
}
