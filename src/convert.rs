//! Conversion of script values to JSON for `--json` output.

use serde_json::{Map, Number};

use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// A list or hash nested inside itself becomes the string `"[...]"` or
/// `"{...}"`, matching how `print` shows it.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    convert(value, &mut Vec::new())
}

fn convert(value: &Value, open: &mut Vec<usize>) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number(Number::from(*n)),
        // NaN and the infinities have no JSON form.
        Value::Float(f) => Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Function(_) | Value::Builtin(_) => serde_json::Value::String(value.inspect()),
        Value::List(_) | Value::Hash(_) => {
            let id = value.container_id().unwrap_or_default();
            if open.contains(&id) {
                return serde_json::Value::String(value.inspect_shallow().to_string());
            }
            open.push(id);
            let json = ensure_sufficient_stack(|| match value {
                Value::List(items) => {
                    serde_json::Value::Array(items.borrow().iter().map(|item| convert(item, open)).collect())
                }
                Value::Hash(map) => {
                    let object: Map<String, serde_json::Value> =
                        map.borrow().iter().map(|(k, v)| (k.clone(), convert(v, open))).collect();
                    serde_json::Value::Object(object)
                }
                _ => serde_json::Value::Null,
            });
            open.pop();
            json
        }
    }
}

pub fn to_json_string(value: &Value, compact: bool) -> String {
    let json = value_to_json(value);
    let rendered = if compact {
        serde_json::to_string(&json)
    } else {
        serde_json::to_string_pretty(&json)
    };
    // Serializing a `serde_json::Value` cannot fail.
    rendered.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalars() {
        assert_eq!(value_to_json(&Value::Integer(-3)), serde_json::json!(-3));
        assert_eq!(value_to_json(&Value::Float(2.5)), serde_json::json!(2.5));
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), serde_json::Value::Null);
        assert_eq!(value_to_json(&Value::string("hi")), serde_json::json!("hi"));
        assert_eq!(value_to_json(&Value::Null), serde_json::Value::Null);
    }

    #[test]
    fn test_self_containing_list() {
        let list = Value::list(vec![Value::Integer(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(value_to_json(&list), serde_json::json!([1, "[...]"]));
        assert_eq!(to_json_string(&list, true), r#"[1,"[...]"]"#);
        if let Value::List(items) = &list {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn test_hash_keeps_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("zeta".to_string(), Value::Integer(1));
        map.insert("alpha".to_string(), Value::list(vec![Value::Boolean(true)]));
        let value = Value::hash(map);
        assert_eq!(to_json_string(&value, true), r#"{"zeta":1,"alpha":[true]}"#);
        assert_eq!(
            to_json_string(&value, false),
            "{\n  \"zeta\": 1,\n  \"alpha\": [\n    true\n  ]\n}"
        );
    }
}
