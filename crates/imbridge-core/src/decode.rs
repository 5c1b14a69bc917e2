use serde_json::Value;

/// Best-effort decode of a serialized payload.
///
/// A string holding valid JSON becomes the decoded value; every other input,
/// including strings that fail to parse, is returned unchanged. This never
/// fails and is used identically for invocation results and push payloads.
pub fn try_decode(value: Value) -> Value {
    match value {
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(raw),
        },
        other => other,
    }
}

/// Post-processing hooks applied to a raw native result before decoding.
pub mod transforms {
    use serde_json::Value;

    /// Caller-supplied result transform. An `Err` becomes a `TransformFailure`.
    pub type ResultTransform = Box<dyn FnOnce(Value) -> Result<Value, String> + Send>;

    /// Unwrap the single-element array older unit builds return for
    /// message-creation and login-status calls.
    ///
    /// An empty array yields `null`. A string holding a serialized array is
    /// unwrapped the same way. Any other reply is already unwrapped and
    /// passes through unchanged; only `null` is rejected.
    pub fn first_element(value: Value) -> Result<Value, String> {
        match value {
            Value::Array(items) => Ok(first(items)),
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Array(items)) => Ok(first(items)),
                _ => Ok(Value::String(raw)),
            },
            Value::Null => Err("expected a reply, got null".to_string()),
            other => Ok(other),
        }
    }

    fn first(items: Vec<Value>) -> Value {
        items.into_iter().next().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::transforms::first_element;
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn decodes_json_object_string() {
        let raw = Value::String(r#"{"userID":"u1","nickname":"Alice"}"#.into());
        assert_eq!(try_decode(raw), json!({"userID": "u1", "nickname": "Alice"}));
    }

    #[test]
    fn decodes_scalar_json() {
        assert_eq!(try_decode(Value::String("42".into())), json!(42));
        assert_eq!(try_decode(Value::String("true".into())), json!(true));
    }

    #[test]
    fn keeps_unparsable_string() {
        let raw = Value::String("not json {".into());
        assert_eq!(try_decode(raw.clone()), raw);
    }

    #[test]
    fn passes_structured_values_through() {
        let value = json!({"already": ["decoded"]});
        assert_eq!(try_decode(value.clone()), value);
        assert_eq!(try_decode(Value::Null), Value::Null);
    }

    #[test]
    fn first_element_of_array() {
        assert_eq!(first_element(json!([{"a": 1}, {"b": 2}])).unwrap(), json!({"a": 1}));
        assert_eq!(first_element(json!([])).unwrap(), Value::Null);
    }

    #[test]
    fn first_element_of_serialized_array() {
        let raw = Value::String(r#"["{\"clientMsgID\":\"m1\"}"]"#.into());
        assert_eq!(
            first_element(raw).unwrap(),
            Value::String(r#"{"clientMsgID":"m1"}"#.into())
        );
    }

    #[test]
    fn first_element_passes_non_arrays_through() {
        assert_eq!(first_element(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(first_element(json!(3)).unwrap(), json!(3));
        assert_eq!(first_element(json!("3")).unwrap(), json!("3"));
        assert_eq!(first_element(json!("plain")).unwrap(), json!("plain"));
        assert!(first_element(Value::Null).is_err());
    }

    proptest! {
        #[test]
        fn arbitrary_strings_never_fail(s in ".*") {
            let out = try_decode(Value::String(s.clone()));
            match serde_json::from_str::<Value>(&s) {
                Ok(parsed) => prop_assert_eq!(out, parsed),
                Err(_) => prop_assert_eq!(out, Value::String(s)),
            }
        }

        #[test]
        fn encoded_values_round_trip(n in any::<i64>(), text in "[a-zA-Z0-9 ]{0,16}") {
            let value = json!({"n": n, "text": text});
            prop_assert_eq!(try_decode(Value::String(value.to_string())), value);
        }
    }
}
