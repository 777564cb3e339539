//! Helpers for the JSON values that flow between steps.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// Coerce a value into the sequence a step operates on.
///
/// Arrays yield their elements; any other value (including `null`) becomes a
/// one-element sequence.
pub fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Look up a named field of an object element.
///
/// Non-objects and missing fields yield `None`.
pub fn field<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
    item.as_object().and_then(|object| object.get(key))
}

/// Strict equality between two element fields.
///
/// Both values must have the same JSON type. Numbers compare by numeric value,
/// so `1` and `1.0` are equal.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        _ => a == b,
    }
}

/// Whether every key of `comparison` strictly equals the same field of `item`.
///
/// An empty comparison matches everything.
pub fn matches(item: &Value, comparison: &Map<String, Value>) -> bool {
    comparison.iter().all(|(key, expected)| {
        field(item, key).is_some_and(|actual| strict_equals(actual, expected))
    })
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order used to sort by criteria.
///
/// Values of different types order as
/// `null < bool < number < string < array < object`. Numbers compare
/// numerically (NaN cannot occur in JSON), strings lexicographically, arrays
/// element-wise and objects by their number of fields.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare(l, r))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> Ordering {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x.cmp(&y);
    }
    let x = x.as_f64().unwrap_or(0.0);
    let y = y.as_f64().unwrap_or(0.0);
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_sequence() {
        assert_eq!(into_sequence(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(into_sequence(json!(7)), vec![json!(7)]);
        assert_eq!(into_sequence(Value::Null), vec![Value::Null]);
        assert!(into_sequence(json!([])).is_empty());
    }

    #[test]
    fn test_strict_equals_numbers() {
        assert!(strict_equals(&json!(1), &json!(1.0)));
        assert!(strict_equals(&json!(-3), &json!(-3)));
        assert!(!strict_equals(&json!(1), &json!("1")));
        assert!(!strict_equals(&json!(0), &json!(false)));
        assert!(!strict_equals(&Value::Null, &json!(0)));
    }

    #[test]
    fn test_matches() {
        let item = json!({"name": "scott", "age": 29});
        let mut comparison = Map::new();
        assert!(matches(&item, &comparison));

        comparison.insert("age".into(), json!(29));
        assert!(matches(&item, &comparison));

        comparison.insert("name".into(), json!("lindsay"));
        assert!(!matches(&item, &comparison));

        let mut missing = Map::new();
        missing.insert("height".into(), Value::Null);
        assert!(!matches(&item, &missing));
        assert!(!matches(&json!(3), &missing));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare(&Value::Null, &json!(false)), Ordering::Less);
        assert_eq!(compare(&json!(99), &json!("1")), Ordering::Less);
        assert_eq!(compare(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
        assert_eq!(compare(&json!([1]), &json!([1, 0])), Ordering::Less);
    }
}
