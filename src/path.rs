// src/path.rs
//! Dot-path get/set/unset utilities (spec §4.1).
//!
//! A path is a dot-separated sequence of segments. Array intermediates use
//! non-negative integer segments as positional indices; any other segment
//! against an Array returns unpresent.

use crate::value::Value;
use indexmap::IndexMap;
use std::cmp::Ordering;

/// `get(doc, path)`: the deepest present value, or `None` if unpresent.
pub fn get<'a>(fields: &'a IndexMap<String, Value>, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut value = fields.get(first)?;
    for part in parts {
        value = step(value, part)?;
    }
    Some(value)
}

fn step<'a>(value: &'a Value, part: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(part),
        Value::Array(arr) => part.parse::<usize>().ok().and_then(|i| arr.get(i)),
        _ => None,
    }
}

/// `set(doc, path, v)`: creates missing intermediate Objects. Refuses to
/// overwrite a non-Object/non-Array intermediary without `promote = true`.
pub fn set(fields: &mut IndexMap<String, Value>, path: &str, value: Value) {
    set_with_promotion(fields, path, value, true)
}

pub fn set_with_promotion(
    fields: &mut IndexMap<String, Value>,
    path: &str,
    value: Value,
    promote: bool,
) {
    if !path.contains('.') {
        fields.insert(path.to_string(), value);
        return;
    }
    let parts: Vec<&str> = path.split('.').collect();
    let first = parts[0];
    if !fields.contains_key(first) {
        fields.insert(first.to_string(), build_nested(&parts[1..], value));
        return;
    }
    let root = fields.get_mut(first).unwrap();
    set_at_path(root, &parts[1..], value, promote);
}

fn build_nested(parts: &[&str], value: Value) -> Value {
    if parts.is_empty() {
        return value;
    }
    let mut obj = IndexMap::new();
    obj.insert(parts[0].to_string(), build_nested(&parts[1..], value));
    Value::Object(obj)
}

fn set_at_path(current: &mut Value, parts: &[&str], value: Value, promote: bool) {
    if parts.is_empty() {
        return;
    }
    if parts.len() == 1 {
        match current {
            Value::Object(map) => {
                map.insert(parts[0].to_string(), value);
            }
            Value::Array(arr) => {
                if let Ok(index) = parts[0].parse::<usize>() {
                    if index < arr.len() {
                        arr[index] = value;
                    } else if promote {
                        arr.resize(index + 1, Value::Null);
                        arr[index] = value;
                    }
                }
            }
            _ => {
                if promote {
                    let mut obj = IndexMap::new();
                    obj.insert(parts[0].to_string(), value);
                    *current = Value::Object(obj);
                }
            }
        }
        return;
    }
    match current {
        Value::Object(map) => {
            if !map.contains_key(parts[0]) {
                map.insert(parts[0].to_string(), build_nested(&parts[1..], value));
            } else {
                set_at_path(map.get_mut(parts[0]).unwrap(), &parts[1..], value, promote);
            }
        }
        Value::Array(arr) => {
            if let Ok(index) = parts[0].parse::<usize>() {
                if index < arr.len() {
                    set_at_path(&mut arr[index], &parts[1..], value, promote);
                }
            }
        }
        _ => {
            if promote {
                *current = build_nested(parts, value);
            }
        }
    }
}

/// `unset(doc, path)`: removes the terminal key, leaving intermediates intact.
pub fn unset(fields: &mut IndexMap<String, Value>, path: &str) -> Option<Value> {
    if !path.contains('.') {
        return fields.shift_remove(path);
    }
    let parts: Vec<&str> = path.split('.').collect();
    let root = fields.get_mut(parts[0])?;
    remove_at_path(root, &parts[1..])
}

fn remove_at_path(current: &mut Value, parts: &[&str]) -> Option<Value> {
    if parts.is_empty() {
        return None;
    }
    if parts.len() == 1 {
        match current {
            Value::Object(map) => map.shift_remove(parts[0]),
            Value::Array(arr) => parts[0]
                .parse::<usize>()
                .ok()
                .filter(|&i| i < arr.len())
                .map(|i| arr.remove(i)),
            _ => None,
        }
    } else {
        match current {
            Value::Object(map) => remove_at_path(map.get_mut(parts[0])?, &parts[1..]),
            Value::Array(arr) => {
                let i = parts[0].parse::<usize>().ok()?;
                remove_at_path(arr.get_mut(i)?, &parts[1..])
            }
            _ => None,
        }
    }
}

/// Get a mutable reference to the value at `path`, if every intermediate
/// segment already resolves.
pub fn get_mut<'a>(fields: &'a mut IndexMap<String, Value>, path: &str) -> Option<&'a mut Value> {
    if !path.contains('.') {
        return fields.get_mut(path);
    }
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = fields.get_mut(parts[0])?;
    for part in &parts[1..] {
        current = match current {
            Value::Object(map) => map.get_mut(*part)?,
            Value::Array(arr) => arr.get_mut(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Comparable ordering between two values of the same ordered kind (Number
/// or String). Cross-kind comparisons (and anything else) yield `None`.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value as V;

    fn obj(pairs: Vec<(&str, V)>) -> IndexMap<String, V> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn get_simple_and_nested() {
        let fields = obj(vec![("address", V::Object(obj(vec![("city", V::String("NYC".into()))])))]);
        assert_eq!(get(&fields, "address.city"), Some(&V::String("NYC".into())));
        assert_eq!(get(&fields, "address.zip"), None);
    }

    #[test]
    fn get_array_index_segment() {
        let fields = obj(vec![("items", V::Array(vec![V::String("a".into()), V::String("b".into())]))]);
        assert_eq!(get(&fields, "items.1"), Some(&V::String("b".into())));
        assert_eq!(get(&fields, "items.x"), None);
    }

    #[test]
    fn set_creates_missing_intermediates() {
        let mut fields = IndexMap::new();
        set(&mut fields, "a.b.c", V::Number(1.0));
        assert_eq!(get(&fields, "a.b.c"), Some(&V::Number(1.0)));
    }

    #[test]
    fn unset_leaves_intermediates() {
        let mut fields = obj(vec![("a", V::Object(obj(vec![
            ("b", V::Number(1.0)),
            ("c", V::Number(2.0)),
        ])))]);
        unset(&mut fields, "a.b");
        assert_eq!(get(&fields, "a.b"), None);
        assert_eq!(get(&fields, "a.c"), Some(&V::Number(2.0)));
    }

    #[test]
    fn compare_values_cross_kind_is_none() {
        assert_eq!(compare_values(&V::String("1".into()), &V::Number(1.0)), None);
    }
}
