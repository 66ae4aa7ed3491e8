// src/query/operators.rs
//! Field and logical operator evaluation (spec §4.2).
//!
//! Comparison operators require the compared values to be of the same
//! ordered kind (Number or String); cross-kind comparisons yield `false`
//! rather than an error, matching spec §4.2's "predicate false" rule.

use crate::error::{DbError, Result};
use crate::path;
use crate::value::{Document, Value};
use lazy_static::lazy_static;
use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Mutex;

lazy_static! {
    static ref REGEX_CACHE: Mutex<LruCache<String, Regex>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(100).unwrap()));
}

fn compile_regex(pattern: &str, options: &str) -> Option<Regex> {
    let valid_options: String = options.chars().filter(|c| matches!(c, 'i' | 'm' | 's' | 'x')).collect();
    let key = format!("{}:{}", pattern, valid_options);
    {
        let mut cache = REGEX_CACHE.lock().unwrap();
        if let Some(r) = cache.get(&key) {
            return Some(r.clone());
        }
    }
    let mut full = String::new();
    if !valid_options.is_empty() {
        full.push_str("(?");
        full.push_str(&valid_options);
        full.push(')');
    }
    full.push_str(pattern);
    let regex = Regex::new(&full).ok()?;
    REGEX_CACHE.lock().unwrap().put(key, regex.clone());
    Some(regex)
}

/// Top-level entry point: `matches(doc, query)`.
pub fn matches(doc: &Document, filter: &Value) -> Result<bool> {
    let obj = match filter {
        Value::Object(o) => o,
        _ => return Err(DbError::InvalidArgument("query filter must be an object".into())),
    };
    if obj.is_empty() {
        return Ok(true);
    }
    // Mixed logical-and-field top-level queries are a conjunction.
    for (key, value) in obj {
        let ok = match key.as_str() {
            "$and" => match_and(doc, value)?,
            "$or" => match_or(doc, value)?,
            "$not" => match_not(doc, value)?,
            field_path => match_field(doc, field_path, value)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn as_array<'a>(v: &'a Value, op: &str) -> Result<&'a [Value]> {
    v.as_array().ok_or_else(|| DbError::InvalidArgument(format!("{} expects an array", op)))
}

fn match_and(doc: &Document, clauses: &Value) -> Result<bool> {
    for clause in as_array(clauses, "$and")? {
        if !matches(doc, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn match_or(doc: &Document, clauses: &Value) -> Result<bool> {
    for clause in as_array(clauses, "$or")? {
        if matches(doc, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// `$not`: negation of a single sub-query, or NOR of an array.
fn match_not(doc: &Document, operand: &Value) -> Result<bool> {
    match operand {
        Value::Array(clauses) => {
            for clause in clauses {
                if matches(doc, clause)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        other => Ok(!matches(doc, other)?),
    }
}

fn deep_eq(a: &Value, b: &Value) -> bool {
    a == b
}

/// A field-path predicate: either a literal (equality, with array-element
/// matching) or an operator map (`{"$gt": 5}` etc).
fn match_field(doc: &Document, field_path: &str, operand: &Value) -> Result<bool> {
    let doc_value = doc.get(field_path);
    match operand {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => {
            for (op, arg) in map {
                if op == "$options" {
                    continue; // consumed alongside $regex
                }
                let options = map
                    .get("$options")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                if !eval_operator(op, doc_value, arg, options, doc)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        literal => Ok(match_literal(doc_value, literal)),
    }
}

fn match_literal(doc_value: Option<&Value>, literal: &Value) -> bool {
    match doc_value {
        None => false,
        Some(v) => {
            if deep_eq(v, literal) {
                return true;
            }
            if let Value::Array(arr) = v {
                arr.iter().any(|elem| deep_eq(elem, literal))
            } else {
                false
            }
        }
    }
}

fn eval_operator(
    op: &str,
    doc_value: Option<&Value>,
    arg: &Value,
    regex_options: &str,
    _document: &Document,
) -> Result<bool> {
    match op {
        "$eq" => Ok(match_literal(doc_value, arg)),
        "$ne" => Ok(!match_literal(doc_value, arg)),
        "$gt" => Ok(compare(doc_value, arg).map(|o| o.is_gt()).unwrap_or(false)),
        "$gte" => Ok(compare(doc_value, arg).map(|o| o.is_ge()).unwrap_or(false)),
        "$lt" => Ok(compare(doc_value, arg).map(|o| o.is_lt()).unwrap_or(false)),
        "$lte" => Ok(compare(doc_value, arg).map(|o| o.is_le()).unwrap_or(false)),
        "$in" => Ok(match_in(doc_value, arg, false)),
        "$nin" => Ok(match_in(doc_value, arg, true)),
        "$exists" => {
            let want = arg.as_bool().unwrap_or(true);
            Ok(doc_value.is_some() == want)
        }
        "$regex" => {
            let pattern = match arg {
                Value::String(s) => s.as_str(),
                _ => return Ok(false),
            };
            let text = match doc_value {
                Some(Value::String(s)) => s.as_str(),
                _ => return Ok(false),
            };
            Ok(compile_regex(pattern, regex_options)
                .map(|re| re.is_match(text))
                .unwrap_or(false))
        }
        other => Err(DbError::InvalidArgument(format!("unsupported query operator: {}", other))),
    }
}

fn compare(doc_value: Option<&Value>, arg: &Value) -> Option<std::cmp::Ordering> {
    path::compare_values(doc_value?, arg)
}

fn match_in(doc_value: Option<&Value>, operand: &Value, negate: bool) -> bool {
    let candidates = match operand.as_array() {
        Some(a) => a,
        None => return negate, // malformed operand: $nin vacuously true, $in false
    };
    let hit = match doc_value {
        None => false,
        Some(Value::Array(arr)) => arr.iter().any(|elem| candidates.iter().any(|c| deep_eq(elem, c))),
        Some(v) => candidates.iter().any(|c| deep_eq(v, c)),
    };
    if negate {
        !hit
    } else {
        hit
    }
}
