// src/update.rs
//! Atomic update operators (spec §3, §4.3).

use crate::error::{DbError, Result};
use crate::path;
use crate::value::{Document, Value};
use indexmap::IndexMap;

/// `apply(doc, update) -> doc'`. Operators are applied in the fixed order
/// the spec mandates; a single update may not target the same field from
/// two different operators.
pub fn apply(doc: &Document, update: &Value) -> Result<Document> {
    let update_obj = match update {
        Value::Object(o) => o,
        _ => return Err(DbError::InvalidArgument("update must be an object".into())),
    };

    const ORDER: [&str; 10] = [
        "$set", "$unset", "$inc", "$mul", "$min", "$max", "$push", "$pull", "$addToSet", "$rename",
    ];
    for key in update_obj.keys() {
        if !ORDER.contains(&key.as_str()) {
            return Err(DbError::InvalidArgument(format!("unsupported update operator: {}", key)));
        }
    }
    check_no_field_conflicts(update_obj)?;

    let mut out = doc.clone();
    for op in ORDER {
        if let Some(field_map) = update_obj.get(op) {
            apply_operator(&mut out, op, field_map)?;
        }
    }
    Ok(out)
}

fn check_no_field_conflicts(update_obj: &IndexMap<String, Value>) -> Result<()> {
    let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for (op, field_map) in update_obj {
        let fields = match field_map {
            Value::Object(o) => o,
            _ => return Err(DbError::InvalidArgument(format!("{} expects an object of fields", op))),
        };
        for field in fields.keys() {
            if !seen.insert(field.as_str()) {
                return Err(DbError::InvalidArgument(format!(
                    "conflicting update operators target the same field: {}",
                    field
                )));
            }
        }
    }
    Ok(())
}

fn apply_operator(doc: &mut Document, op: &str, field_map: &Value) -> Result<()> {
    let fields = field_map
        .as_object()
        .ok_or_else(|| DbError::InvalidArgument(format!("{} expects an object of fields", op)))?;
    for (field, operand) in fields {
        match op {
            "$set" => path::set(&mut doc.fields, field, operand.clone()),
            "$unset" => {
                path::unset(&mut doc.fields, field);
            }
            "$inc" => apply_inc(doc, field, operand, false)?,
            "$mul" => apply_inc(doc, field, operand, true)?,
            "$min" => apply_min_max(doc, field, operand, true)?,
            "$max" => apply_min_max(doc, field, operand, false)?,
            "$push" => apply_push(doc, field, operand)?,
            "$pull" => apply_pull(doc, field, operand),
            "$addToSet" => apply_add_to_set(doc, field, operand)?,
            "$rename" => apply_rename(doc, field, operand)?,
            _ => unreachable!("validated by ORDER above"),
        }
    }
    Ok(())
}

fn operand_number(operand: &Value, op: &str) -> Result<f64> {
    operand
        .as_f64()
        .ok_or_else(|| DbError::InvalidArgument(format!("{} requires a numeric operand", op)))
}

/// `$inc`/`$mul`: absent or non-numeric target treated as 0 (mul sets to 0).
fn apply_inc(doc: &mut Document, field: &str, operand: &Value, is_mul: bool) -> Result<()> {
    let delta = operand_number(operand, if is_mul { "$mul" } else { "$inc" })?;
    let current = path::get(&doc.fields, field).and_then(Value::as_f64).unwrap_or(0.0);
    let result = if is_mul { current * delta } else { current + delta };
    path::set(&mut doc.fields, field, Value::Number(result));
    Ok(())
}

/// `$min`/`$max`: write iff stored value is absent or numerically dominated.
fn apply_min_max(doc: &mut Document, field: &str, operand: &Value, is_min: bool) -> Result<()> {
    let candidate = operand_number(operand, if is_min { "$min" } else { "$max" })?;
    let current = path::get(&doc.fields, field).and_then(Value::as_f64);
    let should_write = match current {
        None => true,
        Some(c) => {
            if is_min {
                candidate < c
            } else {
                candidate > c
            }
        }
    };
    if should_write {
        path::set(&mut doc.fields, field, Value::Number(candidate));
    }
    Ok(())
}

/// `$push`: appends; creates an Array if absent; fails if present-and-not-Array.
fn apply_push(doc: &mut Document, field: &str, operand: &Value) -> Result<()> {
    match path::get_mut(&mut doc.fields, field) {
        Some(Value::Array(arr)) => {
            arr.push(operand.clone());
            Ok(())
        }
        Some(_) => Err(DbError::InvalidArgument(format!("$push target '{}' is not an array", field))),
        None => {
            path::set(&mut doc.fields, field, Value::Array(vec![operand.clone()]));
            Ok(())
        }
    }
}

/// `$pull`: removes all elements deep-equal to operand from the Array.
fn apply_pull(doc: &mut Document, field: &str, operand: &Value) {
    if let Some(Value::Array(arr)) = path::get_mut(&mut doc.fields, field) {
        arr.retain(|elem| elem != operand);
    }
}

/// `$addToSet`: `$push` iff no element deep-equals the operand.
fn apply_add_to_set(doc: &mut Document, field: &str, operand: &Value) -> Result<()> {
    let already_present = matches!(
        path::get(&doc.fields, field),
        Some(Value::Array(arr)) if arr.iter().any(|e| e == operand)
    );
    if already_present {
        return Ok(());
    }
    apply_push(doc, field, operand)
}

/// `$rename`: moves a field if present; no-op if absent.
fn apply_rename(doc: &mut Document, field: &str, operand: &Value) -> Result<()> {
    let new_name = operand
        .as_str()
        .ok_or_else(|| DbError::InvalidArgument("$rename target must be a string".into()))?;
    if let Some(value) = path::unset(&mut doc.fields, field) {
        path::set(&mut doc.fields, new_name, value);
    }
    Ok(())
}
