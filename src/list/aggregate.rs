//! Aggregation and ordering over type-erased list slots.
//!
//! NULL slots never take part in `min`, `max`, `sum` or `average`.

use crate::core::{DbError, ElementType, Result, Value};
use std::cmp::Ordering;

pub(crate) fn min(values: &[Value]) -> Result<Option<Value>> {
    extreme(values, Ordering::Less)
}

pub(crate) fn max(values: &[Value]) -> Result<Option<Value>> {
    extreme(values, Ordering::Greater)
}

// First value that no other value beats in direction `wanted`.
fn extreme(values: &[Value], wanted: Ordering) -> Result<Option<Value>> {
    let mut best: Option<&Value> = None;
    for value in values.iter().filter(|v| !v.is_null()) {
        best = match best {
            Some(current) if value.compare(current)? != wanted => Some(current),
            _ => Some(value),
        };
    }
    Ok(best.cloned())
}

/// Sum of the present values, narrowed back to `kind`.
///
/// Integers accumulate in wrapping 64-bit arithmetic, floats in `f64`. An
/// empty list yields the additive identity of `kind`.
pub(crate) fn sum(kind: ElementType, values: &[Value]) -> Result<Value> {
    let present = values.iter().filter(|v| !v.is_null());

    match kind {
        ElementType::Float | ElementType::Double => {
            let mut total = 0.0f64;
            for value in present {
                total += numeric_f64(value)?;
            }
            Ok(match kind {
                ElementType::Float => Value::Float(total as f32),
                _ => Value::Double(total),
            })
        }
        ElementType::Int8 | ElementType::Int16 | ElementType::Int32 | ElementType::Int64 => {
            let mut total = 0i64;
            for value in present {
                let n = value.as_i64().ok_or_else(|| not_numeric(value))?;
                total = total.wrapping_add(n);
            }
            Ok(match kind {
                ElementType::Int8 => Value::Int8(total as i8),
                ElementType::Int16 => Value::Int16(total as i16),
                ElementType::Int32 => Value::Int32(total as i32),
                _ => Value::Int64(total),
            })
        }
        other => Err(DbError::TypeMismatch(format!(
            "Cannot sum a list of {}",
            other
        ))),
    }
}

pub(crate) fn average(values: &[Value]) -> Result<Option<f64>> {
    let mut total = 0.0f64;
    let mut count = 0usize;
    for value in values.iter().filter(|v| !v.is_null()) {
        total += numeric_f64(value)?;
        count += 1;
    }

    if count == 0 {
        return Ok(None);
    }
    Ok(Some(total / count as f64))
}

/// Stable ascending sort; NULL first. Descending is the exact reverse.
pub(crate) fn sort(values: &mut [Value], ascending: bool) -> Result<()> {
    let mut failure = None;
    values.sort_by(|a, b| {
        a.compare(b).unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    if let Some(err) = failure {
        return Err(err);
    }

    if !ascending {
        values.reverse();
    }
    Ok(())
}

fn numeric_f64(value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| not_numeric(value))
}

fn not_numeric(value: &Value) -> DbError {
    DbError::TypeMismatch(format!("{} is not numeric", value.type_name()))
}
