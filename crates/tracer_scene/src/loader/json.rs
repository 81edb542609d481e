//! Typed accessors over `serde_json::Value`
//!
//! Every accessor takes a `context` string naming the value being read so
//! that configuration errors point at the offending part of the description.

use crate::error::{SceneError, SceneResult};
use crate::foundation::math::{Mat4, Vec2, Vec3};
use serde_json::Value;

/// Fail with a configuration error unless every key is present
pub fn check_keys(value: &Value, keys: &[&str], context: &str) -> SceneResult<()> {
    let Some(object) = value.as_object() else {
        return Err(SceneError::Config(format!("{context}: expected an object")));
    };
    match keys.iter().find(|key| !object.contains_key(**key)) {
        Some(missing) => Err(SceneError::Config(format!("{context}: missing required key '{missing}'"))),
        None => Ok(()),
    }
}

/// Required member of an object
pub fn field<'a>(value: &'a Value, key: &str, context: &str) -> SceneResult<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| SceneError::Config(format!("{context}: missing required key '{key}'")))
}

/// Array value
pub fn as_array<'a>(value: &'a Value, context: &str) -> SceneResult<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| SceneError::Config(format!("{context}: expected an array")))
}

/// String value
pub fn as_str<'a>(value: &'a Value, context: &str) -> SceneResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| SceneError::Config(format!("{context}: expected a string")))
}

/// Boolean value
pub fn as_bool(value: &Value, context: &str) -> SceneResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| SceneError::Config(format!("{context}: expected a boolean")))
}

/// Numeric value as `f32`
pub fn as_f32(value: &Value, context: &str) -> SceneResult<f32> {
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| SceneError::Config(format!("{context}: expected a number")))
}

/// Integer value
pub fn as_i64(value: &Value, context: &str) -> SceneResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| SceneError::Config(format!("{context}: expected an integer")))
}

/// Flat list of exactly `N` numbers
pub fn as_floats<const N: usize>(value: &Value, context: &str) -> SceneResult<[f32; N]> {
    let items = as_array(value, context)?;
    if items.len() != N {
        return Err(SceneError::Config(format!(
            "{context}: expected {N} numbers, found {}",
            items.len()
        )));
    }

    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = as_f32(item, context)?;
    }
    Ok(out)
}

/// Two-component vector
pub fn as_vec2(value: &Value, context: &str) -> SceneResult<Vec2> {
    as_floats::<2>(value, context).map(Vec2::from)
}

/// Three-component vector
pub fn as_vec3(value: &Value, context: &str) -> SceneResult<Vec3> {
    as_floats::<3>(value, context).map(Vec3::from)
}

/// Row-major 4x4 matrix, written as four rows or sixteen numbers
pub fn as_mat4(value: &Value, context: &str) -> SceneResult<Mat4> {
    let items = as_array(value, context)?;
    let values: [f32; 16] = if items.len() == 4 && items.iter().all(Value::is_array) {
        let mut flat = [0.0; 16];
        for (r, row) in items.iter().enumerate() {
            let row = as_floats::<4>(row, context)?;
            flat[r * 4..r * 4 + 4].copy_from_slice(&row);
        }
        flat
    } else {
        as_floats::<16>(value, context)?
    };
    Ok(Mat4::from_row_slice(&values))
}
