//! JSON navigation helpers for the extractor.
//!
//! Each helper reads one field of an object and reports failures with the
//! dotted path of the field (`x.out[1].addr`), so a dropped message can be
//! diagnosed from the log line alone. Paths are only built on failure.

use serde_json::{Map, Value};
use utx_core::error::ExtractError;

/// Join a parent path and a key: `("x", "hash")` → `"x.hash"`.
pub fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() { key.to_string() } else { format!("{parent}.{key}") }
}

/// Path of an array element: `("x.out", 1)` → `"x.out[1]"`.
pub fn index(parent: &str, idx: usize) -> String {
    format!("{parent}[{idx}]")
}

/// Read a required field of `obj`, located at `path`.
#[inline]
pub fn field<'a>(obj: &'a Map<String, Value>, path: &str, key: &str) -> Result<&'a Value, ExtractError> {
    obj.get(key).ok_or_else(|| ExtractError::MissingField(join(path, key)))
}

/// View `v` (located at `path`) as an object.
#[inline]
pub fn as_object<'a>(v: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ExtractError> {
    v.as_object().ok_or_else(|| wrong_type(path, "an object"))
}

/// Read a required object-valued field.
pub fn object_field<'a>(
    obj: &'a Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<&'a Map<String, Value>, ExtractError> {
    field(obj, path, key)?.as_object().ok_or_else(|| wrong_type(&join(path, key), "an object"))
}

/// Read a required array-valued field.
pub fn array_field<'a>(obj: &'a Map<String, Value>, path: &str, key: &str) -> Result<&'a [Value], ExtractError> {
    field(obj, path, key)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| wrong_type(&join(path, key), "an array"))
}

/// Read a required string field.
pub fn str_field<'a>(obj: &'a Map<String, Value>, path: &str, key: &str) -> Result<&'a str, ExtractError> {
    field(obj, path, key)?.as_str().ok_or_else(|| wrong_type(&join(path, key), "a string"))
}

/// Read a required non-negative integer field.
pub fn u64_field(obj: &Map<String, Value>, path: &str, key: &str) -> Result<u64, ExtractError> {
    field(obj, path, key)?.as_u64().ok_or_else(|| wrong_type(&join(path, key), "an unsigned integer"))
}

fn wrong_type(path: &str, expected: &'static str) -> ExtractError {
    let field = if path.is_empty() { "<root>".to_string() } else { path.to_string() };
    ExtractError::WrongType { field, expected }
}
