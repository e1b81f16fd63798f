//! Binding Protocol
//!
//! Corresponds to packages/core/src/render3/bindings.ts
//!
//! Update-mode template code consumes the binding region of an LView in the
//! slot order fixed at compile time. Each slot starts out as the `NO_CHANGE`
//! sentinel, which never compares equal to a user value, so the first pass
//! always writes.

use std::any::Any;
use std::rc::Rc;

use super::errors::{Result, RuntimeError, RuntimeErrorCode};
use super::interfaces::view::{SlotValue, TData};

/// Joins the parts of an interpolation binding in the stored metadata string.
pub const INTERPOLATION_DELIMITER: char = '\u{1F}';

/// A binding value. Equality follows `Object.is` semantics: scalars by value
/// (NaN equal to NaN), references by identity.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    Ref(Rc<dyn Any>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Num(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Ref(_) => write!(f, "[object]"),
        }
    }
}

impl Value {
    /// Stringification used by interpolation; `Null` renders empty the way
    /// interpolated nullish values render empty.
    pub fn render_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Num(v) => v.to_string(),
            Value::Str(v) => v.clone(),
            Value::Ref(_) => "[object Object]".to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Num(v) => *v != 0.0 && !v.is_nan(),
            Value::Str(v) => !v.is_empty(),
            Value::Ref(_) => true,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Compares `value` against the binding slot and writes it when different.
///
/// Returns whether the slot was updated. In check-no-changes mode a changed
/// binding is the unidirectional-data-flow violation the mode exists to
/// detect, so it raises `ExpressionChangedAfterChecked` instead of writing.
pub fn binding_updated(
    slots: &mut [SlotValue],
    binding_index: usize,
    value: &Value,
    check_no_changes: bool,
    prop_name: Option<&str>,
    tnode_index: Option<usize>,
) -> Result<bool> {
    let old = &slots[binding_index];
    let changed = match old {
        SlotValue::NoChange => true,
        SlotValue::Value(old_value) => old_value != value,
        _ => true,
    };
    if !changed {
        return Ok(false);
    }
    if check_no_changes {
        return Err(expression_changed_error(old, value, prop_name, tnode_index));
    }
    slots[binding_index] = SlotValue::Value(value.clone());
    Ok(true)
}

/// Two-slot variant used by arity-2 interpolations; both slots are kept
/// current even when only one of them changed.
pub fn binding_updated2(
    slots: &mut [SlotValue],
    binding_index: usize,
    v0: &Value,
    v1: &Value,
    check_no_changes: bool,
    prop_name: Option<&str>,
    tnode_index: Option<usize>,
) -> Result<bool> {
    let different =
        binding_updated(slots, binding_index, v0, check_no_changes, prop_name, tnode_index)?;
    Ok(
        binding_updated(slots, binding_index + 1, v1, check_no_changes, prop_name, tnode_index)?
            || different,
    )
}

fn expression_changed_error(
    old: &SlotValue,
    new: &Value,
    prop_name: Option<&str>,
    tnode_index: Option<usize>,
) -> RuntimeError {
    let old_repr = match old {
        SlotValue::NoChange => "NO_CHANGE".to_string(),
        SlotValue::Value(v) => format!("{v:?}"),
        _ => "<non-binding slot>".to_string(),
    };
    let mut target = prop_name
        .map(|name| format!(" for '{name}'"))
        .unwrap_or_default();
    if let Some(index) = tnode_index {
        target.push_str(&format!(" on node at index {index}"));
    }
    RuntimeError::new(
        RuntimeErrorCode::ExpressionChangedAfterChecked,
        format!(
            "ExpressionChangedAfterItHasBeenCheckedError: expression{target} has changed after it \
             was checked. Previous value: {old_repr}. Current value: {new:?}.",
        ),
    )
}

/// Records debug metadata for a property binding on the first update pass.
/// Metadata is never overwritten; the first writer wins.
pub fn store_property_binding_metadata(
    data: &mut [TData],
    first_update_pass: bool,
    binding_index: usize,
    prop_name: &str,
    interpolation_parts: &[&str],
) {
    if !first_update_pass {
        return;
    }
    if let TData::Null = data[binding_index] {
        let meta = if interpolation_parts.is_empty() {
            prop_name.to_string()
        } else {
            let mut meta = String::from(prop_name);
            for part in interpolation_parts {
                meta.push(INTERPOLATION_DELIMITER);
                meta.push_str(part);
            }
            meta
        };
        data[binding_index] = TData::BindingMetadata(meta);
    }
}
