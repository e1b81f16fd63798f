//! Pipe Instructions
//!
//! Corresponds to packages/core/src/render3/pipe.ts
//!
//! Pure pipes memoize through binding slots: the argument slots hold the
//! last inputs, one more slot holds the last result. Impure pipes transform
//! on every invocation.

use crate::render3::bindings::{binding_updated, binding_updated2, Value};
use crate::render3::errors::{Result, RuntimeError, RuntimeErrorCode};
use crate::render3::interfaces::view::{SlotValue, TData, HEADER_OFFSET};
use crate::render3::state::ViewRuntime;

/// Creation-mode instruction: instantiates the pipe named `name` into the
/// declaration slot `index`.
pub fn pipe(rt: &mut ViewRuntime, index: usize, name: &str) -> Result<()> {
    let index = HEADER_OFFSET + index;
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();

    let def = if rt.arena.tview(tview_id).first_create_pass {
        let found = rt.arena.tview(tview_id).pipe_registry.as_ref().and_then(|registry| {
            registry.iter().find(|def| def.name == name).cloned()
        });
        let def = found.ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorCode::PipeNotFound,
                format!("The pipe '{name}' could not be found!"),
            )
        })?;
        rt.arena.tview_mut(tview_id).data[index] = TData::PipeDef(def.clone());
        def
    } else {
        match &rt.arena.tview(tview_id).data[index] {
            TData::PipeDef(def) => def.clone(),
            other => {
                return Err(RuntimeError::new(
                    RuntimeErrorCode::PipeNotFound,
                    format!("expected pipe def at {index}, found {other:?}"),
                ))
            }
        }
    };

    let instance = (def.factory)();
    rt.arena.view_mut(view_id).slots[index] = SlotValue::Instance(instance);
    if let Some(on_destroy) = def.on_destroy {
        let handle = rt.arena.view(view_id).instance(index);
        rt.arena.view_mut(view_id).cleanup.push(Box::new(move || {
            let _ = on_destroy(&mut *handle.borrow_mut());
        }));
    }
    Ok(())
}

/// Update-mode instruction: one-argument pipe evaluation. `slot_offset` is
/// the offset of the pipe's reserved slots from the binding root.
pub fn pipe_bind1(
    rt: &mut ViewRuntime,
    index: usize,
    slot_offset: usize,
    arg: &Value,
) -> Result<Value> {
    let index = HEADER_OFFSET + index;
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let binding_index = rt.lframe().binding_root_index + slot_offset;
    let check_no_changes = rt.is_in_check_no_changes_mode();

    let def = match &rt.arena.tview(tview_id).data[index] {
        TData::PipeDef(def) => def.clone(),
        other => {
            return Err(RuntimeError::new(
                RuntimeErrorCode::PipeNotFound,
                format!("expected pipe def at {index}, found {other:?}"),
            ))
        }
    };

    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated(&mut lview.slots, binding_index, arg, check_no_changes, None, None)?
    };
    if def.pure && !changed {
        return Ok(read_memoized(rt, view_id, binding_index + 1));
    }

    let instance = rt.arena.view(view_id).instance(index);
    let result = (def.transform)(&mut *instance.borrow_mut(), std::slice::from_ref(arg))?;
    rt.arena.view_mut(view_id).slots[binding_index + 1] = SlotValue::Value(result.clone());
    Ok(result)
}

/// Update-mode instruction: two-argument pipe evaluation.
pub fn pipe_bind2(
    rt: &mut ViewRuntime,
    index: usize,
    slot_offset: usize,
    arg0: &Value,
    arg1: &Value,
) -> Result<Value> {
    let index = HEADER_OFFSET + index;
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let binding_index = rt.lframe().binding_root_index + slot_offset;
    let check_no_changes = rt.is_in_check_no_changes_mode();

    let def = match &rt.arena.tview(tview_id).data[index] {
        TData::PipeDef(def) => def.clone(),
        other => {
            return Err(RuntimeError::new(
                RuntimeErrorCode::PipeNotFound,
                format!("expected pipe def at {index}, found {other:?}"),
            ))
        }
    };

    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated2(
            &mut lview.slots,
            binding_index,
            arg0,
            arg1,
            check_no_changes,
            None,
            None,
        )?
    };
    if def.pure && !changed {
        return Ok(read_memoized(rt, view_id, binding_index + 2));
    }

    let instance = rt.arena.view(view_id).instance(index);
    let result = (def.transform)(
        &mut *instance.borrow_mut(),
        &[arg0.clone(), arg1.clone()],
    )?;
    rt.arena.view_mut(view_id).slots[binding_index + 2] = SlotValue::Value(result.clone());
    Ok(result)
}

fn read_memoized(
    rt: &ViewRuntime,
    view_id: crate::render3::arena::LViewId,
    slot: usize,
) -> Value {
    match &rt.arena.view(view_id).slots[slot] {
        SlotValue::Value(value) => value.clone(),
        _ => Value::Null,
    }
}
