//! Property Instructions
//!
//! Corresponds to packages/core/src/render3/instructions/property.ts,
//! host_property.ts and styling.ts
//!
//! All property-shaped bindings follow the same path: consume a binding
//! slot, compare, and on change route the value either into directive
//! inputs or through the renderer onto the selected element.

use crate::render3::assert::throw_error;
use crate::render3::bindings::{
    binding_updated, binding_updated2, store_property_binding_metadata, Value,
};
use crate::render3::errors::{Result, RuntimeError, RuntimeErrorCode};
use crate::render3::instructions::shared::{native_by_index, set_inputs_for_property};
use crate::render3::interfaces::node::TNodeType;
use crate::render3::interfaces::sanitizer::SanitizeFn;
use crate::render3::schema::matching_schemas;
use crate::render3::state::ViewRuntime;

/// Update-mode instruction: `[prop]="expr"` on the selected node.
pub fn property(
    rt: &mut ViewRuntime,
    prop_name: &str,
    value: &Value,
    sanitizer: Option<SanitizeFn>,
) -> Result<()> {
    let binding_index = rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let view_id = rt.active_view_id();
    let tnode_index = rt.selected_tnode_index();
    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated(
            &mut lview.slots,
            binding_index,
            value,
            check_no_changes,
            Some(prop_name),
            Some(tnode_index),
        )?
    };
    if changed {
        element_property_internal(rt, prop_name, value, sanitizer, binding_index, &[])?;
    }
    Ok(())
}

/// Update-mode instruction inside a host-bindings function; the binding slot
/// comes from the directive's host-var region.
pub fn host_property(
    rt: &mut ViewRuntime,
    prop_name: &str,
    value: &Value,
    sanitizer: Option<SanitizeFn>,
) -> Result<()> {
    property(rt, prop_name, value, sanitizer)
}

/// `prop="prefix{{v0}}suffix"`, one binding slot.
pub fn property_interpolate1(
    rt: &mut ViewRuntime,
    prop_name: &str,
    prefix: &str,
    v0: &Value,
    suffix: &str,
    sanitizer: Option<SanitizeFn>,
) -> Result<()> {
    let binding_index = rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let view_id = rt.active_view_id();
    let tnode_index = rt.selected_tnode_index();
    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated(
            &mut lview.slots,
            binding_index,
            v0,
            check_no_changes,
            Some(prop_name),
            Some(tnode_index),
        )?
    };
    if changed {
        let interpolated = Value::Str(format!("{prefix}{}{suffix}", v0.render_string()));
        element_property_internal(
            rt,
            prop_name,
            &interpolated,
            sanitizer,
            binding_index,
            &[prefix, suffix],
        )?;
    }
    Ok(())
}

/// `prop="prefix{{v0}}infix{{v1}}suffix"`, two binding slots.
#[allow(clippy::too_many_arguments)]
pub fn property_interpolate2(
    rt: &mut ViewRuntime,
    prop_name: &str,
    prefix: &str,
    v0: &Value,
    infix: &str,
    v1: &Value,
    suffix: &str,
    sanitizer: Option<SanitizeFn>,
) -> Result<()> {
    let binding_index = rt.next_binding_index();
    rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let view_id = rt.active_view_id();
    let tnode_index = rt.selected_tnode_index();
    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated2(
            &mut lview.slots,
            binding_index,
            v0,
            v1,
            check_no_changes,
            Some(prop_name),
            Some(tnode_index),
        )?
    };
    if changed {
        let interpolated = Value::Str(format!(
            "{prefix}{}{infix}{}{suffix}",
            v0.render_string(),
            v1.render_string()
        ));
        element_property_internal(
            rt,
            prop_name,
            &interpolated,
            sanitizer,
            binding_index,
            &[prefix, infix, suffix],
        )?;
    }
    Ok(())
}

fn element_property_internal(
    rt: &mut ViewRuntime,
    prop_name: &str,
    value: &Value,
    sanitizer: Option<SanitizeFn>,
    binding_index: usize,
    interpolation_parts: &[&str],
) -> Result<()> {
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let tnode_index = rt.selected_tnode_index();
    let dev_mode = rt.dev_mode;

    if dev_mode {
        let (_, tview) = rt.arena.view_and_tview_mut(view_id);
        let first_update_pass = tview.first_update_pass;
        store_property_binding_metadata(
            &mut tview.data,
            first_update_pass,
            binding_index,
            prop_name,
            interpolation_parts,
        );
        if first_update_pass {
            let tnode = tview.node_mut(tnode_index);
            tnode
                .property_bindings
                .get_or_insert_with(Vec::new)
                .push(binding_index);
        }
    }

    if set_inputs_for_property(rt, tnode_index, prop_name, value) {
        return Ok(());
    }

    let (tnode_type, tag_name) = {
        let tnode = rt.arena.tview(tview_id).node(tnode_index);
        (tnode.type_, tnode.value.clone())
    };
    if tnode_type != TNodeType::Element {
        return Ok(());
    }

    let native = native_by_index(rt, view_id, tnode_index)
        .unwrap_or_else(|| throw_error("property binding target is not a native element"));
    let lview = rt.arena.view(view_id);
    if dev_mode && !lview.renderer.has_property(native, prop_name) {
        let schemas = rt.arena.tview(tview_id).schemas.clone();
        if !matching_schemas(schemas.as_deref(), tag_name.as_deref()) {
            return Err(RuntimeError::new(
                RuntimeErrorCode::UnknownProperty,
                format!(
                    "Can't bind to '{prop_name}' since it isn't a known property of \
                     '{}'.",
                    tag_name.as_deref().unwrap_or("<unknown>")
                ),
            ));
        }
    }

    let safe_value;
    let value = match (sanitizer, &tag_name) {
        (Some(sanitize), Some(tag)) => {
            safe_value = sanitize(value, tag, prop_name);
            &safe_value
        }
        _ => value,
    };
    let lview = rt.arena.view(view_id);
    lview.renderer.set_property(native, prop_name, value);
    Ok(())
}

/// Update-mode instruction: `[attr.name]="expr"` on the selected element.
/// A null value removes the attribute.
pub fn attribute(rt: &mut ViewRuntime, name: &str, value: &Value) -> Result<()> {
    let binding_index = rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let view_id = rt.active_view_id();
    let tnode_index = rt.selected_tnode_index();
    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated(
            &mut lview.slots,
            binding_index,
            value,
            check_no_changes,
            Some(name),
            Some(tnode_index),
        )?
    };
    if changed {
        let native = native_by_index(rt, view_id, tnode_index)
            .unwrap_or_else(|| throw_error("attribute binding target is not a native element"));
        let lview = rt.arena.view(view_id);
        match value {
            Value::Null => lview.renderer.remove_attribute(native, name, None),
            other => lview
                .renderer
                .set_attribute(native, name, &other.render_string(), None),
        }
    }
    Ok(())
}

/// Update-mode instruction: `[class.name]="expr"` on the selected element.
pub fn class_prop(rt: &mut ViewRuntime, class_name: &str, value: &Value) -> Result<()> {
    let binding_index = rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let view_id = rt.active_view_id();
    let tnode_index = rt.selected_tnode_index();
    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated(
            &mut lview.slots,
            binding_index,
            value,
            check_no_changes,
            Some(class_name),
            Some(tnode_index),
        )?
    };
    if changed {
        let native = native_by_index(rt, view_id, tnode_index)
            .unwrap_or_else(|| throw_error("class binding target is not a native element"));
        let lview = rt.arena.view(view_id);
        if value.is_truthy() {
            lview.renderer.add_class(native, class_name);
        } else {
            lview.renderer.remove_class(native, class_name);
        }
    }
    Ok(())
}

/// Update-mode instruction: `[style.name]="expr"` on the selected element.
pub fn style_prop(rt: &mut ViewRuntime, style_name: &str, value: &Value) -> Result<()> {
    let binding_index = rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let view_id = rt.active_view_id();
    let tnode_index = rt.selected_tnode_index();
    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated(
            &mut lview.slots,
            binding_index,
            value,
            check_no_changes,
            Some(style_name),
            Some(tnode_index),
        )?
    };
    if changed {
        let native = native_by_index(rt, view_id, tnode_index)
            .unwrap_or_else(|| throw_error("style binding target is not a native element"));
        let lview = rt.arena.view(view_id);
        match value {
            Value::Null => lview.renderer.remove_style(native, style_name),
            other => lview
                .renderer
                .set_style(native, style_name, &other.render_string()),
        }
    }
    Ok(())
}
