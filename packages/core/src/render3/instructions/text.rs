//! Text Instructions
//!
//! Corresponds to packages/core/src/render3/instructions/text.ts and
//! text_interpolation.ts

use crate::render3::assert::throw_error;
use crate::render3::bindings::{binding_updated, binding_updated2, Value};
use crate::render3::errors::Result;
use crate::render3::instructions::shared::{get_or_create_tnode, native_render_parent};
use crate::render3::interfaces::node::TNodeType;
use crate::render3::interfaces::view::{SlotValue, HEADER_OFFSET};
use crate::render3::state::ViewRuntime;

/// Creation-mode instruction: materializes a text node with static content.
pub fn text(rt: &mut ViewRuntime, index: usize, value: &str) -> Result<()> {
    let index = HEADER_OFFSET + index;
    let view_id = rt.active_view_id();

    get_or_create_tnode(rt, index, TNodeType::Text, Some(value.to_string()), None);
    // Text nodes cannot have children.
    rt.lframe_mut().is_parent = false;

    let renderer = rt.arena.view(view_id).renderer.clone();
    let native = renderer.create_text(value);
    rt.arena.view_mut(view_id).slots[index] = SlotValue::Node(native);
    if let Some(parent) = native_render_parent(rt, view_id, index) {
        renderer.append_child(parent, native);
    }
    Ok(())
}

/// Update-mode instruction: sets the selected text node's content from one
/// bound value.
pub fn text_interpolate(rt: &mut ViewRuntime, value: &Value) -> Result<()> {
    text_interpolate1(rt, "", value, "")
}

/// Update-mode instruction: `prefix{{v0}}suffix` against the selected text
/// node, one binding slot.
pub fn text_interpolate1(
    rt: &mut ViewRuntime,
    prefix: &str,
    v0: &Value,
    suffix: &str,
) -> Result<()> {
    let binding_index = rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let tnode_index = rt.selected_tnode_index();
    let view_id = rt.active_view_id();

    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated(&mut lview.slots, binding_index, v0, check_no_changes, None, Some(tnode_index))?
    };
    if changed {
        let text = format!("{prefix}{}{suffix}", v0.render_string());
        let lview = rt.arena.view(view_id);
        let native = lview
            .node_ref(tnode_index)
            .unwrap_or_else(|| throw_error("text binding target is not a native node"));
        lview.renderer.set_value(native, &text);
    }
    Ok(())
}

/// Update-mode instruction: `prefix{{v0}}infix{{v1}}suffix`, two binding
/// slots; a change in either value rewrites the whole text.
#[allow(clippy::too_many_arguments)]
pub fn text_interpolate2(
    rt: &mut ViewRuntime,
    prefix: &str,
    v0: &Value,
    infix: &str,
    v1: &Value,
    suffix: &str,
) -> Result<()> {
    let binding_index = rt.next_binding_index();
    // The second slot of the pair.
    rt.next_binding_index();
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let tnode_index = rt.selected_tnode_index();
    let view_id = rt.active_view_id();

    let changed = {
        let lview = rt.arena.view_mut(view_id);
        binding_updated2(
            &mut lview.slots,
            binding_index,
            v0,
            v1,
            check_no_changes,
            None,
            Some(tnode_index),
        )?
    };
    if changed {
        let text = format!(
            "{prefix}{}{infix}{}{suffix}",
            v0.render_string(),
            v1.render_string()
        );
        let lview = rt.arena.view(view_id);
        let native = lview
            .node_ref(tnode_index)
            .unwrap_or_else(|| throw_error("text binding target is not a native node"));
        lview.renderer.set_value(native, &text);
    }
    Ok(())
}
