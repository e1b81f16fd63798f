//! Element Container Instructions
//!
//! Corresponds to packages/core/src/render3/instructions/element_container.ts
//!
//! `<ng-container>` groups nodes without a native element of its own; it is
//! anchored by a comment and its children render into the nearest real
//! render parent.

use crate::render3::errors::Result;
use crate::render3::instructions::shared::{
    create_directives_instances, get_or_create_tnode, native_render_parent, resolve_directives,
    save_resolved_locals_in_data,
};
use crate::render3::interfaces::node::TNodeType;
use crate::render3::interfaces::view::{SlotValue, HEADER_OFFSET};
use crate::render3::state::ViewRuntime;

/// Creation-mode instruction: opens a logical container node.
pub fn element_container_start(
    rt: &mut ViewRuntime,
    index: usize,
    attrs_index: Option<usize>,
    local_refs: Option<&[(String, String)]>,
) -> Result<()> {
    let index = HEADER_OFFSET + index;
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let first_create_pass = rt.arena.tview(tview_id).first_create_pass;

    let attrs = attrs_index.and_then(|i| {
        rt.arena
            .tview(tview_id)
            .consts
            .as_ref()
            .and_then(|consts| consts.get(i).cloned())
    });

    get_or_create_tnode(rt, index, TNodeType::ElementContainer, None, attrs);
    if first_create_pass {
        resolve_directives(rt, index, local_refs)?;
    }

    let renderer = rt.arena.view(view_id).renderer.clone();
    let anchor = renderer.create_comment("ng-container");
    rt.arena.view_mut(view_id).slots[index] = SlotValue::Node(anchor);
    if let Some(parent) = native_render_parent(rt, view_id, index) {
        renderer.append_child(parent, anchor);
    }

    let is_directive_host = rt.arena.tview(tview_id).node(index).is_directive_host();
    if is_directive_host {
        create_directives_instances(rt, index)?;
    }
    if local_refs.is_some() {
        save_resolved_locals_in_data(rt, index);
    }
    Ok(())
}

/// Closes the current logical container.
pub fn element_container_end(rt: &mut ViewRuntime) {
    super::element::element_end(rt);
}

/// `element_container_start` + `element_container_end` for empty groupings.
pub fn element_container(
    rt: &mut ViewRuntime,
    index: usize,
    attrs_index: Option<usize>,
    local_refs: Option<&[(String, String)]>,
) -> Result<()> {
    element_container_start(rt, index, attrs_index, local_refs)?;
    element_container_end(rt);
    Ok(())
}
