//! Element Instructions
//!
//! Corresponds to packages/core/src/render3/instructions/element.ts

use crate::render3::errors::Result;
use crate::render3::instructions::shared::{
    create_directives_instances, get_or_create_tnode, native_render_parent, resolve_directives,
    save_resolved_locals_in_data, setup_static_attributes,
};
use crate::render3::interfaces::node::TNodeType;
use crate::render3::interfaces::view::{SlotValue, HEADER_OFFSET};
use crate::render3::state::ViewRuntime;

/// Creation-mode instruction: materializes an element node, resolves and
/// instantiates its directives and pushes it as the current parent.
///
/// `index` is the declaration index from the compiled template (0-based);
/// `attrs_index` points into the view's consts. Local refs resolve against
/// the matched directives' `export_as` names; an empty export targets the
/// element itself.
pub fn element_start(
    rt: &mut ViewRuntime,
    index: usize,
    name: &str,
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

    get_or_create_tnode(rt, index, TNodeType::Element, Some(name.to_string()), attrs);
    if first_create_pass {
        resolve_directives(rt, index, local_refs)?;
    }

    let renderer = rt.arena.view(view_id).renderer.clone();
    let native = renderer.create_element(name, None);
    rt.arena.view_mut(view_id).slots[index] = SlotValue::Node(native);
    setup_static_attributes(
        renderer.as_ref(),
        native,
        rt.arena.tview(tview_id).node(index),
    );
    if let Some(parent) = native_render_parent(rt, view_id, index) {
        renderer.append_child(parent, native);
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

/// Closes the current element and restores the cursor to its parent.
pub fn element_end(rt: &mut ViewRuntime) {
    let frame = rt.lframe_mut();
    if frame.is_parent {
        frame.is_parent = false;
    } else if let Some(cursor) = frame.current_tnode {
        let tview = rt.active_tview();
        let parent = tview.node(cursor).parent;
        rt.lframe_mut().current_tnode = parent;
    }
}

/// `element_start` + `element_end` for childless elements.
pub fn element(
    rt: &mut ViewRuntime,
    index: usize,
    name: &str,
    attrs_index: Option<usize>,
    local_refs: Option<&[(String, String)]>,
) -> Result<()> {
    element_start(rt, index, name, attrs_index, local_refs)?;
    element_end(rt);
    Ok(())
}
