//! View Container API
//!
//! Corresponds to packages/core/src/linker/view_container_ref.ts, reduced to
//! the runtime seam: creating embedded views from a declared template and
//! inserting, moving, detaching or removing them, including into containers
//! of other views, which is what makes a view transplanted.

use crate::render3::arena::{LContainerId, LViewId};
use crate::render3::assert::throw_error;
use crate::render3::change_detection::render_view;
use crate::render3::errors::Result;
use crate::render3::instructions::shared::create_lview;
use crate::render3::interfaces::injector::InstanceHandle;
use crate::render3::interfaces::view::{LViewFlags, SlotValue, ViewTreeNode, HEADER_OFFSET};
use crate::render3::node_manipulation::{destroy_lview, detach_view, insert_view};
use crate::render3::state::ViewRuntime;

/// Resolves the container anchored at declaration index `index` of `view`.
pub fn container_at(rt: &ViewRuntime, view: LViewId, index: usize) -> LContainerId {
    match rt.arena.view(view).slots[HEADER_OFFSET + index] {
        SlotValue::Container(container) => container,
        ref other => throw_error(&format!("expected a container at {index}, found {other:?}")),
    }
}

/// Instantiates the template declared at `container_index` of
/// `declaration_view` and runs its creation pass. The view is not inserted
/// anywhere yet; its nodes attach when [`insert`] places it.
pub fn create_embedded_view(
    rt: &mut ViewRuntime,
    declaration_view: LViewId,
    container_index: usize,
    context: InstanceHandle,
) -> Result<LViewId> {
    let declaration_container = container_at(rt, declaration_view, container_index);
    let (embedded_tview, t_host, renderer, sanitizer, injector) = {
        let lview = rt.arena.view(declaration_view);
        let tview = rt.arena.tview(lview.tview);
        let tnode = tview.node(HEADER_OFFSET + container_index);
        let embedded_tview = tnode
            .tview
            .unwrap_or_else(|| throw_error("container node declares no template"));
        (
            embedded_tview,
            rt.arena.tview(embedded_tview).decl_tnode,
            lview.renderer.clone(),
            lview.sanitizer,
            lview.injector.clone(),
        )
    };

    let embedded = create_lview(
        rt,
        Some(ViewTreeNode::View(declaration_view)),
        Some(declaration_view),
        embedded_tview,
        Some(context),
        LViewFlags::CHECK_ALWAYS,
        None,
        t_host,
        renderer,
        sanitizer,
        injector,
        None,
    );
    rt.arena.view_mut(embedded).declaration_lcontainer = Some(declaration_container);

    render_view(rt, embedded)?;
    Ok(embedded)
}

/// Inserts `view` into `container` at `index`. Inserting into a container
/// declared in another view transplants it.
pub fn insert(rt: &mut ViewRuntime, container: LContainerId, view: LViewId, index: usize) {
    insert_view(rt, container, view, index);
}

/// Detaches the view at `index` without destroying it; it can be reinserted
/// elsewhere.
pub fn detach(rt: &mut ViewRuntime, container: LContainerId, index: usize) -> Option<LViewId> {
    detach_view(rt, container, index)
}

/// Detaches and destroys the view at `index`.
pub fn remove(rt: &mut ViewRuntime, container: LContainerId, index: usize) {
    if let Some(view) = detach_view(rt, container, index) {
        destroy_lview(rt, view);
    }
}

/// Moves a view between (or within) containers, preserving its state.
pub fn move_view(
    rt: &mut ViewRuntime,
    from: LContainerId,
    from_index: usize,
    to: LContainerId,
    to_index: usize,
) {
    if let Some(view) = detach_view(rt, from, from_index) {
        insert_view(rt, to, view, to_index);
    }
}

/// Number of views currently inserted in the container.
pub fn len(rt: &ViewRuntime, container: LContainerId) -> usize {
    rt.arena.container(container).view_count()
}
