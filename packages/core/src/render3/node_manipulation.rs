//! Node Manipulation
//!
//! Corresponds to packages/core/src/render3/node_manipulation.ts
//!
//! View-tree maintenance (the child chain every refresh walks), container
//! insertion/detachment with transplant bookkeeping, and view destruction.

use crate::render3::arena::{LContainerId, LViewId};
use crate::render3::assert::throw_error;
use crate::render3::interfaces::renderer::RNode;
use crate::render3::interfaces::view::{LViewFlags, SlotValue, ViewTreeNode};
use crate::render3::state::ViewRuntime;

/// Appends a view or container to the parent's child chain.
///
/// The chain records order of first attachment, not creation order: a
/// container attached late is visited late by change detection even if its
/// node was declared early. Kept as-is from the upstream.
pub fn add_to_view_tree(rt: &mut ViewRuntime, parent: LViewId, node: ViewTreeNode) {
    let tail = rt.arena.view(parent).child_tail;
    match tail {
        Some(ViewTreeNode::View(tail_view)) => {
            rt.arena.view_mut(tail_view).next = Some(node);
        }
        Some(ViewTreeNode::Container(tail_container)) => {
            rt.arena.container_mut(tail_container).next = Some(node);
        }
        None => {
            rt.arena.view_mut(parent).child_head = Some(node);
        }
    }
    rt.arena.view_mut(parent).child_tail = Some(node);
}

/// Child containers of a view, in child-chain order.
pub fn child_containers(rt: &ViewRuntime, view: LViewId) -> Vec<LContainerId> {
    let mut containers = Vec::new();
    let mut cursor = rt.arena.view(view).child_head;
    while let Some(node) = cursor {
        cursor = match node {
            ViewTreeNode::View(child) => rt.arena.view(child).next,
            ViewTreeNode::Container(container) => {
                containers.push(container);
                rt.arena.container(container).next
            }
        };
    }
    containers
}

/// The LView a view or container hangs under, following the mixed
/// view/container parent links.
pub fn parent_lview(rt: &ViewRuntime, view: LViewId) -> Option<LViewId> {
    match rt.arena.view(view).parent {
        Some(ViewTreeNode::View(parent)) => Some(parent),
        Some(ViewTreeNode::Container(container)) => {
            rt.arena.try_container(container).map(|c| c.parent)
        }
        None => None,
    }
}

/// Adjusts the transplanted-view counters from `container` upward. The walk
/// stops at the first level whose count does not transition between zero
/// and non-zero, so updates stay paired and cheap.
pub fn update_transplanted_view_count(
    rt: &mut ViewRuntime,
    container: LContainerId,
    amount: isize,
) {
    debug_assert!(amount == 1 || amount == -1);
    let container_ref = rt.arena.container_mut(container);
    container_ref.transplanted_views_to_refresh =
        (container_ref.transplanted_views_to_refresh as isize + amount) as usize;
    let mut count = container_ref.transplanted_views_to_refresh;
    let mut parent = Some(container_ref.parent);

    while let Some(view) = parent {
        let crossed_zero = (amount == 1 && count == 1) || (amount == -1 && count == 0);
        if !crossed_zero {
            break;
        }
        let lview = rt.arena.view_mut(view);
        lview.transplanted_views_to_refresh =
            (lview.transplanted_views_to_refresh as isize + amount) as usize;
        count = lview.transplanted_views_to_refresh;
        parent = parent_lview(rt, view);
    }
}

/// Inserts an embedded view into a container at `index`. A view inserted
/// into a container other than the one it was declared on becomes
/// transplanted and is remembered by its declaration container.
pub fn insert_view(rt: &mut ViewRuntime, container: LContainerId, view: LViewId, index: usize) {
    let declaration_container = rt.arena.view(view).declaration_lcontainer;
    if let Some(declaration) = declaration_container {
        if declaration != container {
            track_moved_view(rt, declaration, view);
        }
    }

    {
        let container_ref = rt.arena.container_mut(container);
        let index = index.min(container_ref.views.len());
        container_ref.views.insert(index, view);
    }
    {
        let lview = rt.arena.view_mut(view);
        lview.parent = Some(ViewTreeNode::Container(container));
        lview.flags |= LViewFlags::ATTACHED;
    }

    // Native attach: the view's root nodes render before the container
    // anchor.
    let anchor = rt.arena.container(container).native;
    let renderer = rt.arena.view(rt.arena.container(container).parent).renderer.clone();
    if let Some(parent) = renderer.parent_node(anchor) {
        for native in collect_native_nodes(rt, view) {
            renderer.insert_before(parent, native, Some(anchor));
        }
    }
}

fn track_moved_view(rt: &mut ViewRuntime, declaration: LContainerId, view: LViewId) {
    let container = rt.arena.container_mut(declaration);
    container.has_transplanted_views = true;
    if !container.moved_views.contains(&view) {
        container.moved_views.push(view);
    }
}

/// Detaches the view at `index` from the container without destroying it.
/// Returns the detached view.
pub fn detach_view(
    rt: &mut ViewRuntime,
    container: LContainerId,
    index: usize,
) -> Option<LViewId> {
    let view = {
        let container_ref = rt.arena.container_mut(container);
        if index >= container_ref.views.len() {
            return None;
        }
        container_ref.views.remove(index)
    };

    // Undo transplant bookkeeping before the view loses its insertion point.
    let declaration_container = rt.arena.view(view).declaration_lcontainer;
    if let Some(declaration) = declaration_container {
        if declaration != container {
            let declaration_ref = rt.arena.container_mut(declaration);
            declaration_ref.moved_views.retain(|&moved| moved != view);
            if rt
                .arena
                .view(view)
                .flags
                .contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW)
            {
                rt.arena.view_mut(view).flags &= !LViewFlags::REFRESH_TRANSPLANTED_VIEW;
                update_transplanted_view_count(rt, container, -1);
            }
        }
    }

    // Native detach.
    let anchor = rt.arena.container(container).native;
    let renderer = rt.arena.view(rt.arena.container(container).parent).renderer.clone();
    if let Some(parent) = renderer.parent_node(anchor) {
        for native in collect_native_nodes(rt, view) {
            renderer.remove_child(parent, native);
        }
    }

    let lview = rt.arena.view_mut(view);
    lview.flags &= !LViewFlags::ATTACHED;
    lview.next = None;
    Some(view)
}

/// Root-level native nodes of a view, in declaration order, including the
/// contents of nested containers attached at the root.
pub fn collect_native_nodes(rt: &ViewRuntime, view: LViewId) -> Vec<RNode> {
    let mut natives = Vec::new();
    let lview = rt.arena.view(view);
    let tview = rt.arena.tview(lview.tview);
    let mut cursor = tview.first_child;
    while let Some(index) = cursor {
        let tnode = tview.node(index);
        match &lview.slots[index] {
            SlotValue::Node(native) => natives.push(*native),
            SlotValue::View(component_view) => {
                if let Some(host) = rt.arena.view(*component_view).host {
                    natives.push(host);
                }
            }
            SlotValue::Container(container_id) => {
                if let Some(container) = rt.arena.try_container(*container_id) {
                    for &inserted in &container.views {
                        natives.extend(collect_native_nodes(rt, inserted));
                    }
                    natives.push(container.native);
                }
            }
            _ => {}
        }
        cursor = tnode.next;
    }
    natives
}

/// Destroys a view: children first, then destroy hooks, then the cleanup
/// list in LIFO order, then the arena slot. Idempotent.
pub fn destroy_lview(rt: &mut ViewRuntime, view: LViewId) {
    if !rt.arena.is_live_view(view) || rt.arena.view(view).is_destroyed() {
        return;
    }
    {
        let lview = rt.arena.view_mut(view);
        lview.flags &= !LViewFlags::ATTACHED;
        lview.flags |= LViewFlags::DESTROYED;
    }
    tracing::debug!(uid = rt.arena.view(view).uid, "destroying view");

    // Children first, depth-first over the mixed chain.
    let mut cursor = rt.arena.view(view).child_head;
    while let Some(node) = cursor {
        match node {
            ViewTreeNode::View(child) => {
                cursor = rt.arena.view(child).next;
                destroy_lview(rt, child);
            }
            ViewTreeNode::Container(container_id) => {
                cursor = rt.arena.container(container_id).next;
                let views = rt.arena.container(container_id).views.clone();
                for inserted in views {
                    destroy_lview(rt, inserted);
                }
                rt.arena.remove_container(container_id);
            }
        }
    }

    // Destroy hooks run before the per-instance cleanup closures.
    let destroy_hooks = {
        let tview = rt.arena.tview(rt.arena.view(view).tview);
        tview.destroy_hooks.clone()
    };
    if let Some(hooks) = destroy_hooks {
        for (slot, hook) in hooks {
            let instance = match &rt.arena.view(view).slots[slot] {
                SlotValue::Instance(instance) => instance.clone(),
                other => throw_error(&format!("destroy hook target at {slot} is {other:?}")),
            };
            // Destroy-hook failures must not keep the rest of the teardown
            // from running.
            let mut instance_ref = instance.borrow_mut();
            if let Err(error) = hook(&mut *instance_ref) {
                tracing::warn!(%error, "error in destroy hook");
            }
        }
    }

    let cleanup = {
        let lview = rt.arena.view_mut(view);
        std::mem::take(&mut lview.cleanup)
    };
    for teardown in cleanup.into_iter().rev() {
        teardown();
    }

    rt.arena.remove_view(view);
}
