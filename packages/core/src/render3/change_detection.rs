//! Change Detection
//!
//! Corresponds to packages/core/src/render3/instructions/change_detection.ts
//! and render.ts
//!
//! The creation pass runs a template once per LView in create mode; the
//! refresh pass re-evaluates bindings and drives lifecycle hooks in the
//! fixed order user code observes. Frame and mode cleanup happens on every
//! exit path so a failed pass leaves the next tick a clean runtime.

use crate::render3::arena::LViewId;
use crate::render3::assert::throw_error;
use crate::render3::errors::Result;
use crate::render3::hooks::{execute_check_hooks, execute_init_and_check_hooks, HookPhase};
use crate::render3::instructions::shared::process_host_binding_op_codes;
use crate::render3::interfaces::definition::RenderFlags;
use crate::render3::interfaces::injector::InstanceHandle;
use crate::render3::interfaces::view::{
    InitPhaseState, LViewFlags, SlotValue, ViewTreeNode, HEADER_OFFSET,
};
use crate::render3::node_manipulation::{
    child_containers, parent_lview, update_transplanted_view_count,
};
use crate::render3::state::ViewRuntime;

/// Runs the creation pass for `view`: view query, template, first-pass
/// flip, static content queries, static view query, then child component
/// views. Creation mode is cleared on every exit path; a failure on
/// the first create pass poisons the TView.
pub fn render_view(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    if rt.dev_mode && !rt.arena.view(view).is_creation_mode() {
        throw_error("render_view on a view that already left creation mode");
    }
    rt.enter_view(view);
    let result = render_view_inner(rt, view);
    rt.arena.view_mut(view).flags &= !LViewFlags::CREATION_MODE;
    rt.leave_view();
    result
}

fn render_view_inner(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    let tview_id = rt.arena.view(view).tview;
    let first_create_pass = rt.arena.tview(tview_id).first_create_pass;
    tracing::debug!(uid = rt.arena.view(view).uid, first_create_pass, "render view");

    let result: Result<()> = (|| {
        let (view_query, template, static_content_queries, static_view_queries) = {
            let tview = rt.arena.tview(tview_id);
            (
                tview.view_query,
                tview.template,
                tview.static_content_queries,
                tview.static_view_queries,
            )
        };

        if let Some(view_query) = view_query {
            let context = view_context(rt, view);
            view_query(rt, RenderFlags::CREATE, &context)?;
        }

        if let Some(template) = template {
            execute_template(rt, view, RenderFlags::CREATE, template)?;
        }

        // The first create pass concluded; from here on the shape is shared.
        if first_create_pass {
            rt.arena.tview_mut(tview_id).first_create_pass = false;
        }

        if static_content_queries {
            execute_content_queries(rt, view, RenderFlags::CREATE)?;
        }
        if static_view_queries {
            if let Some(view_query) = view_query {
                let context = view_context(rt, view);
                view_query(rt, RenderFlags::UPDATE, &context)?;
            }
        }

        // Child component views render after their host view's nodes exist.
        let components = rt.arena.tview(tview_id).components.clone();
        if let Some(components) = components {
            for host_index in components {
                let child = component_view_at(rt, view, host_index);
                render_view(rt, child)?;
            }
        }
        Ok(())
    })();

    if result.is_err() && first_create_pass {
        let tview = rt.arena.tview_mut(tview_id);
        tview.first_create_pass = false;
        tview.incomplete_first_pass = true;
    }
    result
}

/// Runs the refresh pass for `view`. The step order below is part of the
/// public contract; user code observes it. A destroyed view is a no-op.
pub fn refresh_view(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    if !rt.arena.is_live_view(view) || rt.arena.view(view).is_destroyed() {
        return Ok(());
    }
    if rt.dev_mode && rt.arena.view(view).is_creation_mode() {
        throw_error("refresh_view on a view still in creation mode");
    }
    rt.enter_view(view);
    let result = refresh_view_inner(rt, view);
    rt.leave_view();
    result
}

fn refresh_view_inner(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    let tview_id = rt.arena.view(view).tview;
    let check_no_changes = rt.is_in_check_no_changes_mode();
    let first_update_pass = rt.arena.tview(tview_id).first_update_pass;

    let (template, has_view_query) = {
        let tview = rt.arena.tview(tview_id);
        (tview.template, tview.view_query.is_some())
    };

    // 2. Evaluate bindings.
    if let Some(template) = template {
        execute_template(rt, view, RenderFlags::UPDATE, template)?;
    }

    // 3. Pre-order hooks; suppressed entirely while checking for changes.
    let init_incomplete = rt.arena.view(view).init_phase != InitPhaseState::InitPhaseCompleted;
    if !check_no_changes {
        if init_incomplete {
            execute_init_and_check_hooks(rt, view, HookPhase::PreOrder)?;
        } else {
            execute_check_hooks(rt, view, HookPhase::PreOrder)?;
        }
    }

    // 4. Flag transplanted views declared here for refresh from their
    // insertion point.
    mark_transplanted_views_for_refresh(rt, view);

    // 5. Embedded views refresh with their insertion view.
    refresh_embedded_views(rt, view)?;

    // 6. Content queries materialize before content hooks observe them.
    execute_content_queries(rt, view, RenderFlags::UPDATE)?;

    // 7. Content hooks.
    if !check_no_changes {
        if init_incomplete {
            execute_init_and_check_hooks(rt, view, HookPhase::Content)?;
        } else {
            execute_check_hooks(rt, view, HookPhase::Content)?;
        }
    }

    // 8. Host bindings run before child refresh: their outputs feed child
    // inputs.
    process_host_binding_op_codes(rt)?;

    // 9. Child component views.
    let components = rt.arena.tview(tview_id).components.clone();
    if let Some(components) = components {
        for host_index in components {
            refresh_component(rt, view, host_index)?;
        }
    }

    // 10. View queries run after child refresh: a template declared here may
    // have been inserted into a child.
    if has_view_query {
        let view_query = rt.arena.tview(tview_id).view_query;
        if let Some(view_query) = view_query {
            let context = view_context(rt, view);
            view_query(rt, RenderFlags::UPDATE, &context)?;
        }
    }

    // 11. View hooks.
    if !check_no_changes {
        if init_incomplete {
            execute_init_and_check_hooks(rt, view, HookPhase::View)?;
        } else {
            execute_check_hooks(rt, view, HookPhase::View)?;
        }
    }

    // 12. Deliberately not in a finally: styling instructions must never
    // observe a stale first-update flag after a failed pass.
    if first_update_pass {
        rt.arena.tview_mut(tview_id).first_update_pass = false;
    }

    // 13. Dirty state survives a check-no-changes pass by design: a view
    // marked dirty from afterViewInit must stay dirty for the next tick.
    if !check_no_changes {
        let lview = rt.arena.view_mut(view);
        lview.flags &= !(LViewFlags::DIRTY | LViewFlags::FIRST_LVIEW_PASS);
    }

    // 14. This view was refreshed as a transplanted view; settle the paired
    // counter on its insertion container.
    if rt
        .arena
        .view(view)
        .flags
        .contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW)
    {
        rt.arena.view_mut(view).flags &= !LViewFlags::REFRESH_TRANSPLANTED_VIEW;
        if let Some(ViewTreeNode::Container(insertion)) = rt.arena.view(view).parent {
            update_transplanted_view_count(rt, insertion, -1);
        }
    }
    Ok(())
}

/// Invokes the compiled template with the view's context. The selected index
/// is scoped to the invocation and restored on every exit path.
fn execute_template(
    rt: &mut ViewRuntime,
    view: LViewId,
    rf: RenderFlags,
    template: crate::render3::interfaces::definition::ComponentTemplate,
) -> Result<()> {
    let context = view_context(rt, view);
    let previous_selected = rt.selected_index();
    rt.set_selected_index(if rf.contains(RenderFlags::UPDATE) {
        HEADER_OFFSET as isize
    } else {
        -1
    });
    let result = template(rt, rf, &context);
    rt.set_selected_index(previous_selected);
    result
}

fn execute_content_queries(rt: &mut ViewRuntime, view: LViewId, rf: RenderFlags) -> Result<()> {
    let queries = {
        let tview = rt.arena.tview(rt.arena.view(view).tview);
        tview.content_queries.clone()
    };
    if let Some(queries) = queries {
        for (query_fn, directive_slot) in queries {
            query_fn(rt, rf, directive_slot)?;
        }
    }
    Ok(())
}

fn view_context(rt: &ViewRuntime, view: LViewId) -> InstanceHandle {
    rt.arena
        .view(view)
        .context
        .clone()
        .unwrap_or_else(|| throw_error("view has no context"))
}

fn component_view_at(rt: &ViewRuntime, view: LViewId, host_index: usize) -> LViewId {
    match rt.arena.view(view).slots[host_index] {
        SlotValue::View(child) => child,
        ref other => throw_error(&format!(
            "expected component view at {host_index}, found {other:?}"
        )),
    }
}

/// Every view declared on a local container but living in a
/// foreign one is flagged, and the foreign (insertion) container's counter
/// goes up, once per flagging.
fn mark_transplanted_views_for_refresh(rt: &mut ViewRuntime, view: LViewId) {
    for container in child_containers(rt, view) {
        if !rt.arena.container(container).has_transplanted_views {
            continue;
        }
        let moved = rt.arena.container(container).moved_views.clone();
        for moved_view in moved {
            if !rt.arena.is_live_view(moved_view) {
                continue;
            }
            let flags = rt.arena.view(moved_view).flags;
            if flags.contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW) {
                continue;
            }
            rt.arena.view_mut(moved_view).flags |= LViewFlags::REFRESH_TRANSPLANTED_VIEW;
            if let Some(ViewTreeNode::Container(insertion)) = rt.arena.view(moved_view).parent {
                update_transplanted_view_count(rt, insertion, 1);
            }
        }
    }
}

/// Embedded views attached to change detection refresh
/// recursively with their insertion view.
fn refresh_embedded_views(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    for container in child_containers(rt, view) {
        let views = rt.arena.container(container).views.clone();
        for embedded in views {
            if rt.arena.is_live_view(embedded) && rt.arena.view(embedded).is_attached() {
                refresh_view(rt, embedded)?;
            }
        }
    }
    Ok(())
}

/// Refresh decision for one child component view.
pub fn refresh_component(rt: &mut ViewRuntime, host_view: LViewId, host_index: usize) -> Result<()> {
    let child = component_view_at(rt, host_view, host_index);
    if !rt.arena.is_live_view(child) {
        return Ok(());
    }
    let (flags, transplanted) = {
        let lview = rt.arena.view(child);
        (lview.flags, lview.transplanted_views_to_refresh)
    };
    if !flags.contains(LViewFlags::ATTACHED) {
        return Ok(());
    }
    if flags.intersects(LViewFlags::CHECK_ALWAYS | LViewFlags::DIRTY) {
        refresh_view(rt, child)
    } else if transplanted > 0 {
        refresh_contains_dirty_view(rt, child)
    } else {
        Ok(())
    }
}

/// Descends only into subtrees that still contain flagged transplanted
/// views, refreshing exactly those and decrementing counters on the way.
fn refresh_contains_dirty_view(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    for container in child_containers(rt, view) {
        let views = rt.arena.container(container).views.clone();
        for embedded in views {
            if !rt.arena.is_live_view(embedded) {
                continue;
            }
            let (flags, transplanted) = {
                let lview = rt.arena.view(embedded);
                (lview.flags, lview.transplanted_views_to_refresh)
            };
            if flags.contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW) {
                refresh_view(rt, embedded)?;
            } else if transplanted > 0 {
                refresh_contains_dirty_view(rt, embedded)?;
            }
        }
    }
    let components = {
        let tview = rt.arena.tview(rt.arena.view(view).tview);
        tview.components.clone()
    };
    if let Some(components) = components {
        for host_index in components {
            let child = component_view_at(rt, view, host_index);
            if rt.arena.view(child).transplanted_views_to_refresh > 0 {
                refresh_contains_dirty_view(rt, child)?;
            }
        }
    }
    Ok(())
}

/// Detaches a view from change detection: it keeps its state and its place
/// in the tree but is skipped by every refresh until reattached.
pub fn detach_from_change_detection(rt: &mut ViewRuntime, view: LViewId) {
    rt.arena.view_mut(view).flags &= !LViewFlags::ATTACHED;
}

/// Reattaches a previously detached view to change detection.
pub fn reattach_to_change_detection(rt: &mut ViewRuntime, view: LViewId) {
    rt.arena.view_mut(view).flags |= LViewFlags::ATTACHED;
}

/// Marks the ancestor chain dirty and returns the root view so the
/// caller can schedule a tick.
pub fn mark_view_dirty(rt: &mut ViewRuntime, view: LViewId) -> Option<LViewId> {
    let mut current = view;
    loop {
        rt.arena.view_mut(current).flags |= LViewFlags::DIRTY;
        match parent_lview(rt, current) {
            Some(parent) => current = parent,
            None => return Some(current),
        }
    }
}

/// Top-level detect-changes entry: renderer-factory bracketing, error-handler
/// notification with re-raise, and the dev-only check-no-changes second pass.
pub fn detect_changes(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    let factory = rt.renderer_factory.clone();
    factory.begin();
    let mut result = refresh_view(rt, view);
    if result.is_ok() && rt.dev_mode {
        result = check_no_changes(rt, view);
    }
    factory.end();
    if let Err(error) = &result {
        if let Some(handler) = rt.error_handler.clone() {
            handler.handle_error(error);
        }
    }
    result
}

/// Dev-only re-refresh with the process-wide flag set. Hooks do not run, dirty
/// flags are not cleared, renderer begin/end are not re-entered; any binding
/// difference raises `ExpressionChangedAfterChecked`.
pub fn check_no_changes(rt: &mut ViewRuntime, view: LViewId) -> Result<()> {
    rt.set_check_no_changes_mode(true);
    let result = refresh_view(rt, view);
    rt.set_check_no_changes_mode(false);
    result
}
