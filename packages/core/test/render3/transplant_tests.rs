//! Transplanted View Tests
//!
//! A template declared in one component and inserted into another keeps
//! refreshing correctly through the flag + paired-counter scheme.

use std::cell::Cell;
use std::rc::Rc;

use angular_core::render3::arena::LViewId;
use angular_core::render3::bindings::Value;
use angular_core::render3::change_detection::{detect_changes, refresh_view};
use angular_core::render3::component::render_component;
use angular_core::render3::instructions::{element, template, text, text_interpolate1};
use angular_core::render3::interfaces::definition::{
    ChangeDetectionStrategy, DirectiveDef, DirectiveDefListOrFactory, RenderFlags,
};
use angular_core::render3::interfaces::injector::{instance_handle, InstanceHandle};
use angular_core::render3::interfaces::view::{LViewFlags, SlotValue, HEADER_OFFSET};
use angular_core::render3::node_selector_matcher::CssSelector;
use angular_core::render3::view_container::{
    container_at, create_embedded_view, detach, insert, move_view, remove,
};
use angular_core::{Result, ViewRuntime};

#[path = "util.rs"]
mod util;
use util::test_runtime;

struct EmbeddedCtx {
    msg: Value,
    update_count: Cell<usize>,
}

fn embedded_template(rt: &mut ViewRuntime, rf: RenderFlags, ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        text(rt, 0, "")?;
    }
    if rf.contains(RenderFlags::UPDATE) {
        let msg = {
            let ctx = ctx.borrow();
            let embedded = ctx.downcast_ref::<EmbeddedCtx>().unwrap();
            embedded.update_count.set(embedded.update_count.get() + 1);
            embedded.msg.clone()
        };
        text_interpolate1(rt, "", &msg, "")?;
    }
    Ok(())
}

struct DeclComp;

fn decl_comp_template(rt: &mut ViewRuntime, rf: RenderFlags, _ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        template(rt, 0, Some(embedded_template), 1, 1, None, None, None)?;
    }
    Ok(())
}

struct InsertComp {
    update_count: Cell<usize>,
}

fn insert_comp_template(
    rt: &mut ViewRuntime,
    rf: RenderFlags,
    ctx: &InstanceHandle,
) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        template(rt, 0, None, 0, 0, None, None, None)?;
    }
    if rf.contains(RenderFlags::UPDATE) {
        let ctx = ctx.borrow();
        let insert_comp = ctx.downcast_ref::<InsertComp>().unwrap();
        insert_comp
            .update_count
            .set(insert_comp.update_count.get() + 1);
    }
    Ok(())
}

struct TransplantParent;

fn transplant_parent_template(
    rt: &mut ViewRuntime,
    rf: RenderFlags,
    _ctx: &InstanceHandle,
) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        element(rt, 0, "decl-comp", None, None)?;
        element(rt, 1, "insert-comp", None, None)?;
    }
    Ok(())
}

fn parent_def(insert_strategy: ChangeDetectionStrategy) -> Rc<DirectiveDef> {
    let decl = Rc::new(DirectiveDef::component::<DeclComp>(
        "DeclComp",
        CssSelector::parse("decl-comp").unwrap(),
        || instance_handle(DeclComp),
        decl_comp_template,
        1,
        0,
    ));
    let mut insert_def = DirectiveDef::component::<InsertComp>(
        "InsertComp",
        CssSelector::parse("insert-comp").unwrap(),
        || {
            instance_handle(InsertComp {
                update_count: Cell::new(0),
            })
        },
        insert_comp_template,
        1,
        0,
    );
    insert_def.component.as_mut().unwrap().change_detection = insert_strategy;

    let mut parent = DirectiveDef::component::<TransplantParent>(
        "TransplantParent",
        CssSelector::parse("transplant-parent").unwrap(),
        || instance_handle(TransplantParent),
        transplant_parent_template,
        2,
        0,
    );
    parent.component.as_mut().unwrap().directive_defs = Some(DirectiveDefListOrFactory::List(
        vec![decl, Rc::new(insert_def)],
    ));
    Rc::new(parent)
}

fn component_view_at(rt: &ViewRuntime, parent: LViewId, index: usize) -> LViewId {
    match rt.arena.view(parent).slots[HEADER_OFFSET + index] {
        SlotValue::View(view) => view,
        ref other => panic!("expected component view, found {other:?}"),
    }
}

fn embedded_count(ctx: &InstanceHandle) -> usize {
    ctx.borrow()
        .downcast_ref::<EmbeddedCtx>()
        .unwrap()
        .update_count
        .get()
}

fn insert_comp_count(rt: &ViewRuntime, view: LViewId) -> usize {
    let context = rt.arena.view(view).context.clone().unwrap();
    let borrowed = context.borrow();
    borrowed
        .downcast_ref::<InsertComp>()
        .unwrap()
        .update_count
        .get()
}

#[test]
fn should_refresh_transplanted_view_with_its_insertion_view() {
    let (mut rt, renderer, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(
        &mut rt,
        parent_def(ChangeDetectionStrategy::Default),
        "app-host",
    )
    .unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let decl_view = component_view_at(&rt, comp.component_view, 0);
    let insert_view_id = component_view_at(&rt, comp.component_view, 1);
    let ctx = instance_handle(EmbeddedCtx {
        msg: Value::from("m1"),
        update_count: Cell::new(0),
    });
    let embedded = create_embedded_view(&mut rt, decl_view, 0, ctx.clone()).unwrap();
    let insertion_container = container_at(&rt, insert_view_id, 0);
    insert(&mut rt, insertion_container, embedded, 0);

    // The declaration container remembers its moved view.
    let declaration_container = container_at(&rt, decl_view, 0);
    assert!(rt.arena.container(declaration_container).has_transplanted_views);
    assert_eq!(rt.arena.container(declaration_container).moved_views.len(), 1);

    renderer.take_calls();
    detect_changes(&mut rt, comp.root_view).unwrap();
    assert_eq!(embedded_count(&ctx), 1);
    let writes = renderer.calls_matching("setValue");
    assert_eq!(writes.len(), 1);
    assert!(writes[0].contains("m1"));

    // Counters are paired: net zero across the tick.
    assert_eq!(
        rt.arena.container(insertion_container).transplanted_views_to_refresh,
        0
    );
    assert_eq!(rt.arena.view(insert_view_id).transplanted_views_to_refresh, 0);
    assert!(!rt
        .arena
        .view(embedded)
        .flags
        .contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW));

    // A declaration-side change flows on the next tick.
    ctx.borrow_mut().downcast_mut::<EmbeddedCtx>().unwrap().msg = Value::from("m2");
    renderer.take_calls();
    detect_changes(&mut rt, comp.root_view).unwrap();
    let writes = renderer.calls_matching("setValue");
    assert_eq!(writes.len(), 1);
    assert!(writes[0].contains("m2"));
}

#[test]
fn should_refresh_transplanted_view_inside_skipped_on_push_host() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(
        &mut rt,
        parent_def(ChangeDetectionStrategy::OnPush),
        "app-host",
    )
    .unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let decl_view = component_view_at(&rt, comp.component_view, 0);
    let insert_view_id = component_view_at(&rt, comp.component_view, 1);
    assert_eq!(insert_comp_count(&rt, insert_view_id), 1);

    let ctx = instance_handle(EmbeddedCtx {
        msg: Value::from("m1"),
        update_count: Cell::new(0),
    });
    let embedded = create_embedded_view(&mut rt, decl_view, 0, ctx.clone()).unwrap();
    let insertion_container = container_at(&rt, insert_view_id, 0);
    insert(&mut rt, insertion_container, embedded, 0);

    detect_changes(&mut rt, comp.root_view).unwrap();

    // The embedded view refreshed even though its OnPush host was skipped.
    assert_eq!(embedded_count(&ctx), 1);
    assert_eq!(insert_comp_count(&rt, insert_view_id), 1);
    assert_eq!(
        rt.arena.container(insertion_container).transplanted_views_to_refresh,
        0
    );
    assert_eq!(rt.arena.view(insert_view_id).transplanted_views_to_refresh, 0);
}

#[test]
fn should_pair_counter_increment_with_detach() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(
        &mut rt,
        parent_def(ChangeDetectionStrategy::OnPush),
        "app-host",
    )
    .unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let decl_view = component_view_at(&rt, comp.component_view, 0);
    let insert_view_id = component_view_at(&rt, comp.component_view, 1);
    let ctx = instance_handle(EmbeddedCtx {
        msg: Value::from("m1"),
        update_count: Cell::new(0),
    });
    let embedded = create_embedded_view(&mut rt, decl_view, 0, ctx).unwrap();
    let insertion_container = container_at(&rt, insert_view_id, 0);
    insert(&mut rt, insertion_container, embedded, 0);

    // Refreshing only the declaration view performs the marking half.
    refresh_view(&mut rt, decl_view).unwrap();
    assert!(rt
        .arena
        .view(embedded)
        .flags
        .contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW));
    assert_eq!(
        rt.arena.container(insertion_container).transplanted_views_to_refresh,
        1
    );
    assert_eq!(rt.arena.view(insert_view_id).transplanted_views_to_refresh, 1);

    // Detaching performs the paired decrement.
    let detached = detach(&mut rt, insertion_container, 0).unwrap();
    assert_eq!(detached, embedded);
    assert!(!rt
        .arena
        .view(embedded)
        .flags
        .contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW));
    assert_eq!(
        rt.arena.container(insertion_container).transplanted_views_to_refresh,
        0
    );
    assert_eq!(rt.arena.view(insert_view_id).transplanted_views_to_refresh, 0);
}

#[test]
fn should_transplant_when_moved_out_of_its_declaration_container() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(
        &mut rt,
        parent_def(ChangeDetectionStrategy::Default),
        "app-host",
    )
    .unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let decl_view = component_view_at(&rt, comp.component_view, 0);
    let insert_view_id = component_view_at(&rt, comp.component_view, 1);
    let ctx = instance_handle(EmbeddedCtx {
        msg: Value::from("mv"),
        update_count: Cell::new(0),
    });
    let embedded = create_embedded_view(&mut rt, decl_view, 0, ctx.clone()).unwrap();
    let declaration_container = container_at(&rt, decl_view, 0);
    let insertion_container = container_at(&rt, insert_view_id, 0);

    insert(&mut rt, declaration_container, embedded, 0);
    assert!(!rt.arena.container(declaration_container).has_transplanted_views);

    move_view(&mut rt, declaration_container, 0, insertion_container, 0);
    assert!(rt.arena.container(declaration_container).has_transplanted_views);
    assert_eq!(
        rt.arena.container(declaration_container).moved_views,
        vec![embedded]
    );
    assert_eq!(rt.arena.container(insertion_container).views, vec![embedded]);

    detect_changes(&mut rt, comp.root_view).unwrap();
    assert_eq!(embedded_count(&ctx), 1);
}

#[test]
fn should_destroy_view_on_remove() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(
        &mut rt,
        parent_def(ChangeDetectionStrategy::Default),
        "app-host",
    )
    .unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let decl_view = component_view_at(&rt, comp.component_view, 0);
    let ctx = instance_handle(EmbeddedCtx {
        msg: Value::from("gone"),
        update_count: Cell::new(0),
    });
    let embedded = create_embedded_view(&mut rt, decl_view, 0, ctx).unwrap();
    let declaration_container = container_at(&rt, decl_view, 0);
    insert(&mut rt, declaration_container, embedded, 0);

    remove(&mut rt, declaration_container, 0);
    assert!(rt.arena.try_view(embedded).is_none());
    assert_eq!(rt.arena.container(declaration_container).view_count(), 0);

    // The freed slot stays dead for change detection.
    detect_changes(&mut rt, comp.root_view).unwrap();
}

#[test]
fn should_not_track_view_inserted_into_its_declaration_container() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(
        &mut rt,
        parent_def(ChangeDetectionStrategy::Default),
        "app-host",
    )
    .unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let decl_view = component_view_at(&rt, comp.component_view, 0);
    let ctx = instance_handle(EmbeddedCtx {
        msg: Value::from("home"),
        update_count: Cell::new(0),
    });
    let embedded = create_embedded_view(&mut rt, decl_view, 0, ctx.clone()).unwrap();
    let declaration_container = container_at(&rt, decl_view, 0);
    insert(&mut rt, declaration_container, embedded, 0);

    assert!(!rt.arena.container(declaration_container).has_transplanted_views);
    assert!(rt.arena.container(declaration_container).moved_views.is_empty());

    detect_changes(&mut rt, comp.root_view).unwrap();
    assert_eq!(embedded_count(&ctx), 1);
    assert!(!rt
        .arena
        .view(embedded)
        .flags
        .contains(LViewFlags::REFRESH_TRANSPLANTED_VIEW));
}
