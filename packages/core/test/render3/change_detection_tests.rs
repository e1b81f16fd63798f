//! Change Detection Tests
//!
//! OnPush refresh decisions, dirty marking, check-no-changes, error
//! propagation and renderer-factory bracketing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use angular_core::render3::bindings::Value;
use angular_core::render3::change_detection::{
    detach_from_change_detection, detect_changes, mark_view_dirty, reattach_to_change_detection,
};
use angular_core::render3::component::render_component;
use angular_core::render3::instructions::{element, property};
use angular_core::render3::interfaces::definition::{
    ChangeDetectionStrategy, DirectiveDef, DirectiveDefListOrFactory, RenderFlags,
    TConstantsOrFactory,
};
use angular_core::render3::interfaces::injector::{instance_handle, InstanceHandle};
use angular_core::render3::interfaces::node::TAttributes;
use angular_core::render3::interfaces::view::{LViewFlags, SlotValue, HEADER_OFFSET};
use angular_core::render3::node_selector_matcher::CssSelector;
use angular_core::{ErrorHandler, Result, RuntimeError, RuntimeErrorCode, ViewRuntime};

#[path = "util.rs"]
mod util;
use util::test_runtime;

struct OnPushChild {
    value: Value,
    update_count: Cell<usize>,
}

fn on_push_child_template(
    _rt: &mut ViewRuntime,
    rf: RenderFlags,
    ctx: &InstanceHandle,
) -> Result<()> {
    if rf.contains(RenderFlags::UPDATE) {
        let ctx = ctx.borrow();
        let child = ctx.downcast_ref::<OnPushChild>().unwrap();
        child.update_count.set(child.update_count.get() + 1);
    }
    Ok(())
}

fn on_push_child_set_input(instance: &mut dyn std::any::Any, name: &str, value: &Value) {
    let child = instance.downcast_mut::<OnPushChild>().unwrap();
    if name == "value" {
        child.value = value.clone();
    }
}

fn on_push_child_def() -> Rc<DirectiveDef> {
    let mut def = DirectiveDef::component::<OnPushChild>(
        "OnPushChild",
        CssSelector::parse("on-push-child").unwrap(),
        || {
            instance_handle(OnPushChild {
                value: Value::Null,
                update_count: Cell::new(0),
            })
        },
        on_push_child_template,
        0,
        0,
    );
    let component = def.component.as_mut().unwrap();
    component.change_detection = ChangeDetectionStrategy::OnPush;
    def.inputs.insert("value".to_string(), "value".to_string());
    def.set_input = Some(on_push_child_set_input);
    Rc::new(def)
}

struct Parent {
    value: Value,
}

fn parent_template(rt: &mut ViewRuntime, rf: RenderFlags, ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        element(rt, 0, "on-push-child", Some(0), None)?;
    }
    if rf.contains(RenderFlags::UPDATE) {
        let value = {
            let ctx = ctx.borrow();
            ctx.downcast_ref::<Parent>().unwrap().value.clone()
        };
        property(rt, "value", &value, None)?;
    }
    Ok(())
}

fn parent_def() -> Rc<DirectiveDef> {
    let mut def = DirectiveDef::component::<Parent>(
        "Parent",
        CssSelector::parse("parent-comp").unwrap(),
        || {
            instance_handle(Parent {
                value: Value::from(0i64),
            })
        },
        parent_template,
        1,
        1,
    );
    let component = def.component.as_mut().unwrap();
    component.directive_defs = Some(DirectiveDefListOrFactory::List(vec![on_push_child_def()]));
    component.consts = Some(TConstantsOrFactory::List(vec![TAttributes {
        bindings: vec!["value".to_string()],
        ..Default::default()
    }]));
    Rc::new(def)
}

fn child_view_and_counter(
    rt: &ViewRuntime,
    parent_view: angular_core::render3::arena::LViewId,
) -> (angular_core::render3::arena::LViewId, usize) {
    let child_view = match rt.arena.view(parent_view).slots[HEADER_OFFSET] {
        SlotValue::View(child) => child,
        ref other => panic!("expected child view, found {other:?}"),
    };
    let count = {
        let context = rt.arena.view(child_view).context.clone().unwrap();
        let borrowed = context.borrow();
        borrowed
            .downcast_ref::<OnPushChild>()
            .unwrap()
            .update_count
            .get()
    };
    (child_view, count)
}

#[test]
fn should_skip_clean_on_push_child() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(&mut rt, parent_def(), "app-host").unwrap();

    // First tick: the child is born dirty (and receives its first input), so
    // it refreshes once.
    detect_changes(&mut rt, comp.root_view).unwrap();
    let (child_view, count) = child_view_and_counter(&rt, comp.component_view);
    assert_eq!(count, 1);
    assert!(!rt.arena.view(child_view).flags.contains(LViewFlags::DIRTY));

    // Nothing changed: the child is not visited at all.
    detect_changes(&mut rt, comp.root_view).unwrap();
    let (_, count) = child_view_and_counter(&rt, comp.component_view);
    assert_eq!(count, 1);
}

#[test]
fn should_refresh_on_push_child_after_input_change() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(&mut rt, parent_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    comp.instance
        .borrow_mut()
        .downcast_mut::<Parent>()
        .unwrap()
        .value = Value::from(1i64);
    detect_changes(&mut rt, comp.root_view).unwrap();

    let (child_view, count) = child_view_and_counter(&rt, comp.component_view);
    assert_eq!(count, 2);
    let context = rt.arena.view(child_view).context.clone().unwrap();
    let borrowed = context.borrow();
    assert_eq!(
        borrowed.downcast_ref::<OnPushChild>().unwrap().value,
        Value::from(1i64)
    );
}

#[test]
fn should_refresh_on_push_child_after_mark_view_dirty() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(&mut rt, parent_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let (child_view, _) = child_view_and_counter(&rt, comp.component_view);
    let root = mark_view_dirty(&mut rt, child_view).unwrap();
    assert_eq!(root, comp.root_view);
    assert!(rt.arena.view(child_view).flags.contains(LViewFlags::DIRTY));

    detect_changes(&mut rt, comp.root_view).unwrap();
    let (child_view, count) = child_view_and_counter(&rt, comp.component_view);
    assert_eq!(count, 2);
    assert!(!rt.arena.view(child_view).flags.contains(LViewFlags::DIRTY));
}

#[test]
fn should_skip_detached_view_until_reattached() {
    let (mut rt, _, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(&mut rt, parent_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();
    let (child_view, count) = child_view_and_counter(&rt, comp.component_view);
    assert_eq!(count, 1);

    // Detached views are skipped even when marked dirty.
    detach_from_change_detection(&mut rt, child_view);
    mark_view_dirty(&mut rt, child_view);
    detect_changes(&mut rt, comp.root_view).unwrap();
    let (child_view, count) = child_view_and_counter(&rt, comp.component_view);
    assert_eq!(count, 1);

    reattach_to_change_detection(&mut rt, child_view);
    detect_changes(&mut rt, comp.root_view).unwrap();
    let (_, count) = child_view_and_counter(&rt, comp.component_view);
    assert_eq!(count, 2);
}

struct Unstable {
    counter: Cell<i64>,
}

fn unstable_template(rt: &mut ViewRuntime, rf: RenderFlags, ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        element(rt, 0, "div", None, None)?;
    }
    if rf.contains(RenderFlags::UPDATE) {
        let next = {
            let ctx = ctx.borrow();
            let unstable = ctx.downcast_ref::<Unstable>().unwrap();
            let next = unstable.counter.get() + 1;
            unstable.counter.set(next);
            next
        };
        property(rt, "id", &Value::Int(next), None)?;
    }
    Ok(())
}

#[test]
fn should_raise_expression_changed_in_check_no_changes_mode() {
    let def = Rc::new(DirectiveDef::component::<Unstable>(
        "Unstable",
        CssSelector::parse("unstable-comp").unwrap(),
        || instance_handle(Unstable { counter: Cell::new(0) }),
        unstable_template,
        1,
        1,
    ));
    let (mut rt, _, factory) = test_runtime();
    let comp = render_component(&mut rt, def, "app-host").unwrap();

    let err = detect_changes(&mut rt, comp.root_view).unwrap_err();
    assert_eq!(err.code, RuntimeErrorCode::ExpressionChangedAfterChecked);
    assert!(err.message.contains("Previous value"));
    // The factory bracket closes on the error path too.
    assert_eq!(factory.begin_count.get(), 1);
    assert_eq!(factory.end_count.get(), 1);
}

struct CapturingHandler {
    seen: RefCell<Vec<RuntimeErrorCode>>,
}

impl ErrorHandler for CapturingHandler {
    fn handle_error(&self, error: &RuntimeError) {
        self.seen.borrow_mut().push(error.code);
    }
}

struct Failing;

fn failing_template(_rt: &mut ViewRuntime, rf: RenderFlags, _ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::UPDATE) {
        return Err(RuntimeError::user("template blew up"));
    }
    Ok(())
}

#[test]
fn should_notify_error_handler_and_still_raise() {
    let def = Rc::new(DirectiveDef::component::<Failing>(
        "Failing",
        CssSelector::parse("failing-comp").unwrap(),
        || instance_handle(Failing),
        failing_template,
        0,
        0,
    ));
    let (mut rt, _, _) = test_runtime();
    let handler = Rc::new(CapturingHandler {
        seen: RefCell::new(Vec::new()),
    });
    rt.error_handler = Some(handler.clone());
    let comp = render_component(&mut rt, def, "app-host").unwrap();

    let err = detect_changes(&mut rt, comp.root_view).unwrap_err();
    assert_eq!(err.code, RuntimeErrorCode::UserCode);
    assert_eq!(&*handler.seen.borrow(), &vec![RuntimeErrorCode::UserCode]);

    // The frame stack unwound cleanly; the next tick runs.
    let err = detect_changes(&mut rt, comp.root_view).unwrap_err();
    assert_eq!(err.code, RuntimeErrorCode::UserCode);
}

thread_local! {
    static FAIL_FIRST_CREATE: Cell<bool> = const { Cell::new(false) };
}

struct FlakyComp;

fn flaky_template(rt: &mut ViewRuntime, rf: RenderFlags, _ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        if FAIL_FIRST_CREATE.with(|flag| flag.replace(false)) {
            return Err(RuntimeError::user("first create failed"));
        }
        element(rt, 0, "div", None, None)?;
    }
    Ok(())
}

#[test]
fn should_poison_tview_on_first_create_failure_and_rebuild() {
    let def = Rc::new(DirectiveDef::component::<FlakyComp>(
        "FlakyComp",
        CssSelector::parse("flaky-comp").unwrap(),
        || instance_handle(FlakyComp),
        flaky_template,
        1,
        0,
    ));
    let (mut rt, _, _) = test_runtime();

    FAIL_FIRST_CREATE.with(|flag| flag.set(true));
    let err = render_component(&mut rt, def.clone(), "app-host").unwrap_err();
    assert_eq!(err.code, RuntimeErrorCode::UserCode);

    let poisoned = def.component.as_ref().unwrap().tview.get().unwrap();
    {
        let tview = rt.arena.tview(poisoned);
        assert!(tview.incomplete_first_pass);
        assert!(!tview.first_create_pass);
    }

    // A fresh bootstrap builds a fresh shape and succeeds.
    let comp = render_component(&mut rt, def.clone(), "app-host").unwrap();
    let rebuilt = def.component.as_ref().unwrap().tview.get().unwrap();
    assert_ne!(poisoned, rebuilt);
    detect_changes(&mut rt, comp.root_view).unwrap();
}

#[test]
fn should_perform_no_work_on_back_to_back_refreshes() {
    let (mut rt, renderer, _) = test_runtime();
    rt.dev_mode = false;
    let comp = render_component(&mut rt, parent_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    renderer.take_calls();
    detect_changes(&mut rt, comp.root_view).unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();
    assert!(renderer.take_calls().is_empty());
}
