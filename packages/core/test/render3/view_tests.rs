//! View Tests
//!
//! Creation + refresh behavior of simple component views: binding slots,
//! renderer traffic, and the dual-buffer invariants.

use std::rc::Rc;

use angular_core::render3::bindings::Value;
use angular_core::render3::change_detection::{detect_changes, refresh_view};
use angular_core::render3::component::render_component;
use angular_core::render3::instructions::{
    advance, element, element_container_end, element_container_start, element_end, element_start,
    property, text, text_interpolate1, text_interpolate2,
};
use angular_core::render3::interfaces::definition::{DirectiveDef, RenderFlags};
use angular_core::render3::interfaces::injector::{instance_handle, InstanceHandle};
use angular_core::render3::interfaces::view::{LViewFlags, SlotValue, TData, HEADER_OFFSET};
use angular_core::render3::node_selector_matcher::CssSelector;
use angular_core::{Result, ViewRuntime};

#[path = "util.rs"]
mod util;
use util::test_runtime;

struct PropComp {
    x: Value,
}

fn prop_comp_template(rt: &mut ViewRuntime, rf: RenderFlags, ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        element(rt, 0, "div", None, None)?;
    }
    if rf.contains(RenderFlags::UPDATE) {
        let x = {
            let ctx = ctx.borrow();
            ctx.downcast_ref::<PropComp>().unwrap().x.clone()
        };
        property(rt, "id", &x, None)?;
    }
    Ok(())
}

fn prop_comp_def() -> Rc<DirectiveDef> {
    Rc::new(DirectiveDef::component::<PropComp>(
        "PropComp",
        CssSelector::parse("prop-comp").unwrap(),
        || instance_handle(PropComp { x: Value::from("a") }),
        prop_comp_template,
        1,
        1,
    ))
}

#[test]
fn should_write_property_once_per_change() {
    let (mut rt, renderer, _) = test_runtime();
    let comp = render_component(&mut rt, prop_comp_def(), "app-host").unwrap();
    renderer.take_calls();

    // First refresh writes the initial value exactly once (the dev-mode
    // check-no-changes second pass must not write again).
    detect_changes(&mut rt, comp.root_view).unwrap();
    let writes = renderer.calls_matching("setProperty");
    assert_eq!(writes.len(), 1);
    assert!(writes[0].contains("id, \"a\""));

    // Unchanged context: no renderer traffic at all.
    renderer.take_calls();
    detect_changes(&mut rt, comp.root_view).unwrap();
    assert!(renderer.calls_matching("setProperty").is_empty());

    // Mutation shows up as exactly one write of the new value.
    comp.instance
        .borrow_mut()
        .downcast_mut::<PropComp>()
        .unwrap()
        .x = Value::from("b");
    detect_changes(&mut rt, comp.root_view).unwrap();
    let writes = renderer.calls_matching("setProperty");
    assert_eq!(writes.len(), 1);
    assert!(writes[0].contains("id, \"b\""));
}

#[test]
fn should_keep_binding_slot_current() {
    let (mut rt, _, _) = test_runtime();
    let comp = render_component(&mut rt, prop_comp_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let lview = rt.arena.view(comp.component_view);
    let binding_start = rt.arena.tview(lview.tview).binding_start_index;
    assert_eq!(
        lview.slots[binding_start],
        SlotValue::Value(Value::from("a"))
    );
}

#[test]
fn should_store_binding_metadata_on_first_update_pass_only() {
    let (mut rt, _, _) = test_runtime();
    let comp = render_component(&mut rt, prop_comp_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    let tview = rt.arena.tview(rt.arena.view(comp.component_view).tview);
    assert!(!tview.first_update_pass);
    match &tview.data[tview.binding_start_index] {
        TData::BindingMetadata(meta) => assert_eq!(meta, "id"),
        other => panic!("expected binding metadata, found {other:?}"),
    }
}

#[test]
fn should_keep_data_blueprint_and_slots_in_lockstep() {
    let (mut rt, _, _) = test_runtime();
    let comp = render_component(&mut rt, prop_comp_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    for view in [comp.root_view, comp.component_view] {
        let lview = rt.arena.view(view);
        let tview = rt.arena.tview(lview.tview);
        assert_eq!(tview.data.len(), tview.blueprint.len());
        assert_eq!(tview.data.len(), lview.slots.len());
    }
}

struct EmptyComp;

fn empty_template(_rt: &mut ViewRuntime, _rf: RenderFlags, _ctx: &InstanceHandle) -> Result<()> {
    Ok(())
}

#[test]
fn should_refresh_zero_decl_zero_var_view_without_touching_slots() {
    let (mut rt, renderer, _) = test_runtime();
    let def = Rc::new(DirectiveDef::component::<EmptyComp>(
        "EmptyComp",
        CssSelector::parse("empty-comp").unwrap(),
        || instance_handle(EmptyComp),
        empty_template,
        0,
        0,
    ));
    let comp = render_component(&mut rt, def, "app-host").unwrap();
    renderer.take_calls();

    detect_changes(&mut rt, comp.root_view).unwrap();
    assert!(renderer.take_calls().is_empty());
    assert_eq!(
        rt.arena.view(comp.component_view).slots.len(),
        HEADER_OFFSET
    );
}

#[test]
fn should_skip_refresh_of_destroyed_view() {
    let (mut rt, renderer, _) = test_runtime();
    let comp = render_component(&mut rt, prop_comp_def(), "app-host").unwrap();
    detect_changes(&mut rt, comp.root_view).unwrap();

    rt.arena.view_mut(comp.component_view).flags |= LViewFlags::DESTROYED;
    comp.instance
        .borrow_mut()
        .downcast_mut::<PropComp>()
        .unwrap()
        .x = Value::from("changed");
    renderer.take_calls();
    refresh_view(&mut rt, comp.component_view).unwrap();
    assert!(renderer.take_calls().is_empty());
}

struct TextComp {
    name: Value,
}

fn text_comp_template(rt: &mut ViewRuntime, rf: RenderFlags, ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        element_start(rt, 0, "span", None, None)?;
        text(rt, 1, "")?;
        element_end(rt);
    }
    if rf.contains(RenderFlags::UPDATE) {
        let name = {
            let ctx = ctx.borrow();
            ctx.downcast_ref::<TextComp>().unwrap().name.clone()
        };
        advance(rt, 1);
        text_interpolate1(rt, "Hello, ", &name, "!")?;
    }
    Ok(())
}

struct PairComp {
    first: Value,
    last: Value,
}

fn pair_comp_template(rt: &mut ViewRuntime, rf: RenderFlags, ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        text(rt, 0, "")?;
    }
    if rf.contains(RenderFlags::UPDATE) {
        let (first, last) = {
            let ctx = ctx.borrow();
            let pair = ctx.downcast_ref::<PairComp>().unwrap();
            (pair.first.clone(), pair.last.clone())
        };
        text_interpolate2(rt, "", &first, " ", &last, "")?;
    }
    Ok(())
}

#[test]
fn should_rewrite_whole_text_when_either_interpolated_value_changes() {
    let (mut rt, renderer, _) = test_runtime();
    let def = Rc::new(DirectiveDef::component::<PairComp>(
        "PairComp",
        CssSelector::parse("pair-comp").unwrap(),
        || {
            instance_handle(PairComp {
                first: Value::from("Ada"),
                last: Value::from("Lovelace"),
            })
        },
        pair_comp_template,
        1,
        2,
    ));
    let comp = render_component(&mut rt, def, "app-host").unwrap();
    renderer.take_calls();

    detect_changes(&mut rt, comp.root_view).unwrap();
    let writes = renderer.calls_matching("setValue");
    assert_eq!(writes.len(), 1);
    assert!(writes[0].contains("Ada Lovelace"));

    comp.instance
        .borrow_mut()
        .downcast_mut::<PairComp>()
        .unwrap()
        .last = Value::from("Byron");
    renderer.take_calls();
    detect_changes(&mut rt, comp.root_view).unwrap();
    let writes = renderer.calls_matching("setValue");
    assert_eq!(writes.len(), 1);
    assert!(writes[0].contains("Ada Byron"));
}

struct GroupComp;

fn group_comp_template(rt: &mut ViewRuntime, rf: RenderFlags, _ctx: &InstanceHandle) -> Result<()> {
    if rf.contains(RenderFlags::CREATE) {
        element_container_start(rt, 0, None, None)?;
        text(rt, 1, "grouped")?;
        element_container_end(rt);
    }
    Ok(())
}

#[test]
fn should_render_element_container_children_into_real_parent() {
    let (mut rt, renderer, _) = test_runtime();
    let def = Rc::new(DirectiveDef::component::<GroupComp>(
        "GroupComp",
        CssSelector::parse("group-comp").unwrap(),
        || instance_handle(GroupComp),
        group_comp_template,
        2,
        0,
    ));
    renderer.take_calls();
    render_component(&mut rt, def, "app-host").unwrap();

    // The grouping node is just a comment anchor; the text lands on the
    // component host.
    let comments = renderer.calls_matching("createComment");
    assert_eq!(comments.len(), 1);
    let appends = renderer.calls_matching("appendChild");
    // Anchor and text both attach to the host element.
    assert_eq!(appends.len(), 2);
}

#[test]
fn should_update_text_through_interpolation() {
    let (mut rt, renderer, _) = test_runtime();
    let def = Rc::new(DirectiveDef::component::<TextComp>(
        "TextComp",
        CssSelector::parse("text-comp").unwrap(),
        || {
            instance_handle(TextComp {
                name: Value::from("world"),
            })
        },
        text_comp_template,
        2,
        1,
    ));
    let comp = render_component(&mut rt, def, "app-host").unwrap();
    renderer.take_calls();

    detect_changes(&mut rt, comp.root_view).unwrap();
    let writes = renderer.calls_matching("setValue");
    assert_eq!(writes.len(), 1);
    assert!(writes[0].contains("Hello, world!"));

    renderer.take_calls();
    detect_changes(&mut rt, comp.root_view).unwrap();
    assert!(renderer.calls_matching("setValue").is_empty());
}
