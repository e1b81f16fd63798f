//! Component Bootstrap
//!
//! Corresponds to packages/core/src/render3/component.ts
//!
//! Boots a component onto a host element owned by the embedder. The root
//! view is a synthetic one-slot view wrapping the host; the compiler never
//! sees it, so its shape is assembled by hand here.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::render3::arena::LViewId;
use crate::render3::assert::throw_error;
use crate::render3::change_detection::render_view;
use crate::render3::errors::Result;
use crate::render3::hooks::{register_post_order_hooks, register_pre_order_hooks};
use crate::render3::instructions::shared::{
    create_directives_instances, create_lview, create_tview, get_or_create_tnode,
    setup_static_attributes,
};
use crate::render3::interfaces::definition::DirectiveDef;
use crate::render3::interfaces::injector::InstanceHandle;
use crate::render3::interfaces::node::{TNodeFlags, TNodeType};
use crate::render3::interfaces::renderer::RElement;
use crate::render3::interfaces::view::{
    HostBindingOpCode, LViewFlags, SlotValue, TData, TViewType, HEADER_OFFSET,
};
use crate::render3::node_manipulation::destroy_lview;
use crate::render3::state::ViewRuntime;

/// Handle to a bootstrapped component.
pub struct ComponentRef {
    pub root_view: LViewId,
    pub component_view: LViewId,
    pub instance: InstanceHandle,
    pub host: RElement,
}

impl std::fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRef")
            .field("root_view", &self.root_view)
            .field("component_view", &self.component_view)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Bootstraps `def` onto the element selected by `host_selector` and runs
/// the creation pass. Change detection is driven separately through
/// [`crate::render3::change_detection::detect_changes`] on the root view.
pub fn render_component(
    rt: &mut ViewRuntime,
    def: Rc<DirectiveDef>,
    host_selector: &str,
) -> Result<ComponentRef> {
    if !def.is_component() {
        throw_error(&format!("'{}' is not a component", def.name));
    }
    let factory_renderer = rt.renderer_factory.create_renderer(None, Some(&def));
    let host = factory_renderer.select_root_element(host_selector, false);

    let root_tview = create_tview(
        rt,
        TViewType::Root,
        None,
        None,
        1,
        0,
        None,
        None,
        None,
        None,
        None,
    );
    let sanitizer = rt.sanitizer;
    let root_injector = rt.root_injector.clone();
    let root_view = create_lview(
        rt,
        None,
        None,
        root_tview,
        None,
        LViewFlags::CHECK_ALWAYS | LViewFlags::IS_ROOT,
        Some(host),
        None,
        factory_renderer.clone(),
        sanitizer,
        root_injector,
        None,
    );

    rt.enter_view(root_view);
    let setup = root_view_setup(rt, root_view, &def, host, host_selector);
    rt.leave_view();
    setup?;

    render_view(rt, root_view)?;

    let component_view = match rt.arena.view(root_view).slots[HEADER_OFFSET] {
        SlotValue::View(component_view) => component_view,
        ref other => throw_error(&format!("expected component view on host, found {other:?}")),
    };
    let instance = rt
        .arena
        .view(component_view)
        .context
        .clone()
        .unwrap_or_else(|| throw_error("component view has no instance"));

    Ok(ComponentRef {
        root_view,
        component_view,
        instance,
        host,
    })
}

/// Assembles the root shape: one element node hosting exactly the
/// bootstrapped component, with its hooks and host bindings wired the same
/// way template-driven resolution would wire them.
fn root_view_setup(
    rt: &mut ViewRuntime,
    root_view: LViewId,
    def: &Rc<DirectiveDef>,
    host: RElement,
    host_selector: &str,
) -> Result<()> {
    let index = get_or_create_tnode(
        rt,
        HEADER_OFFSET,
        TNodeType::Element,
        Some(host_selector.to_string()),
        None,
    );

    {
        let (lview, tview) = rt.arena.view_and_tview_mut(root_view);
        let directive_start = tview.data.len();
        tview.data.push(TData::DirectiveDef(def.clone()));
        tview.blueprint.push(SlotValue::Null);
        lview.slots.push(SlotValue::Null);

        if let Some(host_binding_fn) = def.host_bindings {
            let binding_root = tview.data.len();
            for _ in 0..def.host_vars {
                tview.data.push(TData::Null);
                tview.blueprint.push(SlotValue::NoChange);
                lview.slots.push(SlotValue::NoChange);
            }
            let op_codes = tview
                .host_binding_op_codes
                .get_or_insert_with(SmallVec::new);
            op_codes.push(HostBindingOpCode::SelectElement(index));
            op_codes.push(HostBindingOpCode::InvokeHostBinding {
                directive_index: directive_start,
                binding_root,
                host_binding_fn,
            });
        }
        register_pre_order_hooks(tview, def, directive_start);
        register_post_order_hooks(tview, def, directive_start);

        let tnode = tview.node_mut(index);
        tnode.directive_start = directive_start;
        tnode.directive_end = directive_start + 1;
        tnode.component_offset = 0;
        tnode.flags |= TNodeFlags::IS_DIRECTIVE_HOST;
        if def.host_bindings.is_some() {
            tnode.flags |= TNodeFlags::HAS_HOST_BINDINGS;
        }
        tnode.merged_attrs = def.host_attrs.clone();
        tview.components = Some(vec![index]);

        lview.slots[index] = SlotValue::Node(host);
    }

    {
        let lview = rt.arena.view(root_view);
        let tview = rt.arena.tview(lview.tview);
        setup_static_attributes(lview.renderer.as_ref(), host, tview.node(index));
    }

    create_directives_instances(rt, index)
}

/// Destroys the whole tree under the bootstrapped component.
pub fn destroy_component(rt: &mut ViewRuntime, component: &ComponentRef) {
    destroy_lview(rt, component.root_view);
}
