//! Shared Instruction Logic
//!
//! Corresponds to packages/core/src/render3/instructions/shared.ts
//!
//! Construction of shape tables and instance buffers, node materialization,
//! directive resolution and instantiation, expando growth and the
//! host-binding opcode machinery. Everything here that mutates a TView runs
//! on the first create pass only; instance-level work runs once per LView.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::render3::arena::{LViewId, TViewId};
use crate::render3::assert::{assert_equal, assert_index_in_declaration_range, throw_error};
use crate::render3::bindings::Value;
use crate::render3::errors::{Result, RuntimeError, RuntimeErrorCode};
use crate::render3::hooks::{register_post_order_hooks, register_pre_order_hooks};
use crate::render3::interfaces::definition::{
    ComponentTemplate, DirectiveDef, DirectiveDefListOrFactory, HostDirectiveDef,
    PipeDefListOrFactory, TConstantsOrFactory,
};
use crate::render3::interfaces::injector::{Injector, InstanceHandle};
use crate::render3::interfaces::node::{TAttributes, TNode, TNodeFlags, TNodeRef, TNodeType};
use crate::render3::interfaces::query::ViewQueriesFn;
use crate::render3::interfaces::renderer::{RElement, Renderer};
use crate::render3::interfaces::sanitizer::SanitizeFn;
use crate::render3::interfaces::view::{
    HostBindingOpCode, InitPhaseState, LView, LViewFlags, SlotValue, TData, TView, TViewType,
    ViewTreeNode, HEADER_OFFSET,
};
use crate::render3::node_selector_matcher::is_node_matching_selector_list;
use crate::render3::schema::SchemaMetadata;
use crate::render3::state::ViewRuntime;

/// Creates a sealed shape table. Creation never fails; invalid compiler
/// output is a programmer error caught by dev-mode assertions downstream.
#[allow(clippy::too_many_arguments)]
pub fn create_tview(
    rt: &mut ViewRuntime,
    type_: TViewType,
    decl_tnode: Option<TNodeRef>,
    template: Option<ComponentTemplate>,
    decls: usize,
    vars: usize,
    directives: Option<DirectiveDefListOrFactory>,
    pipes: Option<PipeDefListOrFactory>,
    view_query: Option<ViewQueriesFn>,
    schemas: Option<Vec<SchemaMetadata>>,
    consts: Option<TConstantsOrFactory>,
) -> TViewId {
    let binding_start_index = HEADER_OFFSET + decls;
    let initial_view_length = binding_start_index + vars;

    let mut blueprint = Vec::with_capacity(initial_view_length);
    let mut data = Vec::with_capacity(initial_view_length);
    for index in 0..initial_view_length {
        blueprint.push(if index < binding_start_index {
            SlotValue::Null
        } else {
            SlotValue::NoChange
        });
        data.push(TData::Null);
    }

    let id = rt.arena.next_tview_id();
    rt.arena.insert_tview(TView {
        id,
        type_,
        blueprint,
        template,
        view_query,
        decl_tnode,
        first_create_pass: true,
        first_update_pass: true,
        incomplete_first_pass: false,
        data,
        binding_start_index,
        expando_start_index: initial_view_length,
        static_view_queries: false,
        static_content_queries: false,
        first_child: None,
        host_binding_op_codes: None,
        directive_registry: directives.map(|d| d.resolve()),
        pipe_registry: pipes.map(|p| p.resolve()),
        pre_order_hooks: None,
        pre_order_check_hooks: None,
        content_hooks: None,
        content_check_hooks: None,
        view_hooks: None,
        view_check_hooks: None,
        destroy_hooks: None,
        content_queries: None,
        components: None,
        consts: consts.map(|c| c.resolve()),
        schemas,
    })
}

/// Clones the blueprint and stamps the instance header. The view starts in
/// creation mode, attached, with its first-pass flag set.
#[allow(clippy::too_many_arguments)]
pub fn create_lview(
    rt: &mut ViewRuntime,
    parent: Option<ViewTreeNode>,
    declaration_view: Option<LViewId>,
    tview_id: TViewId,
    context: Option<InstanceHandle>,
    extra_flags: LViewFlags,
    host: Option<RElement>,
    t_host: Option<TNodeRef>,
    renderer: Rc<dyn Renderer>,
    sanitizer: Option<SanitizeFn>,
    injector: Option<Rc<dyn Injector>>,
    embedded_view_injector: Option<Rc<dyn Injector>>,
) -> LViewId {
    let tview = rt.arena.tview(tview_id);
    let slots = tview.blueprint.clone();
    let is_component_view = tview.type_ == TViewType::Component;

    let mut flags = extra_flags
        | LViewFlags::CREATION_MODE
        | LViewFlags::ATTACHED
        | LViewFlags::FIRST_LVIEW_PASS;
    if embedded_view_injector.is_some() {
        flags |= LViewFlags::HAS_EMBEDDED_VIEW_INJECTOR;
    }

    let declaration_component_view = match declaration_view {
        // Embedded views refresh with the component view of their
        // declaration point; component views refresh with themselves.
        Some(decl) if !is_component_view => {
            rt.arena.view(decl).declaration_component_view.or(Some(decl))
        }
        _ => None,
    };

    let uid = rt.arena.next_view_uid();
    let id = rt.arena.insert_view(LView {
        uid,
        tview: tview_id,
        flags,
        init_phase: InitPhaseState::OnInitPending,
        host,
        t_host,
        parent,
        next: None,
        child_head: None,
        child_tail: None,
        context,
        renderer,
        sanitizer,
        injector,
        embedded_view_injector,
        declaration_view,
        declaration_component_view,
        declaration_lcontainer: None,
        transplanted_views_to_refresh: 0,
        cleanup: Vec::new(),
        on_changes_state: Default::default(),
        slots,
    });
    if declaration_component_view.is_none() {
        // Root and component views are their own declaration component view.
        rt.arena.view_mut(id).declaration_component_view = Some(id);
    }
    id
}

/// Returns the TNode at `index`, creating and linking it on the first create
/// pass. A `Placeholder` left behind by an i18n block is upgraded exactly
/// once to the concrete type; any other type change is rejected.
pub fn get_or_create_tnode(
    rt: &mut ViewRuntime,
    index: usize,
    type_: TNodeType,
    value: Option<String>,
    attrs: Option<TAttributes>,
) -> usize {
    let dev_mode = rt.dev_mode;
    let frame = *rt.lframe();
    let tview = rt.arena.tview_mut(frame.tview);
    if dev_mode {
        assert_index_in_declaration_range(index, tview.binding_start_index);
    }

    match &mut tview.data[index] {
        TData::Node(existing) => {
            if existing.type_ == TNodeType::Placeholder && type_ != TNodeType::Placeholder {
                existing.type_ = type_;
                if existing.value.is_none() {
                    existing.value = value;
                }
                if existing.attrs.is_none() {
                    existing.attrs = attrs;
                }
            } else if dev_mode {
                assert_equal(existing.type_, type_, "TNode type is sealed after creation");
            }
        }
        TData::Null => {
            let mut tnode = TNode::new(type_, index, value, attrs);

            // Wire the node into the shape tree at the cursor. A non-null
            // `child` or `next` is never overwritten: i18n processing may
            // have pre-linked nodes, and those links win.
            let parent = if frame.is_parent {
                frame.current_tnode
            } else {
                frame
                    .current_tnode
                    .and_then(|cursor| tview.node(cursor).parent)
            };
            tnode.parent = parent;

            if tview.first_child.is_none() {
                tview.first_child = Some(index);
            }
            if let Some(cursor) = frame.current_tnode {
                let cursor_node = tview.node_mut(cursor);
                if frame.is_parent {
                    // Upstream guards this with `tNode.parent !== null` as
                    // well; the observable effect is that a view-root node
                    // never becomes the child of the cursor.
                    if cursor_node.child.is_none() && tnode.parent.is_some() {
                        cursor_node.child = Some(index);
                    }
                } else if cursor_node.next.is_none() {
                    cursor_node.next = Some(index);
                }
            }

            tview.data[index] = TData::Node(tnode);
        }
        other => throw_error(&format!("slot {index} already holds {other:?}")),
    }

    let frame = rt.lframe_mut();
    frame.current_tnode = Some(index);
    frame.is_parent = true;
    index
}

/// Expands a matched definition into its host directives followed by itself,
/// carrying the host-directive alias maps alongside.
fn expand_host_directives(
    def: &Rc<DirectiveDef>,
    out: &mut Vec<(Rc<DirectiveDef>, Option<HostDirectiveDef>)>,
) {
    for host_directive in &def.host_directives {
        out.push((host_directive.directive.clone(), Some(host_directive.clone())));
    }
    out.push((def.clone(), None));
}

/// Matches the registry against the node and resolves everything the first
/// create pass needs to know about its directives: the expando range, merged
/// host attrs, alias tables, initial inputs, hook schedules, host-binding
/// opcodes, local names and the component marker.
pub fn resolve_directives(
    rt: &mut ViewRuntime,
    tnode_index: usize,
    local_refs: Option<&[(String, String)]>,
) -> Result<()> {
    let view_id = rt.active_view_id();
    let (lview, tview) = rt.arena.view_and_tview_mut(view_id);
    debug_assert!(tview.first_create_pass);

    // 1. Match the registry. Components go to the front of the list.
    let mut component: Option<Rc<DirectiveDef>> = None;
    let mut plain: Vec<Rc<DirectiveDef>> = Vec::new();
    if let Some(registry) = &tview.directive_registry {
        let tnode = tview.node(tnode_index);
        for def in registry {
            if !is_node_matching_selector_list(tnode, &def.selectors) {
                continue;
            }
            if def.is_component() {
                if let Some(existing) = &component {
                    return Err(RuntimeError::new(
                        RuntimeErrorCode::MultipleComponentsMatch,
                        format!(
                            "Multiple components match node with tagname {}: {} and {}",
                            tnode.value.as_deref().unwrap_or("<unknown>"),
                            existing.name,
                            def.name,
                        ),
                    ));
                }
                component = Some(def.clone());
            } else {
                plain.push(def.clone());
            }
        }
    }

    // 2. Expand host directives; a component's host directives run before
    // the component, a directive's before that directive.
    let mut matches: Vec<(Rc<DirectiveDef>, Option<HostDirectiveDef>)> = Vec::new();
    let mut component_offset: i32 = -1;
    if let Some(component) = &component {
        expand_host_directives(component, &mut matches);
        component_offset = (matches.len() - 1) as i32;
    }
    for def in &plain {
        expand_host_directives(def, &mut matches);
    }

    if matches.is_empty() {
        cache_local_names(tview, lview, tnode_index, local_refs, &[])?;
        return Ok(());
    }

    // 3. Allocate the contiguous directive range in the expando.
    let directive_start = tview.data.len();
    let directive_end = directive_start + matches.len();
    for (def, _) in &matches {
        tview.data.push(TData::DirectiveDef(def.clone()));
        tview.blueprint.push(SlotValue::Null);
        lview.slots.push(SlotValue::Null);
    }

    {
        let tnode = tview.node_mut(tnode_index);
        tnode.directive_start = directive_start;
        tnode.directive_end = directive_end;
        tnode.component_offset = component_offset;
        tnode.flags |= TNodeFlags::IS_DIRECTIVE_HOST;
    }
    if component.is_some() {
        tview
            .components
            .get_or_insert_with(Vec::new)
            .push(tnode_index);
    }

    // 4. Merge host attrs (match order, template attrs last so the template
    // wins and the component, merged first, loses) and register hooks,
    // content queries and host-binding opcodes.
    let mut merged = TAttributes::default();
    let mut last_selected: Option<usize> = None;
    for (offset, (def, _)) in matches.iter().enumerate() {
        let slot = directive_start + offset;
        if let Some(host_attrs) = &def.host_attrs {
            merged.merge_from(host_attrs);
        }
        register_pre_order_hooks(tview, def, slot);
        register_post_order_hooks(tview, def, slot);
        if let Some(content_queries) = def.content_queries {
            tview
                .content_queries
                .get_or_insert_with(Vec::new)
                .push((content_queries, slot));
            tview.node_mut(tnode_index).flags |= TNodeFlags::HAS_CONTENT_QUERY;
            if def.static_content_queries {
                tview.static_content_queries = true;
            }
        }
        if let Some(host_binding_fn) = def.host_bindings {
            // Allocate host vars in the expando, mirrored into all three
            // buffers, then emit the opcodes. A select is only emitted when
            // the target element actually changes.
            let binding_root = tview.data.len();
            for _ in 0..def.host_vars {
                tview.data.push(TData::Null);
                tview.blueprint.push(SlotValue::NoChange);
                lview.slots.push(SlotValue::NoChange);
            }
            let op_codes = tview
                .host_binding_op_codes
                .get_or_insert_with(SmallVec::new);
            if last_selected != Some(tnode_index) {
                op_codes.push(HostBindingOpCode::SelectElement(tnode_index));
                last_selected = Some(tnode_index);
            }
            op_codes.push(HostBindingOpCode::InvokeHostBinding {
                directive_index: slot,
                binding_root,
                host_binding_fn,
            });
            tview.node_mut(tnode_index).flags |= TNodeFlags::HAS_HOST_BINDINGS;
        }
    }
    {
        let tnode = tview.node_mut(tnode_index);
        if let Some(attrs) = &tnode.attrs {
            let template_attrs = attrs.clone();
            merged.merge_from(&template_attrs);
        }
        tnode.merged_attrs = Some(merged);
    }

    // 5. Input/output alias tables and initial inputs.
    initialize_input_and_output_aliases(tview, tnode_index, directive_start, &matches);

    // 6. Local names, including export resolution.
    cache_local_names(tview, lview, tnode_index, local_refs, &matches)?;
    Ok(())
}

/// Builds `tnode.inputs`/`tnode.outputs` and extracts initial inputs from
/// static attributes. A host-directive alias map restricts and renames the
/// public surface of that directive.
fn initialize_input_and_output_aliases(
    tview: &mut TView,
    tnode_index: usize,
    directive_start: usize,
    matches: &[(Rc<DirectiveDef>, Option<HostDirectiveDef>)],
) {
    let tnode = tview.node_mut(tnode_index);
    let is_inline_template = tnode.type_ == TNodeType::Container;

    for (offset, (def, host_alias)) in matches.iter().enumerate() {
        let slot = directive_start + offset;

        for (public_name, private_name) in &def.inputs {
            let exposed = match host_alias {
                Some(alias) => match alias.inputs.get(public_name) {
                    Some(exposed) => exposed.clone(),
                    // Not in the allow-list: hidden on the host.
                    None => continue,
                },
                None => public_name.clone(),
            };
            if exposed == "class" {
                tnode.flags |= TNodeFlags::HAS_CLASS_INPUT;
            }
            if exposed == "style" {
                tnode.flags |= TNodeFlags::HAS_STYLE_INPUT;
            }
            tnode
                .inputs
                .get_or_insert_with(Default::default)
                .entry(exposed.clone())
                .or_default()
                .push((slot, private_name.clone()));

            if !is_inline_template {
                if let Some(attr_value) = tnode.attrs.as_ref().and_then(|a| a.attr(&exposed)) {
                    let attr_value = attr_value.to_string();
                    let initial = tnode.initial_inputs.get_or_insert_with(Vec::new);
                    while initial.len() <= offset {
                        initial.push(Vec::new());
                    }
                    initial[offset].push((private_name.clone(), attr_value));
                }
            }
        }

        for (public_name, private_name) in &def.outputs {
            let exposed = match host_alias {
                Some(alias) => match alias.outputs.get(public_name) {
                    Some(exposed) => exposed.clone(),
                    None => continue,
                },
                None => public_name.clone(),
            };
            tnode
                .outputs
                .get_or_insert_with(Default::default)
                .entry(exposed)
                .or_default()
                .push((slot, private_name.clone()));
        }
    }
}

/// Resolves `localRefs` to directive slots (`-1` targets the element) and
/// caches them on the TNode. Unknown export names are an error.
fn cache_local_names(
    tview: &mut TView,
    _lview: &mut LView,
    tnode_index: usize,
    local_refs: Option<&[(String, String)]>,
    matches: &[(Rc<DirectiveDef>, Option<HostDirectiveDef>)],
) -> Result<()> {
    let Some(local_refs) = local_refs else {
        return Ok(());
    };
    let directive_start = tview.node(tnode_index).directive_start;
    let mut local_names = Vec::with_capacity(local_refs.len());
    for (name, export) in local_refs {
        if export.is_empty() {
            local_names.push((name.clone(), -1i64));
            continue;
        }
        let found = matches.iter().enumerate().find(|(_, (def, _))| {
            def.export_as
                .as_ref()
                .map(|exports| exports.iter().any(|e| e == export))
                .unwrap_or(false)
        });
        match found {
            Some((offset, _)) => {
                local_names.push((name.clone(), (directive_start + offset) as i64))
            }
            None => {
                return Err(RuntimeError::new(
                    RuntimeErrorCode::ExportNotFound,
                    format!("Export of name '{export}' not found!"),
                ));
            }
        }
    }
    tview.node_mut(tnode_index).local_names = Some(local_names);
    Ok(())
}

/// Instantiates every directive in the node's range, wires the component
/// instance as its view's context and applies static initial inputs.
pub fn create_directives_instances(rt: &mut ViewRuntime, tnode_index: usize) -> Result<()> {
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let (directive_start, directive_end, component_slot, initial_inputs) = {
        let tnode = rt.arena.tview(tview_id).node(tnode_index);
        (
            tnode.directive_start,
            tnode.directive_end,
            tnode.component_slot(),
            tnode.initial_inputs.clone(),
        )
    };
    if component_slot.is_some() {
        // The component view must exist before the component instance is
        // created so the instance can become that view's context.
        add_component_logic(rt, tnode_index);
    }

    for slot in directive_start..directive_end {
        let def = rt.arena.tview(tview_id).directive_def(slot);
        let instance = (def.factory)();
        rt.arena.view_mut(view_id).slots[slot] = SlotValue::Instance(instance.clone());

        if component_slot == Some(slot) {
            // The component instance is the context of its component view.
            if let SlotValue::View(component_view) =
                rt.arena.view(view_id).slots[tnode_index].clone()
            {
                rt.arena.view_mut(component_view).context = Some(instance.clone());
            }
        }

        if let Some(initial) = initial_inputs
            .as_ref()
            .and_then(|inputs| inputs.get(slot - directive_start))
        {
            let lview = rt.arena.view_mut(view_id);
            for (private_name, attr_value) in initial {
                write_to_directive_input(
                    lview,
                    &def,
                    slot,
                    private_name,
                    &Value::Str(attr_value.clone()),
                );
            }
        }
    }
    Ok(())
}

/// Stores resolved local-ref values in the slots directly after the node.
/// Runs after directive instantiation, whether or not directives matched.
pub(crate) fn save_resolved_locals_in_data(rt: &mut ViewRuntime, tnode_index: usize) {
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let local_names = match &rt.arena.tview(tview_id).node(tnode_index).local_names {
        Some(local_names) => local_names.clone(),
        None => return,
    };
    for (offset, (_, directive_slot)) in local_names.iter().enumerate() {
        let value = if *directive_slot < 0 {
            match native_by_index(rt, view_id, tnode_index) {
                Some(native) => SlotValue::Node(native),
                None => SlotValue::Null,
            }
        } else {
            rt.arena.view(view_id).slots[*directive_slot as usize].clone()
        };
        rt.arena.view_mut(view_id).slots[tnode_index + 1 + offset] = value;
    }
}

/// Routes one input write to a directive, recording changes for
/// `ngOnChanges` delivery when the definition listens for them.
pub(crate) fn write_to_directive_input(
    lview: &mut LView,
    def: &DirectiveDef,
    slot: usize,
    private_name: &str,
    value: &Value,
) {
    if def.on_changes.is_some() {
        lview.on_changes_state.record(slot, private_name, value);
    }
    if let Some(set_input) = def.set_input {
        let instance = lview.instance(slot);
        set_input(&mut *instance.borrow_mut(), private_name, value);
    }
}

/// Applies `value` to every directive input aliased to `public_name` on the
/// node. Returns whether any directive consumed it. Writing an input of an
/// OnPush component marks that component view dirty.
pub fn set_inputs_for_property(
    rt: &mut ViewRuntime,
    tnode_index: usize,
    public_name: &str,
    value: &Value,
) -> bool {
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let aliases = {
        let tnode = rt.arena.tview(tview_id).node(tnode_index);
        match tnode.inputs.as_ref().and_then(|inputs| inputs.get(public_name)) {
            Some(aliases) => aliases.clone(),
            None => return false,
        }
    };
    for (slot, private_name) in &aliases {
        let def = rt.arena.tview(tview_id).directive_def(*slot);
        let lview = rt.arena.view_mut(view_id);
        write_to_directive_input(lview, &def, *slot, private_name, value);
    }
    // An input flowing into a component host re-arms the child for the next
    // refresh when it is OnPush.
    let child_view = match rt.arena.view(view_id).slots[tnode_index] {
        SlotValue::View(child_view) => Some(child_view),
        _ => None,
    };
    if let Some(child_view) = child_view {
        mark_dirty_if_on_push(rt, child_view);
    }
    true
}

/// `markDirtyIfOnPush`: OnPush views only refresh when something marked them
/// dirty since the last pass.
pub fn mark_dirty_if_on_push(rt: &mut ViewRuntime, view: LViewId) {
    let lview = rt.arena.view_mut(view);
    if !lview.flags.contains(LViewFlags::CHECK_ALWAYS) {
        lview.flags |= LViewFlags::DIRTY;
    }
}

/// Returns the component shape for `def`, creating it on first use or after
/// an incomplete first pass poisoned the previous one.
pub fn get_or_create_component_tview(rt: &mut ViewRuntime, def: &Rc<DirectiveDef>) -> TViewId {
    let component = def
        .component
        .as_ref()
        .unwrap_or_else(|| throw_error(&format!("'{}' is not a component", def.name)));
    if let Some(cached) = component.tview.get() {
        if !rt.arena.tview(cached).incomplete_first_pass {
            return cached;
        }
    }
    let tview_id = create_tview(
        rt,
        TViewType::Component,
        None,
        Some(component.template),
        component.decls,
        component.vars,
        component.directive_defs.clone(),
        component.pipe_defs.clone(),
        component.view_query,
        component.schemas.clone(),
        component.consts.clone(),
    );
    component.tview.set(Some(tview_id));
    tview_id
}

/// Creates the component view for a component-host node and stores it in the
/// host slot. The native element moves into the component view's header.
pub fn add_component_logic(rt: &mut ViewRuntime, tnode_index: usize) {
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let def = {
        let tnode = rt.arena.tview(tview_id).node(tnode_index);
        let slot = tnode
            .component_slot()
            .unwrap_or_else(|| throw_error("addComponentLogic on a non-component host"));
        rt.arena.tview(tview_id).directive_def(slot)
    };
    let component_tview = get_or_create_component_tview(rt, &def);
    let native = rt
        .arena
        .view(view_id)
        .node_ref(tnode_index)
        .unwrap_or_else(|| throw_error("component host has no native element"));

    let renderer = rt.renderer_factory.create_renderer(Some(native), Some(&def));
    let (sanitizer, injector) = {
        let lview = rt.arena.view(view_id);
        (lview.sanitizer, lview.injector.clone())
    };
    let flags = if def.on_push() {
        LViewFlags::DIRTY
    } else {
        LViewFlags::CHECK_ALWAYS
    };
    let component_view = create_lview(
        rt,
        Some(ViewTreeNode::View(view_id)),
        Some(view_id),
        component_tview,
        None,
        flags,
        Some(native),
        Some(TNodeRef {
            tview: tview_id,
            index: tnode_index,
        }),
        renderer,
        sanitizer,
        injector,
        None,
    );
    crate::render3::node_manipulation::add_to_view_tree(
        rt,
        view_id,
        ViewTreeNode::View(component_view),
    );
    rt.arena.view_mut(view_id).slots[tnode_index] = SlotValue::View(component_view);
}

/// Registers a teardown closure on the nearest view; run LIFO at destroy.
pub fn store_cleanup(rt: &mut ViewRuntime, view: LViewId, cleanup: Box<dyn FnOnce()>) {
    rt.arena.view_mut(view).cleanup.push(cleanup);
}

/// Executes the host-binding opcode stream of the active view, strictly in
/// order. The selected index is reset on every exit path.
pub fn process_host_binding_op_codes(rt: &mut ViewRuntime) -> Result<()> {
    use crate::render3::interfaces::definition::RenderFlags;

    let tview_id = rt.active_tview_id();
    let op_codes = match &rt.arena.tview(tview_id).host_binding_op_codes {
        Some(op_codes) => op_codes.clone(),
        None => return Ok(()),
    };
    let result: Result<()> = (|| {
        for op in &op_codes {
            match op {
                HostBindingOpCode::SelectElement(index) => {
                    rt.set_selected_index(*index as isize);
                }
                HostBindingOpCode::InvokeHostBinding {
                    directive_index,
                    binding_root,
                    host_binding_fn,
                } => {
                    let instance = rt.arena.view(rt.active_view_id()).instance(*directive_index);
                    {
                        let frame = rt.lframe_mut();
                        frame.binding_root_index = *binding_root;
                        frame.binding_index = *binding_root;
                        frame.current_directive_index = *directive_index as isize;
                    }
                    host_binding_fn(rt, RenderFlags::UPDATE, &instance)?;
                }
            }
        }
        Ok(())
    })();
    let frame = rt.lframe_mut();
    frame.selected_index = -1;
    frame.current_directive_index = -1;
    result
}

/// Resolves the native node at a slot, unwrapping component views (the slot
/// holds the view, the element is its host) and containers (the anchor).
pub fn native_by_index(
    rt: &ViewRuntime,
    view: LViewId,
    index: usize,
) -> Option<crate::render3::interfaces::renderer::RNode> {
    match rt.arena.view(view).slots.get(index)? {
        SlotValue::Node(native) => Some(*native),
        SlotValue::View(component_view) => rt.arena.view(*component_view).host,
        SlotValue::Container(container) => Some(rt.arena.container(*container).native),
        _ => None,
    }
}

/// Render parent for a node attached at `tnode`: the parent element within
/// the same view, or the view's host element for view-root nodes. Embedded
/// views have no host; their root nodes attach when the view is inserted.
pub(crate) fn native_render_parent(
    rt: &ViewRuntime,
    view: LViewId,
    tnode_index: usize,
) -> Option<RElement> {
    let lview = rt.arena.view(view);
    let tview = rt.arena.tview(lview.tview);
    // Logical containers have no native element; their children render into
    // the nearest real parent.
    let mut parent = tview.node(tnode_index).parent;
    while let Some(parent_index) = parent {
        let parent_node = tview.node(parent_index);
        match parent_node.type_ {
            TNodeType::Element => return native_by_index(rt, view, parent_index),
            TNodeType::ElementContainer => parent = parent_node.parent,
            _ => return None,
        }
    }
    lview.host
}

/// Update-mode helper: reads a local-ref slot of the active view.
pub fn reference(rt: &ViewRuntime, index: usize) -> SlotValue {
    let view = rt.active_view_id();
    rt.arena.view(view).slots[HEADER_OFFSET + index].clone()
}

/// Applies the node's static attributes, classes and styles through the
/// renderer at creation time.
pub(crate) fn setup_static_attributes(renderer: &dyn Renderer, native: RElement, tnode: &TNode) {
    let Some(attrs) = tnode.merged_attrs.as_ref().or(tnode.attrs.as_ref()) else {
        return;
    };
    for (name, value) in &attrs.attrs {
        renderer.set_attribute(native, name, value, None);
    }
    for class in &attrs.classes {
        renderer.add_class(native, class);
    }
    for (style, value) in &attrs.styles {
        renderer.set_style(native, style, value);
    }
}
