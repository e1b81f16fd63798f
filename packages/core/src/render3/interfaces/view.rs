//! View Interfaces
//!
//! Corresponds to packages/core/src/render3/interfaces/view.ts
//!
//! Two buffers make up a view: the `TView` shape table, built once per
//! template and shared by every instance, and the `LView` instance buffer.
//! `TView.data`, `TView.blueprint` and `LView.slots` are kept the same
//! length at all times; indices below [`HEADER_OFFSET`] are `Null` padding
//! there because the instance header itself lives in typed fields on
//! `LView`, not in the slot array.

use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::render3::arena::{LContainerId, LViewId, TViewId};
use crate::render3::bindings::Value;
use crate::render3::hooks::{DestroyHookSchedule, HookSchedule, OnChangesState};
use crate::render3::interfaces::definition::{ComponentTemplate, DirectiveDef, PipeDef};
use crate::render3::interfaces::injector::{Injector, InstanceHandle};
use crate::render3::interfaces::node::{TAttributes, TNode, TNodeRef};
use crate::render3::interfaces::query::{ContentQueriesFn, ViewQueriesFn};
use crate::render3::interfaces::renderer::{RElement, RNode, Renderer};
use crate::render3::interfaces::sanitizer::SanitizeFn;
use crate::render3::schema::SchemaMetadata;

/// First slot index usable by declared nodes. The header region of the slot
/// arrays is reserved (and kept `Null`) so node and binding indices are
/// identical in `TView.data`, `TView.blueprint` and `LView.slots`.
pub const HEADER_OFFSET: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TViewType {
    /// Synthetic view wrapping the host element a root component boots onto.
    Root = 0,
    Component = 1,
    Embedded = 2,
}

/// One entry of the per-instance slot array.
#[derive(Clone)]
pub enum SlotValue {
    Null,
    /// Binding-region sentinel: "never written". Never equal to a user value.
    NoChange,
    Value(Value),
    Node(RNode),
    Instance(InstanceHandle),
    /// Component view attached at a host-element slot.
    View(LViewId),
    Container(LContainerId),
}

impl PartialEq for SlotValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SlotValue::Null, SlotValue::Null) => true,
            (SlotValue::NoChange, SlotValue::NoChange) => true,
            (SlotValue::Value(a), SlotValue::Value(b)) => a == b,
            (SlotValue::Node(a), SlotValue::Node(b)) => a == b,
            (SlotValue::Instance(a), SlotValue::Instance(b)) => Rc::ptr_eq(a, b),
            (SlotValue::View(a), SlotValue::View(b)) => a == b,
            (SlotValue::Container(a), SlotValue::Container(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Debug for SlotValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotValue::Null => write!(f, "Null"),
            SlotValue::NoChange => write!(f, "NO_CHANGE"),
            SlotValue::Value(v) => write!(f, "Value({v:?})"),
            SlotValue::Node(n) => write!(f, "Node({n:?})"),
            SlotValue::Instance(_) => write!(f, "Instance"),
            SlotValue::View(v) => write!(f, "View({v:?})"),
            SlotValue::Container(c) => write!(f, "Container({c:?})"),
        }
    }
}

/// One entry of the shape table, parallel to [`SlotValue`] in the instance.
#[derive(Clone)]
pub enum TData {
    Null,
    Node(TNode),
    DirectiveDef(Rc<DirectiveDef>),
    PipeDef(Rc<PipeDef>),
    /// `propName` or `propName␟prefix␟part…␟suffix` debug metadata written on
    /// the first update pass.
    BindingMetadata(String),
}

impl std::fmt::Debug for TData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TData::Null => write!(f, "Null"),
            TData::Node(n) => write!(f, "Node(#{} {:?})", n.index, n.type_),
            TData::DirectiveDef(d) => write!(f, "DirectiveDef({})", d.name),
            TData::PipeDef(p) => write!(f, "PipeDef({})", p.name),
            TData::BindingMetadata(m) => write!(f, "BindingMetadata({m:?})"),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LViewFlags: u32 {
        /// Set between construction and the end of the first creation pass.
        const CREATION_MODE = 1 << 2;
        /// Whether this view has completed its first refresh pass.
        const FIRST_LVIEW_PASS = 1 << 3;
        const CHECK_ALWAYS = 1 << 4;
        const DIRTY = 1 << 5;
        const ATTACHED = 1 << 6;
        const DESTROYED = 1 << 7;
        const IS_ROOT = 1 << 9;
        /// Declared in one view, inserted under another; refreshed from the
        /// insertion tree via the container counters.
        const REFRESH_TRANSPLANTED_VIEW = 1 << 10;
        const HAS_EMBEDDED_VIEW_INJECTOR = 1 << 11;
    }
}

/// The two-bit init-phase counter the upstream packs into the flag word,
/// kept as a typed field here. Transitions are monotonic and happen exactly
/// once each, inside a refresh pass, right after the corresponding
/// init-and-check hooks ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum InitPhaseState {
    OnInitPending = 0,
    AfterContentInitPending = 1,
    AfterViewInitPending = 2,
    InitPhaseCompleted = 3,
}

impl InitPhaseState {
    pub fn next(self) -> InitPhaseState {
        match self {
            InitPhaseState::OnInitPending => InitPhaseState::AfterContentInitPending,
            InitPhaseState::AfterContentInitPending => InitPhaseState::AfterViewInitPending,
            InitPhaseState::AfterViewInitPending | InitPhaseState::InitPhaseCompleted => {
                InitPhaseState::InitPhaseCompleted
            }
        }
    }
}

/// Link in the per-view child chain; the chain mixes component views and
/// containers in order of first attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTreeNode {
    View(LViewId),
    Container(LContainerId),
}

/// Shape table: immutable per-template metadata shared across instances.
/// Sealed after construction except for the monotonic first-pass flags and
/// the append-only growth performed during the first create pass.
pub struct TView {
    pub id: TViewId,
    pub type_: TViewType,
    /// Template for fresh LView slot arrays. Grows in lockstep with `data`.
    pub blueprint: Vec<SlotValue>,
    pub template: Option<ComponentTemplate>,
    pub view_query: Option<ViewQueriesFn>,
    /// Container node this embedded template was declared on.
    pub decl_tnode: Option<TNodeRef>,
    pub first_create_pass: bool,
    pub first_update_pass: bool,
    /// Terminal: the first create pass raised and this shape must not be
    /// reused for new instances.
    pub incomplete_first_pass: bool,
    pub data: Vec<TData>,
    pub binding_start_index: usize,
    pub expando_start_index: usize,
    pub static_view_queries: bool,
    pub static_content_queries: bool,
    pub first_child: Option<usize>,
    pub host_binding_op_codes: Option<HostBindingOpCodes>,
    pub directive_registry: Option<Vec<Rc<DirectiveDef>>>,
    pub pipe_registry: Option<Vec<Rc<PipeDef>>>,
    pub pre_order_hooks: Option<HookSchedule>,
    pub pre_order_check_hooks: Option<HookSchedule>,
    pub content_hooks: Option<HookSchedule>,
    pub content_check_hooks: Option<HookSchedule>,
    pub view_hooks: Option<HookSchedule>,
    pub view_check_hooks: Option<HookSchedule>,
    pub destroy_hooks: Option<DestroyHookSchedule>,
    pub content_queries: Option<Vec<(ContentQueriesFn, usize)>>,
    /// Indices of component host nodes, in creation order.
    pub components: Option<Vec<usize>>,
    pub consts: Option<Vec<TAttributes>>,
    pub schemas: Option<Vec<SchemaMetadata>>,
}

impl TView {
    pub fn node(&self, index: usize) -> &TNode {
        match &self.data[index] {
            TData::Node(tnode) => tnode,
            other => panic!("expected TNode at {index}, found {other:?}"),
        }
    }

    pub fn node_mut(&mut self, index: usize) -> &mut TNode {
        match &mut self.data[index] {
            TData::Node(tnode) => tnode,
            other => panic!("expected TNode at {index}, found {other:?}"),
        }
    }

    pub fn directive_def(&self, slot: usize) -> Rc<DirectiveDef> {
        match &self.data[slot] {
            TData::DirectiveDef(def) => def.clone(),
            other => panic!("expected directive def at {slot}, found {other:?}"),
        }
    }
}

/// Host-binding opcode stream, a tagged sum where the upstream packs a
/// heterogeneous array. Executed strictly in order; the emitter does not
/// produce a `SelectElement` when the previous opcode already selected the
/// same element.
#[derive(Clone)]
pub enum HostBindingOpCode {
    /// Select the element at this declaration index as the binding target.
    SelectElement(usize),
    /// Set the binding root for the directive's host vars, then invoke.
    InvokeHostBinding {
        directive_index: usize,
        binding_root: usize,
        host_binding_fn: crate::render3::interfaces::definition::HostBindingsFn,
    },
}

pub type HostBindingOpCodes = SmallVec<[HostBindingOpCode; 8]>;

/// Instance buffer: the per-instance state of one view. The slot array is
/// cloned from the TView blueprint; the well-known header lives in the named
/// fields.
pub struct LView {
    /// Monotonically-assigned instance id, for debugging and dev asserts.
    pub uid: u64,
    pub tview: TViewId,
    pub flags: LViewFlags,
    pub init_phase: InitPhaseState,
    /// Host native element (component views); `None` for embedded views,
    /// which attach through their container's anchor.
    pub host: Option<RElement>,
    /// The TNode this view is attached to in the parent's shape.
    pub t_host: Option<TNodeRef>,
    pub parent: Option<ViewTreeNode>,
    /// Sibling link in the parent's child chain.
    pub next: Option<ViewTreeNode>,
    pub child_head: Option<ViewTreeNode>,
    pub child_tail: Option<ViewTreeNode>,
    pub context: Option<InstanceHandle>,
    pub renderer: Rc<dyn Renderer>,
    pub sanitizer: Option<SanitizeFn>,
    pub injector: Option<Rc<dyn Injector>>,
    pub embedded_view_injector: Option<Rc<dyn Injector>>,
    /// View the template was declared in; differs from the insertion parent
    /// for transplanted views. `None` at the root.
    pub declaration_view: Option<LViewId>,
    /// Nearest component view of the declaration point; the view whose
    /// refresh drives this one's bindings.
    pub declaration_component_view: Option<LViewId>,
    /// Container this embedded view was declared on, for transplant
    /// bookkeeping.
    pub declaration_lcontainer: Option<LContainerId>,
    /// Count of descendants flagged `REFRESH_TRANSPLANTED_VIEW`; aggregated
    /// up the parent chain so component refresh can decide without walking.
    pub transplanted_views_to_refresh: usize,
    /// Per-instance teardown closures, run LIFO at destroy.
    pub cleanup: Vec<Box<dyn FnOnce()>>,
    /// Pending `SimpleChanges` and delivery history per directive slot.
    pub on_changes_state: OnChangesState,
    pub slots: Vec<SlotValue>,
}

impl LView {
    pub fn is_creation_mode(&self) -> bool {
        self.flags.contains(LViewFlags::CREATION_MODE)
    }

    pub fn is_attached(&self) -> bool {
        self.flags.contains(LViewFlags::ATTACHED)
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags.contains(LViewFlags::DESTROYED)
    }

    pub fn node_ref(&self, index: usize) -> Option<RNode> {
        match self.slots.get(index) {
            Some(SlotValue::Node(node)) => Some(*node),
            _ => None,
        }
    }

    pub fn instance(&self, slot: usize) -> InstanceHandle {
        match &self.slots[slot] {
            SlotValue::Instance(handle) => handle.clone(),
            other => panic!("expected instance at {slot}, found {other:?}"),
        }
    }
}
