//! Definition Interfaces
//!
//! Corresponds to packages/core/src/render3/interfaces/definition.ts
//!
//! The view-definition contract consumed from the compiler. Lifecycle hooks
//! are explicit capability slots (`Option<fn>`) populated by the compiler;
//! the runtime never inspects instances to discover them.

use std::any::{Any, TypeId};
use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::event_emitter::EventEmitter;
use crate::render3::arena::TViewId;
use crate::render3::bindings::Value;
use crate::render3::errors::Result;
use crate::render3::hooks::SimpleChanges;
use crate::render3::interfaces::injector::InstanceHandle;
use crate::render3::interfaces::node::TAttributes;
use crate::render3::interfaces::query::{ContentQueriesFn, ViewQueriesFn};
use crate::render3::node_selector_matcher::CssSelector;
use crate::render3::schema::SchemaMetadata;
use crate::render3::state::ViewRuntime;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderFlags: u8 {
        /// Creation-mode template invocation: materialize nodes.
        const CREATE = 0b01;
        /// Update-mode template invocation: evaluate bindings.
        const UPDATE = 0b10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChangeDetectionStrategy {
    OnPush = 0,
    Default = 1,
}

/// Instantiates the directive/component/pipe.
pub type FactoryFn = fn() -> InstanceHandle;

/// Compiled template function. Idempotent across calls with equal flags and
/// slot state; runs create-only or update-only work depending on `rf`.
pub type ComponentTemplate = fn(&mut ViewRuntime, RenderFlags, &InstanceHandle) -> Result<()>;

/// Compiled host-bindings function of one directive.
pub type HostBindingsFn = fn(&mut ViewRuntime, RenderFlags, &InstanceHandle) -> Result<()>;

/// Lifecycle hook entry point on a directive instance.
pub type HookFn = fn(&mut dyn Any) -> Result<()>;

/// `ngOnChanges`-style hook; receives the accumulated changes.
pub type OnChangesFn = fn(&mut dyn Any, &SimpleChanges) -> Result<()>;

/// Writes an input by its private (class property) name.
pub type SetInputFn = fn(&mut dyn Any, &str, &Value);

/// Resolves an output emitter by its private name.
pub type OutputAccessorFn = fn(&dyn Any, &str) -> Option<EventEmitter>;

/// Pipe transform: instance + argument list in slot order.
pub type PipeTransformFn = fn(&mut dyn Any, &[Value]) -> Result<Value>;

/// Directive/pipe lists may be supplied eagerly or deferred until the first
/// create pass needs them.
#[derive(Clone)]
pub enum DirectiveDefListOrFactory {
    List(Vec<Rc<DirectiveDef>>),
    Factory(fn() -> Vec<Rc<DirectiveDef>>),
}

impl DirectiveDefListOrFactory {
    pub fn resolve(&self) -> Vec<Rc<DirectiveDef>> {
        match self {
            DirectiveDefListOrFactory::List(list) => list.clone(),
            DirectiveDefListOrFactory::Factory(factory) => factory(),
        }
    }
}

#[derive(Clone)]
pub enum PipeDefListOrFactory {
    List(Vec<Rc<PipeDef>>),
    Factory(fn() -> Vec<Rc<PipeDef>>),
}

impl PipeDefListOrFactory {
    pub fn resolve(&self) -> Vec<Rc<PipeDef>> {
        match self {
            PipeDefListOrFactory::List(list) => list.clone(),
            PipeDefListOrFactory::Factory(factory) => factory(),
        }
    }
}

/// Template constants: a literal array or a factory invoked once.
#[derive(Clone)]
pub enum TConstantsOrFactory {
    List(Vec<TAttributes>),
    Factory(fn() -> Vec<TAttributes>),
}

impl TConstantsOrFactory {
    pub fn resolve(&self) -> Vec<TAttributes> {
        match self {
            TConstantsOrFactory::List(list) => list.clone(),
            TConstantsOrFactory::Factory(factory) => factory(),
        }
    }
}

/// A host directive applied by another directive. The alias maps are both an
/// allow-list (only listed public names are exposed on the host) and a
/// remapping (original public name -> name exposed on the host).
#[derive(Clone)]
pub struct HostDirectiveDef {
    pub directive: Rc<DirectiveDef>,
    pub inputs: IndexMap<String, String>,
    pub outputs: IndexMap<String, String>,
}

/// Component-only part of a definition.
pub struct ComponentDefData {
    pub template: ComponentTemplate,
    pub decls: usize,
    pub vars: usize,
    pub view_query: Option<ViewQueriesFn>,
    pub consts: Option<TConstantsOrFactory>,
    pub directive_defs: Option<DirectiveDefListOrFactory>,
    pub pipe_defs: Option<PipeDefListOrFactory>,
    pub change_detection: ChangeDetectionStrategy,
    pub schemas: Option<Vec<SchemaMetadata>>,
    /// Shape table shared by all instances of this component; rebuilt when a
    /// first create pass left it incomplete.
    pub tview: Cell<Option<TViewId>>,
}

/// Runtime definition of a directive (or component, when `component` is
/// populated).
pub struct DirectiveDef {
    pub name: String,
    /// Token the instance is published under in the node injector.
    pub type_id: TypeId,
    pub selectors: Vec<CssSelector>,
    pub factory: FactoryFn,
    /// Public binding name -> private property name.
    pub inputs: IndexMap<String, String>,
    pub outputs: IndexMap<String, String>,
    pub export_as: Option<Vec<String>>,
    pub host_bindings: Option<HostBindingsFn>,
    pub host_vars: usize,
    pub host_attrs: Option<TAttributes>,
    pub set_input: Option<SetInputFn>,
    pub get_output: Option<OutputAccessorFn>,
    pub content_queries: Option<ContentQueriesFn>,
    pub static_content_queries: bool,
    pub on_changes: Option<OnChangesFn>,
    pub on_init: Option<HookFn>,
    pub do_check: Option<HookFn>,
    pub after_content_init: Option<HookFn>,
    pub after_content_checked: Option<HookFn>,
    pub after_view_init: Option<HookFn>,
    pub after_view_checked: Option<HookFn>,
    pub on_destroy: Option<HookFn>,
    pub host_directives: Vec<HostDirectiveDef>,
    pub component: Option<ComponentDefData>,
}

impl DirectiveDef {
    pub fn new<T: Any>(
        name: impl Into<String>,
        selectors: Vec<CssSelector>,
        factory: FactoryFn,
    ) -> Self {
        DirectiveDef {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            selectors,
            factory,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            export_as: None,
            host_bindings: None,
            host_vars: 0,
            host_attrs: None,
            set_input: None,
            get_output: None,
            content_queries: None,
            static_content_queries: false,
            on_changes: None,
            on_init: None,
            do_check: None,
            after_content_init: None,
            after_content_checked: None,
            after_view_init: None,
            after_view_checked: None,
            on_destroy: None,
            host_directives: Vec::new(),
            component: None,
        }
    }

    /// Component constructor: a directive definition plus the template part.
    pub fn component<T: Any>(
        name: impl Into<String>,
        selectors: Vec<CssSelector>,
        factory: FactoryFn,
        template: ComponentTemplate,
        decls: usize,
        vars: usize,
    ) -> Self {
        let mut def = DirectiveDef::new::<T>(name, selectors, factory);
        def.component = Some(ComponentDefData {
            template,
            decls,
            vars,
            view_query: None,
            consts: None,
            directive_defs: None,
            pipe_defs: None,
            change_detection: ChangeDetectionStrategy::Default,
            schemas: None,
            tview: Cell::new(None),
        });
        def
    }

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }

    pub fn on_push(&self) -> bool {
        matches!(
            self.component.as_ref().map(|c| c.change_detection),
            Some(ChangeDetectionStrategy::OnPush)
        )
    }

    pub fn has_hooks(&self) -> bool {
        self.on_changes.is_some()
            || self.on_init.is_some()
            || self.do_check.is_some()
            || self.after_content_init.is_some()
            || self.after_content_checked.is_some()
            || self.after_view_init.is_some()
            || self.after_view_checked.is_some()
            || self.on_destroy.is_some()
    }
}

/// Runtime definition of a pipe.
pub struct PipeDef {
    pub name: String,
    pub factory: FactoryFn,
    pub transform: PipeTransformFn,
    /// Pure pipes are memoized through binding slots; impure pipes run on
    /// every refresh.
    pub pure: bool,
    pub on_destroy: Option<HookFn>,
}

impl PipeDef {
    pub fn new(
        name: impl Into<String>,
        factory: FactoryFn,
        transform: PipeTransformFn,
    ) -> Self {
        PipeDef {
            name: name.into(),
            factory,
            transform,
            pure: true,
            on_destroy: None,
        }
    }
}
