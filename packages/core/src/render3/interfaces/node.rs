//! Node Descriptors
//!
//! Corresponds to packages/core/src/render3/interfaces/node.ts
//!
//! A `TNode` describes one logical node of a template and is shared by every
//! instance of that template. It is created during the first creation pass
//! and sealed afterwards; the only permitted later mutation is the one-shot
//! `Placeholder` upgrade for late-bound i18n nodes.

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::render3::arena::TViewId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TNodeType {
    Element = 0,
    Text = 1,
    Container = 2,
    ElementContainer = 3,
    Projection = 4,
    Icu = 5,
    /// Reserved by an i18n block; upgraded to a concrete type when the node
    /// is materialized.
    Placeholder = 6,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TNodeFlags: u16 {
        /// At least one directive matched on this node.
        const IS_DIRECTIVE_HOST = 1 << 0;
        /// At least one matched directive carries host bindings.
        const HAS_HOST_BINDINGS = 1 << 1;
        /// At least one matched directive registers a content query.
        const HAS_CONTENT_QUERY = 1 << 2;
        /// `class` is consumed as a directive input on this node.
        const HAS_CLASS_INPUT = 1 << 3;
        /// `style` is consumed as a directive input on this node.
        const HAS_STYLE_INPUT = 1 << 4;
        const IS_PROJECTED = 1 << 5;
        const IS_DETACHED = 1 << 6;
    }
}

/// Static attributes of a node, grouped by kind. The compiler emits these as
/// one marker-delimited array; the runtime keeps them structured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TAttributes {
    /// Plain attributes, in declaration order.
    pub attrs: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub styles: Vec<(String, String)>,
    /// Names of bound properties; selector matching treats these as
    /// present-without-value attributes.
    pub bindings: Vec<String>,
    /// Binding names declared on an inline template (`*dir`-style); excluded
    /// from initial-input extraction.
    pub template_bindings: Vec<String>,
    pub project_as: Option<String>,
}

impl TAttributes {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.iter().any(|b| b == name)
            || self.template_bindings.iter().any(|b| b == name)
    }

    /// Merges `src` over `self`: attributes and styles from `src` win on
    /// conflicts, classes are unioned. Host attrs are merged in match order
    /// with the template attrs merged last, so "merged later wins" gives the
    /// template the highest priority and the component the lowest.
    pub fn merge_from(&mut self, src: &TAttributes) {
        for (name, value) in &src.attrs {
            match self.attrs.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value.clone(),
                None => self.attrs.push((name.clone(), value.clone())),
            }
        }
        for class in &src.classes {
            if !self.classes.iter().any(|c| c == class) {
                self.classes.push(class.clone());
            }
        }
        for (style, value) in &src.styles {
            match self.styles.iter_mut().find(|(n, _)| n == style) {
                Some(slot) => slot.1 = value.clone(),
                None => self.styles.push((style.clone(), value.clone())),
            }
        }
        for binding in &src.bindings {
            if !self.bindings.iter().any(|b| b == binding) {
                self.bindings.push(binding.clone());
            }
        }
    }
}

/// `(directive slot index, private property name)` pairs per public name.
/// One public name may feed several directives; all receive the same value.
pub type PropertyAliases = IndexMap<String, Vec<(usize, String)>>;

/// A node in a declaring view's shape, addressed as `(tview, index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TNodeRef {
    pub tview: TViewId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct TNode {
    pub type_: TNodeType,
    /// Position in both `LView` and `TView.data`.
    pub index: usize,
    /// i18n re-ordering target; carried through insertion decisions.
    pub insert_before_index: Option<usize>,
    /// Parent within the same TView; `None` for nodes attached at the view
    /// root (their render parent is the host element).
    pub parent: Option<usize>,
    pub child: Option<usize>,
    pub next: Option<usize>,
    pub projection_next: Option<usize>,
    /// Tag name for elements, text value seed for text nodes.
    pub value: Option<String>,
    /// Static attributes as written in the template.
    pub attrs: Option<TAttributes>,
    /// Template attrs merged over all matched directives' host attrs.
    pub merged_attrs: Option<TAttributes>,
    pub flags: TNodeFlags,
    /// Half-open directive range in the LView expando.
    pub directive_start: usize,
    pub directive_end: usize,
    /// Offset of the component def inside the directive range, or -1 when
    /// this node hosts no component.
    pub component_offset: i32,
    /// Local-ref name to directive slot index; -1 targets the native element.
    pub local_names: Option<Vec<(String, i64)>>,
    /// Static attribute values routed to directive inputs, indexed by the
    /// directive's offset within the range.
    pub initial_inputs: Option<Vec<Vec<(String, String)>>>,
    pub inputs: Option<PropertyAliases>,
    pub outputs: Option<PropertyAliases>,
    /// Embedded-template shape for `Container` nodes.
    pub tview: Option<TViewId>,
    /// Binding indices that target this node's properties; debug metadata.
    pub property_bindings: Option<Vec<usize>>,
}

impl TNode {
    pub fn new(type_: TNodeType, index: usize, value: Option<String>, attrs: Option<TAttributes>) -> Self {
        TNode {
            type_,
            index,
            insert_before_index: None,
            parent: None,
            child: None,
            next: None,
            projection_next: None,
            value,
            attrs,
            merged_attrs: None,
            flags: TNodeFlags::default(),
            directive_start: 0,
            directive_end: 0,
            component_offset: -1,
            local_names: None,
            initial_inputs: None,
            inputs: None,
            outputs: None,
            tview: None,
            property_bindings: None,
        }
    }

    pub fn is_directive_host(&self) -> bool {
        self.flags.contains(TNodeFlags::IS_DIRECTIVE_HOST)
    }

    pub fn is_component_host(&self) -> bool {
        self.component_offset >= 0
    }

    /// Absolute directive slot of the component def, if any.
    pub fn component_slot(&self) -> Option<usize> {
        if self.component_offset >= 0 {
            Some(self.directive_start + self.component_offset as usize)
        } else {
            None
        }
    }

    pub fn directive_count(&self) -> usize {
        self.directive_end - self.directive_start
    }
}
