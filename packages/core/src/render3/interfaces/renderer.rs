//! Renderer Interface
//!
//! Corresponds to packages/core/src/render3/interfaces/renderer.ts
//!
//! The runtime never owns a DOM. Every native mutation goes through this
//! seam; nodes are opaque handles minted by the renderer implementation.

use std::rc::Rc;

use crate::render3::bindings::Value;
use crate::render3::interfaces::definition::DirectiveDef;

/// Opaque handle to a native node owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RNode(pub u64);

/// Native element handle. Same representation as [`RNode`]; the alias keeps
/// signatures readable.
pub type RElement = RNode;
/// Native text-node handle.
pub type RText = RNode;
/// Native comment handle (container anchors).
pub type RComment = RNode;

/// Handle for a native event listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RListener(pub u64);

pub trait Renderer {
    fn create_element(&self, name: &str, namespace: Option<&str>) -> RElement;
    fn create_text(&self, value: &str) -> RText;
    fn create_comment(&self, value: &str) -> RComment;

    fn set_property(&self, el: RElement, name: &str, value: &Value);
    fn set_attribute(&self, el: RElement, name: &str, value: &str, namespace: Option<&str>);
    fn remove_attribute(&self, el: RElement, name: &str, namespace: Option<&str>);
    fn add_class(&self, el: RElement, name: &str);
    fn remove_class(&self, el: RElement, name: &str);
    fn set_style(&self, el: RElement, style: &str, value: &str);
    fn remove_style(&self, el: RElement, style: &str);
    /// Updates the text of a text or comment node.
    fn set_value(&self, node: RNode, value: &str);

    fn append_child(&self, parent: RElement, child: RNode);
    fn insert_before(&self, parent: RElement, child: RNode, before: Option<RNode>);
    fn remove_child(&self, parent: RElement, child: RNode);
    fn parent_node(&self, node: RNode) -> Option<RElement>;

    /// Locates (and by default empties) the element a root component is
    /// bootstrapped onto.
    fn select_root_element(&self, selector: &str, preserve_content: bool) -> RElement;

    fn listen(&self, el: RElement, event_name: &str, callback: Rc<dyn Fn(&Value)>) -> RListener;
    fn unlisten(&self, listener: RListener);

    /// Capability probe for the dev-mode unknown-property check: whether the
    /// native element exposes `name` as a settable property. Renderers that
    /// cannot know are expected to return `true`.
    fn has_property(&self, _el: RElement, _name: &str) -> bool {
        true
    }

    fn destroy_node(&self, _node: RNode) {}
}

pub trait RendererFactory {
    fn create_renderer(
        &self,
        host_element: Option<RElement>,
        def: Option<&DirectiveDef>,
    ) -> Rc<dyn Renderer>;

    /// Brackets a top-level change-detection invocation. `end` is guaranteed
    /// on all exit paths, including error exits.
    fn begin(&self) {}
    fn end(&self) {}
}
