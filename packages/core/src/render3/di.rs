//! Node Injector
//!
//! Corresponds to packages/core/src/render3/di.ts
//!
//! The full DI container is an external collaborator; this module is only
//! the node-level seam. Directive resolution publishes every matched type by
//! storing its def in `TView.data` and its instance in the directive range,
//! which is exactly the index this lookup walks: the node's own range, then
//! ancestor nodes, then the parent view chain, finally the view injector and
//! the runtime's root injector.

use std::any::TypeId;

use super::arena::LViewId;
use super::interfaces::injector::InstanceHandle;
use super::interfaces::view::TData;
use super::state::ViewRuntime;

/// Injection point anchored at one node of one view.
#[derive(Debug, Clone, Copy)]
pub struct NodeInjector {
    pub view: LViewId,
    pub tnode_index: usize,
}

impl NodeInjector {
    pub fn new(view: LViewId, tnode_index: usize) -> Self {
        NodeInjector { view, tnode_index }
    }

    /// Resolves `token` against the directive instances published along the
    /// node/view ancestor chain.
    pub fn get(&self, rt: &ViewRuntime, token: TypeId) -> Option<InstanceHandle> {
        let mut view_id = self.view;
        let mut tnode_index = Some(self.tnode_index);

        loop {
            let lview = rt.arena.try_view(view_id)?;
            let tview = rt.arena.tview(lview.tview);

            while let Some(index) = tnode_index {
                let tnode = tview.node(index);
                for slot in tnode.directive_start..tnode.directive_end {
                    if let TData::DirectiveDef(def) = &tview.data[slot] {
                        if def.type_id == token {
                            return Some(lview.instance(slot));
                        }
                    }
                }
                tnode_index = tnode.parent;
            }

            if let Some(injector) = &lview.embedded_view_injector {
                if let Some(instance) = injector.get(token) {
                    return Some(instance);
                }
            }

            match lview.t_host {
                Some(host) => {
                    tnode_index = Some(host.index);
                    view_id = match lview.declaration_view.or_else(|| match lview.parent {
                        Some(super::interfaces::view::ViewTreeNode::View(parent)) => Some(parent),
                        Some(super::interfaces::view::ViewTreeNode::Container(container)) => {
                            rt.arena.try_container(container).map(|c| c.parent)
                        }
                        None => None,
                    }) {
                        Some(parent) => parent,
                        None => break,
                    };
                }
                None => break,
            }
        }

        let lview = rt.arena.try_view(self.view)?;
        if let Some(injector) = &lview.injector {
            if let Some(instance) = injector.get(token) {
                return Some(instance);
            }
        }
        rt.root_injector.as_ref().and_then(|inj| inj.get(token))
    }
}
