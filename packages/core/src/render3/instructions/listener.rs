//! Listener Instruction
//!
//! Corresponds to packages/core/src/render3/instructions/listener.ts
//!
//! Wires `(event)="..."` bindings: directive outputs are subscribed through
//! the definition's output accessor, plain element events go through the
//! renderer. Either way the teardown lands on the view cleanup list.

use std::rc::Rc;

use crate::render3::assert::throw_error;
use crate::render3::bindings::Value;
use crate::render3::errors::Result;
use crate::render3::instructions::shared::{native_by_index, store_cleanup};
use crate::render3::interfaces::node::TNodeType;
use crate::render3::state::ViewRuntime;

/// Creation-mode instruction: attaches `callback` to the `event_name` output
/// or native event of the current node.
pub fn listener(
    rt: &mut ViewRuntime,
    event_name: &str,
    callback: Rc<dyn Fn(&Value)>,
) -> Result<()> {
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let tnode_index = match rt.lframe().current_tnode {
        Some(index) => index,
        None => throw_error("listener instruction outside of a node"),
    };

    let output_targets = {
        let tnode = rt.arena.tview(tview_id).node(tnode_index);
        tnode
            .outputs
            .as_ref()
            .and_then(|outputs| outputs.get(event_name))
            .cloned()
    };

    if let Some(targets) = output_targets {
        for (slot, private_name) in targets {
            let def = rt.arena.tview(tview_id).directive_def(slot);
            let Some(get_output) = def.get_output else {
                if rt.dev_mode {
                    throw_error(&format!(
                        "directive '{}' declares outputs but no output accessor",
                        def.name
                    ));
                }
                continue;
            };
            let instance = rt.arena.view(view_id).instance(slot);
            let emitter = {
                let borrowed = instance.borrow();
                get_output(&*borrowed, &private_name)
            };
            let Some(emitter) = emitter else {
                if rt.dev_mode {
                    throw_error(&format!(
                        "output '{private_name}' not found on directive '{}'",
                        def.name
                    ));
                }
                continue;
            };
            let callback = callback.clone();
            let subscription = emitter.subscribe(Box::new(move |value| callback(value)));
            store_cleanup(rt, view_id, Box::new(move || subscription.unsubscribe()));
        }
        return Ok(());
    }

    let is_element = rt.arena.tview(tview_id).node(tnode_index).type_ == TNodeType::Element;
    if is_element {
        let native = native_by_index(rt, view_id, tnode_index)
            .unwrap_or_else(|| throw_error("listener target is not a native element"));
        let renderer = rt.arena.view(view_id).renderer.clone();
        let handle = renderer.listen(native, event_name, callback);
        let cleanup_renderer = renderer.clone();
        store_cleanup(
            rt,
            view_id,
            Box::new(move || cleanup_renderer.unlisten(handle)),
        );
    }
    Ok(())
}
