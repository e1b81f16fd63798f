//! Template Instruction
//!
//! Corresponds to packages/core/src/render3/instructions/template.ts
//!
//! Declares an embedded template: builds its TView on the first create pass,
//! anchors an LContainer at the node and resolves structural directives.
//! The embedded views themselves are created later through the container
//! API.

use crate::render3::errors::Result;
use crate::render3::instructions::shared::{
    create_directives_instances, create_tview, get_or_create_tnode, native_render_parent,
    resolve_directives, save_resolved_locals_in_data,
};
use crate::render3::interfaces::container::LContainer;
use crate::render3::interfaces::definition::{
    ComponentTemplate, DirectiveDefListOrFactory, PipeDefListOrFactory, TConstantsOrFactory,
};
use crate::render3::interfaces::node::{TNodeRef, TNodeType};
use crate::render3::interfaces::view::{SlotValue, TViewType, ViewTreeNode, HEADER_OFFSET};
use crate::render3::node_manipulation::add_to_view_tree;
use crate::render3::state::ViewRuntime;

/// Creation-mode instruction: `<ng-template>` and structural-directive
/// containers.
#[allow(clippy::too_many_arguments)]
pub fn template(
    rt: &mut ViewRuntime,
    index: usize,
    template_fn: Option<ComponentTemplate>,
    decls: usize,
    vars: usize,
    tag_name: Option<&str>,
    attrs_index: Option<usize>,
    local_refs: Option<&[(String, String)]>,
) -> Result<()> {
    let index = HEADER_OFFSET + index;
    let view_id = rt.active_view_id();
    let tview_id = rt.active_tview_id();
    let first_create_pass = rt.arena.tview(tview_id).first_create_pass;

    let attrs = attrs_index.and_then(|i| {
        rt.arena
            .tview(tview_id)
            .consts
            .as_ref()
            .and_then(|consts| consts.get(i).cloned())
    });

    get_or_create_tnode(
        rt,
        index,
        TNodeType::Container,
        tag_name.map(|t| t.to_string()),
        attrs,
    );

    if first_create_pass {
        // The embedded shape shares the declaring view's registries, consts
        // and schemas.
        let (directives, pipes, consts, schemas) = {
            let tview = rt.arena.tview(tview_id);
            (
                tview
                    .directive_registry
                    .clone()
                    .map(DirectiveDefListOrFactory::List),
                tview.pipe_registry.clone().map(PipeDefListOrFactory::List),
                tview.consts.clone().map(TConstantsOrFactory::List),
                tview.schemas.clone(),
            )
        };
        let embedded_tview = create_tview(
            rt,
            TViewType::Embedded,
            Some(TNodeRef {
                tview: tview_id,
                index,
            }),
            template_fn,
            decls,
            vars,
            directives,
            pipes,
            None,
            schemas,
            consts,
        );
        rt.arena.tview_mut(tview_id).node_mut(index).tview = Some(embedded_tview);
        resolve_directives(rt, index, local_refs)?;
    }

    let renderer = rt.arena.view(view_id).renderer.clone();
    let anchor = renderer.create_comment("container");
    let container = rt.arena.insert_container(LContainer::new(
        anchor,
        view_id,
        TNodeRef {
            tview: tview_id,
            index,
        },
    ));
    rt.arena.view_mut(view_id).slots[index] = SlotValue::Container(container);
    if let Some(parent) = native_render_parent(rt, view_id, index) {
        renderer.append_child(parent, anchor);
    }
    add_to_view_tree(rt, view_id, ViewTreeNode::Container(container));

    let is_directive_host = rt.arena.tview(tview_id).node(index).is_directive_host();
    if is_directive_host {
        create_directives_instances(rt, index)?;
    }
    if local_refs.is_some() {
        save_resolved_locals_in_data(rt, index);
    }
    // Containers hold no inline children; the cursor moves on as a sibling.
    rt.lframe_mut().is_parent = false;
    Ok(())
}
