//! Container Interface
//!
//! Corresponds to packages/core/src/render3/interfaces/container.ts
//!
//! An `LContainer` is the dynamic list of embedded views inserted under a
//! host node, anchored by a native comment. Views declared elsewhere but
//! inserted here are transplanted; the declaration container remembers them
//! in `moved_views` and the insertion side counts the ones that still need a
//! refresh.

use crate::render3::arena::LViewId;
use crate::render3::interfaces::node::TNodeRef;
use crate::render3::interfaces::renderer::RComment;
use crate::render3::interfaces::view::ViewTreeNode;

pub struct LContainer {
    /// Anchor comment the inserted views render around.
    pub native: RComment,
    /// Whether any view declared on this container currently lives in a
    /// different insertion container.
    pub has_transplanted_views: bool,
    /// View this container is attached under.
    pub parent: LViewId,
    /// Sibling link in the parent's child chain.
    pub next: Option<ViewTreeNode>,
    /// Count of descendant views flagged `REFRESH_TRANSPLANTED_VIEW` whose
    /// declaration view is not their insertion view. Incremented when the
    /// flag is set, decremented when it clears; net zero across a tick.
    pub transplanted_views_to_refresh: usize,
    pub host_tnode: TNodeRef,
    /// Views declared on this container that were inserted elsewhere, in
    /// insertion order.
    pub moved_views: Vec<LViewId>,
    /// The inserted views, in insertion order. All share one TView.
    pub views: Vec<LViewId>,
}

impl LContainer {
    pub fn new(native: RComment, parent: LViewId, host_tnode: TNodeRef) -> Self {
        LContainer {
            native,
            has_transplanted_views: false,
            parent,
            next: None,
            transplanted_views_to_refresh: 0,
            host_tnode,
            moved_views: Vec::new(),
            views: Vec::new(),
        }
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }
}
