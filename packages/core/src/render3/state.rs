//! Instruction State
//!
//! Corresponds to packages/core/src/render3/state.ts
//!
//! The upstream keeps the active traversal in module-level mutable state;
//! here it is a frame stack owned by the [`ViewRuntime`], which every
//! instruction receives by `&mut`. Exactly one frame per LView may be live
//! at a time; re-entering a view whose frame is still on the stack is a
//! programmer error caught in dev mode.

use std::rc::Rc;

use crate::render3::arena::{LViewId, TViewId, ViewArena};
use crate::render3::assert::throw_error;
use crate::render3::errors::ErrorHandler;
use crate::render3::interfaces::injector::Injector;
use crate::render3::interfaces::renderer::RendererFactory;
use crate::render3::interfaces::sanitizer::SanitizeFn;
use crate::render3::interfaces::view::{LView, TView, HEADER_OFFSET};

/// Cursor state for one active view traversal.
#[derive(Debug, Clone, Copy)]
pub struct LFrame {
    pub view: LViewId,
    pub tview: TViewId,
    /// Node cursor: the TNode most recently materialized or closed.
    pub current_tnode: Option<usize>,
    /// Whether `current_tnode` is a parent expecting children (true) or a
    /// finished sibling (false).
    pub is_parent: bool,
    /// Next binding slot consumed by update-mode instructions.
    pub binding_index: usize,
    /// Start of the binding region the current bindings are relative to;
    /// moved into the expando while host bindings execute.
    pub binding_root_index: usize,
    /// Declaration index of the element bindings apply to; -1 when nothing
    /// is selected.
    pub selected_index: isize,
    /// Directive slot whose host bindings are executing; -1 outside of them.
    pub current_directive_index: isize,
    pub in_i18n: bool,
}

/// The bounded context handle for the whole runtime: arena, frame stack and
/// the process-wide configuration the upstream keeps in module scope.
pub struct ViewRuntime {
    pub arena: ViewArena,
    frames: Vec<LFrame>,
    pub renderer_factory: Rc<dyn RendererFactory>,
    pub root_injector: Option<Rc<dyn Injector>>,
    pub sanitizer: Option<SanitizeFn>,
    pub error_handler: Option<Rc<dyn ErrorHandler>>,
    /// Enables assertions, debug metadata and check-no-changes re-runs.
    pub dev_mode: bool,
    check_no_changes_mode: bool,
}

impl ViewRuntime {
    pub fn new(renderer_factory: Rc<dyn RendererFactory>) -> Self {
        ViewRuntime {
            arena: ViewArena::new(),
            frames: Vec::new(),
            renderer_factory,
            root_injector: None,
            sanitizer: None,
            error_handler: None,
            dev_mode: cfg!(debug_assertions),
            check_no_changes_mode: false,
        }
    }

    // ---- frame stack ------------------------------------------------------

    /// Pushes a traversal frame for `view`. Cursors start in the state the
    /// creation/refresh passes expect: no node, no selection, binding index
    /// at the view's binding start.
    pub(crate) fn enter_view(&mut self, view: LViewId) {
        if self.dev_mode && self.frames.iter().any(|frame| frame.view == view) {
            throw_error("a frame for this LView is already active (recursive entry)");
        }
        let lview = self.arena.view(view);
        let tview_id = lview.tview;
        let binding_start = self.arena.tview(tview_id).binding_start_index;
        self.frames.push(LFrame {
            view,
            tview: tview_id,
            current_tnode: None,
            is_parent: true,
            binding_index: binding_start,
            binding_root_index: binding_start,
            selected_index: -1,
            current_directive_index: -1,
            in_i18n: false,
        });
    }

    /// Pops the active frame. Runs on every exit path of a pass so the next
    /// tick starts from a clean stack.
    pub(crate) fn leave_view(&mut self) {
        if self.frames.pop().is_none() && self.dev_mode {
            throw_error("leave_view without a matching enter_view");
        }
    }

    pub(crate) fn lframe(&self) -> &LFrame {
        match self.frames.last() {
            Some(frame) => frame,
            None => throw_error("no active view frame"),
        }
    }

    pub(crate) fn lframe_mut(&mut self) -> &mut LFrame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => throw_error("no active view frame"),
        }
    }

    pub fn active_view_id(&self) -> LViewId {
        self.lframe().view
    }

    pub(crate) fn active_tview_id(&self) -> TViewId {
        self.lframe().tview
    }

    pub(crate) fn active_view(&self) -> &LView {
        self.arena.view(self.lframe().view)
    }

    pub(crate) fn active_tview(&self) -> &TView {
        self.arena.tview(self.lframe().tview)
    }

    // ---- cursors ----------------------------------------------------------

    /// Consumes and returns the next binding slot.
    pub(crate) fn next_binding_index(&mut self) -> usize {
        let frame = self.lframe_mut();
        let index = frame.binding_index;
        frame.binding_index += 1;
        index
    }

    pub(crate) fn selected_index(&self) -> isize {
        self.lframe().selected_index
    }

    pub(crate) fn set_selected_index(&mut self, index: isize) {
        self.lframe_mut().selected_index = index;
    }

    /// The TNode index bindings currently apply to; header offset when no
    /// explicit `advance` ran yet.
    pub(crate) fn selected_tnode_index(&self) -> usize {
        let selected = self.lframe().selected_index;
        if selected < 0 {
            HEADER_OFFSET
        } else {
            selected as usize
        }
    }

    // ---- modes ------------------------------------------------------------

    pub fn is_in_check_no_changes_mode(&self) -> bool {
        self.check_no_changes_mode
    }

    pub(crate) fn set_check_no_changes_mode(&mut self, enabled: bool) {
        self.check_no_changes_mode = enabled;
    }
}
