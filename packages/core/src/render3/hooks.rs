//! Lifecycle Hooks
//!
//! Corresponds to packages/core/src/render3/hooks.ts
//!
//! Hook schedules are flattened onto the TView during the first create pass
//! from the capability slots on each matched definition. The init variants
//! run exactly once per view, gated by the init-phase state machine; check
//! variants run on every refresh. Check-no-changes passes execute none of
//! them.

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::arena::LViewId;
use super::bindings::Value;
use super::errors::Result;
use super::interfaces::definition::{DirectiveDef, HookFn, OnChangesFn};
use super::interfaces::view::{InitPhaseState, TView};
use super::state::ViewRuntime;

/// A single recorded input transition, delivered to `ngOnChanges`-style
/// hooks.
#[derive(Debug, Clone)]
pub struct SimpleChange {
    /// `None` for the first change of a property.
    pub previous_value: Option<Value>,
    pub current_value: Value,
    pub first_change: bool,
}

/// Changes accumulated per directive since the last pre-order flush, keyed
/// by the private property name.
#[derive(Debug, Clone, Default)]
pub struct SimpleChanges {
    pub changes: IndexMap<String, SimpleChange>,
}

impl SimpleChanges {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, prop: &str) -> Option<&SimpleChange> {
        self.changes.get(prop)
    }

    /// Merges a new write: the earliest previous value of the window wins,
    /// the latest current value wins.
    pub fn record(&mut self, prop: &str, change: SimpleChange) {
        match self.changes.get_mut(prop) {
            Some(existing) => existing.current_value = change.current_value,
            None => {
                self.changes.insert(prop.to_string(), change);
            }
        }
    }
}

/// One scheduled hook of a view's shape.
#[derive(Clone)]
pub enum ScheduledHook {
    /// Runs only while the schedule's init phase is still pending.
    Init { slot: usize, hook: HookFn },
    /// Runs on every (non-check-no-changes) pass.
    Check { slot: usize, hook: HookFn },
    /// Changes delivery; runs whenever the directive has pending changes.
    Changes { slot: usize, hook: OnChangesFn },
}

pub type HookSchedule = SmallVec<[ScheduledHook; 4]>;
pub type DestroyHookSchedule = SmallVec<[(usize, HookFn); 2]>;

fn push_hook(schedule: &mut Option<HookSchedule>, hook: ScheduledHook) {
    schedule.get_or_insert_with(SmallVec::new).push(hook);
}

/// Registers the pre-order (onChanges/onInit/doCheck) hooks of the directive
/// occupying `slot`. First create pass only.
pub fn register_pre_order_hooks(tview: &mut TView, def: &DirectiveDef, slot: usize) {
    debug_assert!(tview.first_create_pass);
    if let Some(on_changes) = def.on_changes {
        push_hook(
            &mut tview.pre_order_hooks,
            ScheduledHook::Changes { slot, hook: on_changes },
        );
        push_hook(
            &mut tview.pre_order_check_hooks,
            ScheduledHook::Changes { slot, hook: on_changes },
        );
    }
    if let Some(on_init) = def.on_init {
        push_hook(
            &mut tview.pre_order_hooks,
            ScheduledHook::Init { slot, hook: on_init },
        );
    }
    if let Some(do_check) = def.do_check {
        push_hook(
            &mut tview.pre_order_hooks,
            ScheduledHook::Check { slot, hook: do_check },
        );
        push_hook(
            &mut tview.pre_order_check_hooks,
            ScheduledHook::Check { slot, hook: do_check },
        );
    }
}

/// Registers content, view and destroy hooks of the directive at `slot`.
/// First create pass only.
pub fn register_post_order_hooks(tview: &mut TView, def: &DirectiveDef, slot: usize) {
    debug_assert!(tview.first_create_pass);
    if let Some(hook) = def.after_content_init {
        push_hook(&mut tview.content_hooks, ScheduledHook::Init { slot, hook });
    }
    if let Some(hook) = def.after_content_checked {
        push_hook(&mut tview.content_hooks, ScheduledHook::Check { slot, hook });
        push_hook(
            &mut tview.content_check_hooks,
            ScheduledHook::Check { slot, hook },
        );
    }
    if let Some(hook) = def.after_view_init {
        push_hook(&mut tview.view_hooks, ScheduledHook::Init { slot, hook });
    }
    if let Some(hook) = def.after_view_checked {
        push_hook(&mut tview.view_hooks, ScheduledHook::Check { slot, hook });
        push_hook(
            &mut tview.view_check_hooks,
            ScheduledHook::Check { slot, hook },
        );
    }
    if let Some(hook) = def.on_destroy {
        tview
            .destroy_hooks
            .get_or_insert_with(SmallVec::new)
            .push((slot, hook));
    }
}

/// Which schedule of a view to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    PreOrder,
    Content,
    View,
}

impl HookPhase {
    /// The init-phase gate that must be pending for init hooks of this
    /// schedule to run.
    fn init_gate(self) -> InitPhaseState {
        match self {
            HookPhase::PreOrder => InitPhaseState::OnInitPending,
            HookPhase::Content => InitPhaseState::AfterContentInitPending,
            HookPhase::View => InitPhaseState::AfterViewInitPending,
        }
    }
}

/// Runs the init-and-check schedule of `phase` for `view` and advances the
/// init phase when its gate was pending. No-op lists still advance the
/// phase: a view with no hooks completes initialization all the same.
pub fn execute_init_and_check_hooks(
    rt: &mut ViewRuntime,
    view: LViewId,
    phase: HookPhase,
) -> Result<()> {
    let gate = phase.init_gate();
    let init_active = rt.arena.view(view).init_phase == gate;
    let schedule = {
        let tview = rt.arena.tview(rt.arena.view(view).tview);
        let slot_schedule = match phase {
            HookPhase::PreOrder => &tview.pre_order_hooks,
            HookPhase::Content => &tview.content_hooks,
            HookPhase::View => &tview.view_hooks,
        };
        slot_schedule.clone()
    };
    let result = match schedule {
        Some(hooks) => run_schedule(rt, view, &hooks, init_active),
        None => Ok(()),
    };
    if init_active && result.is_ok() {
        let lview = rt.arena.view_mut(view);
        lview.init_phase = lview.init_phase.next();
    }
    result
}

/// Runs the check-only schedule of `phase` for `view`.
pub fn execute_check_hooks(rt: &mut ViewRuntime, view: LViewId, phase: HookPhase) -> Result<()> {
    let schedule = {
        let tview = rt.arena.tview(rt.arena.view(view).tview);
        let slot_schedule = match phase {
            HookPhase::PreOrder => &tview.pre_order_check_hooks,
            HookPhase::Content => &tview.content_check_hooks,
            HookPhase::View => &tview.view_check_hooks,
        };
        slot_schedule.clone()
    };
    match schedule {
        Some(hooks) => run_schedule(rt, view, &hooks, false),
        None => Ok(()),
    }
}

fn run_schedule(
    rt: &mut ViewRuntime,
    view: LViewId,
    hooks: &HookSchedule,
    init_active: bool,
) -> Result<()> {
    for entry in hooks {
        match entry {
            ScheduledHook::Init { slot, hook } => {
                if init_active {
                    call_hook(rt, view, *slot, *hook)?;
                }
            }
            ScheduledHook::Check { slot, hook } => {
                call_hook(rt, view, *slot, *hook)?;
            }
            ScheduledHook::Changes { slot, hook } => {
                let pending = {
                    let lview = rt.arena.view_mut(view);
                    let position = lview
                        .on_changes_state
                        .pending
                        .iter()
                        .position(|(s, _)| s == slot);
                    position.map(|i| lview.on_changes_state.pending.remove(i).1)
                };
                if let Some(changes) = pending {
                    if !changes.is_empty() {
                        let instance = rt.arena.view(view).instance(*slot);
                        let mut borrowed = instance.borrow_mut();
                        hook(&mut *borrowed, &changes)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn call_hook(rt: &mut ViewRuntime, view: LViewId, slot: usize, hook: HookFn) -> Result<()> {
    let instance = rt.arena.view(view).instance(slot);
    let mut borrowed = instance.borrow_mut();
    hook(&mut *borrowed)
}

/// Per-view onChanges bookkeeping: what is waiting to be delivered, and the
/// last delivered value per (slot, private name) so later changes carry a
/// previous value.
#[derive(Default)]
pub struct OnChangesState {
    pub pending: Vec<(usize, SimpleChanges)>,
    pub previous: std::collections::HashMap<(usize, String), Value>,
}

impl OnChangesState {
    /// Records an input write for delivery at the next pre-order flush.
    pub fn record(&mut self, slot: usize, prop: &str, value: &Value) {
        let key = (slot, prop.to_string());
        let previous = self.previous.get(&key).cloned();
        let change = SimpleChange {
            first_change: previous.is_none(),
            previous_value: previous,
            current_value: value.clone(),
        };
        self.previous.insert(key, value.clone());
        match self.pending.iter_mut().find(|(s, _)| *s == slot) {
            Some((_, changes)) => changes.record(prop, change),
            None => {
                let mut changes = SimpleChanges::default();
                changes.record(prop, change);
                self.pending.push((slot, changes));
            }
        }
    }
}
