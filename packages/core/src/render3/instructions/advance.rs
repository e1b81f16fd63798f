//! Advance Instruction
//!
//! Corresponds to packages/core/src/render3/instructions/advance.ts

use crate::render3::assert::assert_greater_than_or_equal;
use crate::render3::interfaces::view::HEADER_OFFSET;
use crate::render3::state::ViewRuntime;

/// Update-mode instruction: moves the selected index forward by `delta`
/// declaration slots. The selected index starts at the first declared node
/// when an update pass begins.
pub fn advance(rt: &mut ViewRuntime, delta: usize) {
    if rt.dev_mode {
        assert_greater_than_or_equal(delta, 1, "advance delta must be positive");
    }
    let current = rt.selected_tnode_index();
    rt.set_selected_index((current + delta) as isize);
}

/// Sets the selected index to an absolute declaration index. Used when a
/// pass starts and by the host-binding interpreter.
pub fn select_index(rt: &mut ViewRuntime, index: usize) {
    debug_assert!(index >= HEADER_OFFSET);
    rt.set_selected_index(index as isize);
}
