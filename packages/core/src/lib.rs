#![deny(clippy::all)]

/**
 * Angular Rust Runtime Core
 *
 * The render3 view runtime: shape tables, instance buffers, change
 * detection, lifecycle dispatch and host bindings. Consumes the view
 * definitions produced by the compiler packages and an embedder-provided
 * `Renderer`; it never touches a DOM of its own.
 */
pub mod event_emitter;
pub mod render3;
mod version;

pub use event_emitter::EventEmitter;
pub use render3::errors::{ErrorHandler, Result, RuntimeError, RuntimeErrorCode};
pub use render3::state::ViewRuntime;
pub use version::VERSION;
