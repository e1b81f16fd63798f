//! Sanitizer Interface
//!
//! Corresponds to packages/core/src/sanitization/sanitizer.ts
//!
//! Invoked immediately before a property assignment the compiler marked as
//! risky; the returned value is what actually reaches the renderer.

use crate::render3::bindings::Value;

/// `(value, tag_name, prop_name) -> safe value`
pub type SanitizeFn = fn(&Value, &str, &str) -> Value;
