//! Render3 Instructions
//!
//! Corresponds to packages/core/src/render3/instructions/*.ts
//!
//! The instruction set compiled templates call. Creation-mode instructions
//! materialize nodes and directives; update-mode instructions consume the
//! binding region in compile-time slot order.

pub mod advance;
pub mod element;
pub mod element_container;
pub mod listener;
pub mod pipe;
pub mod property;
pub mod shared;
pub mod template;
pub mod text;

pub use advance::{advance, select_index};
pub use element::{element, element_end, element_start};
pub use element_container::{element_container, element_container_end, element_container_start};
pub use listener::listener;
pub use pipe::{pipe, pipe_bind1, pipe_bind2};
pub use property::{
    attribute, class_prop, host_property, property, property_interpolate1, property_interpolate2,
    style_prop,
};
pub use shared::reference;
pub use template::template;
pub use text::{text, text_interpolate, text_interpolate1, text_interpolate2};
