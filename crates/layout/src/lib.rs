//! Block and inline-text layout at a fixed viewport width.

pub mod engine;
pub mod style_values;

pub use engine::{LayoutBox, layout_document, serialize_layout};
