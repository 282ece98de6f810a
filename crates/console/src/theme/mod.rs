//! Template rendering.

mod engine;

pub use engine::ThemeEngine;
