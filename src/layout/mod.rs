//! Treemap geometry.

pub mod treemap;

pub use treemap::{layout, LayoutNode, LayoutOptions};
