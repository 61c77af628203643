use crate::geometry::Size;
use serde::{Deserialize, Serialize};

/// Configuration the host passes when constructing a
/// [`FlowDesigner`](crate::FlowDesigner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Canvas viewport size, used for grid generation (default: 800x600).
    pub view_size: Size,
    /// Grid spacing in canvas units (default: 20.0).
    pub grid_size: f32,
    /// Panic when a connection refers to a missing block or pin instead of
    /// dropping it (default: on in debug builds).
    pub strict_references: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            view_size: Size::new(800.0, 600.0),
            grid_size: 20.0,
            strict_references: cfg!(debug_assertions),
        }
    }
}

impl EditorConfig {
    pub fn new(view_size: Size, grid_size: f32) -> Self {
        Self {
            view_size,
            grid_size,
            ..Self::default()
        }
    }

    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }
}
