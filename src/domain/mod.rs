//! Domain layer: entities and canvas algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod drag;
pub mod entities;
pub mod error;
pub mod fit;
pub mod layout;
pub mod viewport;

pub use arena::{Forest, TreeNode};
pub use builder::TreeBuilder;
pub use drag::{DragController, DragSession, Gesture, MoveOutcome};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use fit::{BoundingBox, FitConfig, FitToView};
pub use layout::{toggle_expanded, Connection, LayoutConfig, LayoutEngine, VisibleNode};
pub use viewport::{Viewport, MAX_SCALE, MIN_SCALE};
