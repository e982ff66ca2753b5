//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (KeyValueStore)
//! but are themselves concrete structs, not traits.

mod canvas;
mod persistence;

pub use canvas::CanvasService;
pub use persistence::PersistenceAdapter;
