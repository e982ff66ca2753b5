//! Application layer: the canvas session and its persistence
//!
//! Services here combine the pure domain algorithms with the key-value
//! store boundary. Nothing in this layer touches the filesystem directly.

pub mod error;
pub mod error_ext;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
