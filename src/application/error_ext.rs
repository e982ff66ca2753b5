//! Error conversion helpers for store operations
//!
//! Provides an extension trait for attaching the store key to I/O errors.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add store-key context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// store.set(&key, &json).with_key_context(&key)?;
    /// ```
    fn with_key_context(self, key: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_key_context(self, key: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Persistence {
            key: key.to_string(),
            source: Box::new(e),
        })
    }
}
