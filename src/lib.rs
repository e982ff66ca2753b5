//! doccanvas: layout, viewport and drag state for a hierarchical document canvas.
//!
//! Layers, innermost first:
//! - `domain`: forest building, tree layout, viewport math, gestures, fit-to-view
//! - `application`: the canvas session and per-user persistence
//! - `infrastructure`: key-value stores and wiring
//! - `cli`: the command-line front end

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
