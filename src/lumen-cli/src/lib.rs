//! Lumen CLI library.
//!
//! - `cli/` - argument parsing and command dispatch
//! - `render` - incremental terminal output

pub mod cli;
pub mod render;
