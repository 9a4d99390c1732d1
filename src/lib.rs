//! carto-rs
//! ========
//!
//! Umbrella crate for the workspace. Re-exports [`carto_core`] so the demos
//! under `demos/` can use a single import path.

pub use carto_core::*;
