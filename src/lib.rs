//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`bridge-traits`, `core-runtime`, `core-surface`). Host
//! applications can depend on `vidsurface-workspace` and enable the documented
//! features without needing to wire each crate individually.

pub use bridge_traits;
pub use core_runtime;

#[cfg(feature = "surface")]
pub use core_surface;
