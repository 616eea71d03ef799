//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the video surface crates:
//! - Logging and tracing infrastructure
//! - Capability configuration
//! - Event bus system
//!
//! ## Overview
//!
//! This crate establishes the logging conventions, the fail-fast capability
//! wiring and the event broadcasting mechanism used by `core-surface`. It has
//! no knowledge of the session state machine itself.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
