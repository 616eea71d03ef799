//! # Surface Error Types
//!
//! Errors surfaced to the host by a playback session.
//!
//! Stale engine callbacks are deliberately absent: they are filtered out by
//! identity in the dispatcher and never reach the host.

use crate::callback::EngineId;
use bridge_traits::{BridgeError, EngineFailure};
use std::fmt;
use thiserror::Error;

/// Step of the bind algorithm that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindStage {
    /// `EngineFactory::create`
    Construct,
    /// Binding the render surface to the new engine
    AttachSurface,
    /// Handing the resolved playlist to the engine
    SetMediaItems,
    /// Starting asynchronous preparation
    Prepare,
}

impl fmt::Display for BindStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindStage::Construct => "engine construction",
            BindStage::AttachSurface => "surface attachment",
            BindStage::SetMediaItems => "media item binding",
            BindStage::Prepare => "engine preparation",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while driving a playback session.
#[derive(Error, Debug)]
pub enum SurfaceError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// `resume`/`acquire` was called before any url was prepared.
    #[error("No media source prepared")]
    SourceUnresolved,

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// Creating or wiring a new engine failed. The partial engine has already
    /// been torn down.
    #[error("Engine bind failed during {stage}: {source}")]
    EngineBind {
        stage: BindStage,
        #[source]
        source: BridgeError,
    },

    /// The bound engine reported a runtime failure. The session stays bound.
    #[error("Playback error on engine {engine}: {failure}")]
    Playback {
        engine: EngineId,
        failure: EngineFailure,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Invalid surface configuration: {0}")]
    InvalidConfig(String),
}

impl SurfaceError {
    pub(crate) fn bind(stage: BindStage, source: BridgeError) -> Self {
        SurfaceError::EngineBind { stage, source }
    }

    /// Returns `true` if the session was left without an engine.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SurfaceError::EngineBind { .. })
    }

    /// Returns `true` if the operation simply did nothing and can be retried
    /// once the host supplies what was missing.
    pub fn is_deferred(&self) -> bool {
        matches!(self, SurfaceError::SourceUnresolved)
    }

    /// Engine the error relates to, when there was one.
    pub fn engine(&self) -> Option<EngineId> {
        match self {
            SurfaceError::Playback { engine, .. } => Some(*engine),
            _ => None,
        }
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SurfaceError>;
