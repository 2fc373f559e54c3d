//! Companion Avatar - animated study companion engine
//!
//! Resolves a character model's asset manifest into concrete files, drives
//! the character through behavioural states from study and reaction events,
//! and feeds a frame-synchronous renderer:
//! - [`model`] locates and validates model assets
//! - [`avatar`] holds the animation state machine and its timers
//! - [`render`] defines the renderer contract and frame pacing

pub mod avatar;
pub mod config;
pub mod error;
pub mod model;
pub mod render;

pub use avatar::{AnimationStateMachine, CharacterState, Expression, ReactionEvent, StudyPhase};
pub use config::Config;
pub use error::{CompanionError, ModelError, Result};
pub use model::{LoadedModel, ModelLoader};
pub use render::{AvatarRenderer, FrameLoop, FrameRenderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
