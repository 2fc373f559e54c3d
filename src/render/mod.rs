//! Frame-driven rendering contract
//!
//! [`AvatarRenderer`] is what the state machine drives and what the host's
//! display loop calls once per frame. [`FrameRenderer`] implements it on top
//! of an abstract [`FrameSurface`]; [`FrameLoop`] paces it.

pub mod frame_loop;
pub mod renderer;
pub mod surface;

pub use frame_loop::FrameLoop;
pub use renderer::{FrameDescriptor, FrameRenderer, MotionSample};
pub use surface::{FrameSurface, RecordingSurface};

use crate::model::LoadedModel;

/// Rendering capability for one character.
///
/// Implementations must absorb misuse: drawing while stopped or without a
/// model is a no-op, never a fault.
pub trait AvatarRenderer {
    fn is_rendering(&self) -> bool;

    /// Target frames per second
    fn frame_rate(&self) -> f64;

    fn set_frame_rate(&mut self, fps: f64);

    /// Begin frame delivery. Idempotent.
    fn start(&mut self);

    /// Halt frame delivery. Idempotent.
    fn stop(&mut self);

    /// Evaluate pending motion and physics, then submit one frame
    fn draw_frame(&mut self);

    /// Replace the active model, discarding playback tied to the old one
    fn update_model(&mut self, model: LoadedModel);

    /// Play a motion by logical name
    fn play_motion(&mut self, motion: &str);

    /// Show an expression by logical name
    fn set_expression(&mut self, expression: &str);
}
