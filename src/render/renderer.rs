//! Frame-synchronous model renderer.
//!
//! Motion and expression commands only update pending state; the work is
//! applied on the next [`AvatarRenderer::draw_frame`], which then hands a
//! [`FrameDescriptor`] to the surface.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use super::surface::FrameSurface;
use super::AvatarRenderer;
use crate::avatar::Expression;
use crate::config::MAX_FRAME_RATE;
use crate::model::LoadedModel;

/// Default target frame rate
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

/// Position within the playing motion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionSample {
    pub path: PathBuf,
    pub elapsed: Duration,
}

/// Everything needed to present one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDescriptor {
    pub index: u64,
    pub model_id: String,
    /// Time step this frame advanced by
    pub delta: Duration,
    pub motion: Option<MotionSample>,
    pub expression: Option<PathBuf>,
    /// Physics steps evaluated since the model was loaded
    pub physics_steps: u64,
}

/// Renderer that evaluates the active model once per frame and presents it
/// to a [`FrameSurface`].
#[derive(Debug)]
pub struct FrameRenderer<S: FrameSurface> {
    surface: S,
    rendering: bool,
    frame_rate: f64,
    model: Option<LoadedModel>,
    pending_motion: Option<PathBuf>,
    playback: Option<MotionSample>,
    expression: Option<PathBuf>,
    physics_steps: u64,
    frame_index: u64,
}

impl<S: FrameSurface> FrameRenderer<S> {
    /// Create a stopped renderer with no model
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            rendering: false,
            frame_rate: DEFAULT_FRAME_RATE,
            model: None,
            pending_motion: None,
            playback: None,
            expression: None,
            physics_steps: 0,
            frame_index: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    /// Motion currently playing (not one still waiting for the next frame)
    pub fn active_motion(&self) -> Option<&Path> {
        self.playback.as_ref().map(|p| p.path.as_path())
    }

    /// Motion requested but not yet picked up by a frame
    pub fn pending_motion(&self) -> Option<&Path> {
        self.pending_motion.as_deref()
    }

    pub fn active_expression(&self) -> Option<&Path> {
        self.expression.as_deref()
    }

    /// Frames submitted to the surface so far
    pub fn frames_drawn(&self) -> u64 {
        self.frame_index
    }

    fn frame_delta(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate)
    }

    fn evaluate_motion(&mut self, delta: Duration) {
        if let Some(path) = self.pending_motion.take() {
            tracing::debug!("Starting motion {}", path.display());
            self.playback = Some(MotionSample {
                path,
                elapsed: Duration::ZERO,
            });
        } else if let Some(playback) = self.playback.as_mut() {
            playback.elapsed += delta;
        }
    }
}

/// Match a logical expression name against the model's expression assets.
///
/// Preset names go through their asset file name; anything else is compared
/// with the asset's file stem (`f03` for `f03.exp3.json`).
fn find_expression(model: &LoadedModel, name: &str) -> Option<PathBuf> {
    if let Ok(preset) = name.parse::<Expression>() {
        if let Some(path) = model.find_expression(preset.asset_name()) {
            return Some(path.to_path_buf());
        }
    }

    model
        .expressions()
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.split('.').next())
                == Some(name)
        })
        .cloned()
}

impl<S: FrameSurface> AvatarRenderer for FrameRenderer<S> {
    fn is_rendering(&self) -> bool {
        self.rendering
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn set_frame_rate(&mut self, fps: f64) {
        if !fps.is_finite() || fps <= 0.0 {
            tracing::warn!("Ignoring invalid frame rate: {}", fps);
            return;
        }
        self.frame_rate = fps.min(MAX_FRAME_RATE);
    }

    fn start(&mut self) {
        if self.rendering {
            return;
        }
        self.rendering = true;
        tracing::info!("Rendering started at {} fps", self.frame_rate);
    }

    fn stop(&mut self) {
        if !self.rendering {
            return;
        }
        self.rendering = false;
        tracing::info!("Rendering stopped after {} frames", self.frame_index);
    }

    fn draw_frame(&mut self) {
        if !self.rendering {
            return;
        }
        let Some((model_id, has_physics)) = self
            .model
            .as_ref()
            .map(|m| (m.id().to_string(), m.physics_path().is_some()))
        else {
            return;
        };

        let delta = self.frame_delta();
        self.evaluate_motion(delta);
        if has_physics {
            self.physics_steps += 1;
        }

        let frame = FrameDescriptor {
            index: self.frame_index,
            model_id,
            delta,
            motion: self.playback.clone(),
            expression: self.expression.clone(),
            physics_steps: self.physics_steps,
        };
        self.surface.present(&frame);
        self.frame_index += 1;
    }

    fn update_model(&mut self, model: LoadedModel) {
        tracing::info!("Renderer model set to '{}'", model.name());
        self.model = Some(model);
        self.pending_motion = None;
        self.playback = None;
        self.expression = None;
        self.physics_steps = 0;
    }

    fn play_motion(&mut self, motion: &str) {
        let Some(model) = self.model.as_ref() else {
            tracing::debug!("No model loaded, ignoring motion '{}'", motion);
            return;
        };

        match model.find_motion(motion) {
            Some(path) => self.pending_motion = Some(path.to_path_buf()),
            None => tracing::warn!(
                "Motion '{}' is not provided by model '{}'",
                motion,
                model.name()
            ),
        }
    }

    fn set_expression(&mut self, expression: &str) {
        let Some(model) = self.model.as_ref() else {
            tracing::debug!("No model loaded, ignoring expression '{}'", expression);
            return;
        };

        match find_expression(model, expression) {
            Some(path) => self.expression = Some(path),
            None => tracing::warn!(
                "Expression '{}' is not provided by model '{}'",
                expression,
                model.name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::CharacterState;
    use crate::model::{fixture, resolve};
    use crate::render::RecordingSurface;

    fn renderer_with_model() -> (tempfile::TempDir, FrameRenderer<RecordingSurface>) {
        let dir = fixture::haru();
        let mut renderer = FrameRenderer::new(RecordingSurface::new());
        renderer.update_model(resolve(dir.path()).unwrap());
        (dir, renderer)
    }

    #[test]
    fn test_draw_without_start_is_noop() {
        let (_dir, mut renderer) = renderer_with_model();
        renderer.draw_frame();
        assert!(renderer.surface().frames().is_empty());
    }

    #[test]
    fn test_draw_without_model_is_noop() {
        let mut renderer = FrameRenderer::new(RecordingSurface::new());
        renderer.start();
        renderer.play_motion("idle.motion3.json");
        renderer.set_expression("happy");
        renderer.draw_frame();
        assert!(renderer.surface().frames().is_empty());
        assert_eq!(renderer.frames_drawn(), 0);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut renderer = FrameRenderer::new(RecordingSurface::new());
        renderer.start();
        renderer.start();
        assert!(renderer.is_rendering());
        renderer.stop();
        renderer.stop();
        assert!(!renderer.is_rendering());
    }

    #[test]
    fn test_motion_applied_on_next_frame() {
        let (_dir, mut renderer) = renderer_with_model();
        renderer.start();
        renderer.play_motion("idle.motion3.json");
        assert!(renderer.pending_motion().is_some());
        assert!(renderer.active_motion().is_none());

        renderer.draw_frame();
        renderer.draw_frame();

        let frames = renderer.surface().frames();
        assert_eq!(frames.len(), 2);
        let first = frames[0].motion.as_ref().unwrap();
        assert!(first.path.ends_with("idle.motion3.json"));
        assert_eq!(first.elapsed, Duration::ZERO);
        assert_eq!(
            frames[1].motion.as_ref().unwrap().elapsed,
            Duration::from_secs_f64(1.0 / 60.0)
        );
    }

    #[test]
    fn test_unknown_motion_is_ignored() {
        let (_dir, mut renderer) = renderer_with_model();
        renderer.play_motion("wave.motion3.json");
        assert!(renderer.pending_motion().is_none());
    }

    #[test]
    fn test_state_motions_resolve_alongside_idle_group() {
        let (_dir, mut renderer) = renderer_with_model();
        for state in CharacterState::ALL {
            let Some(motion) = state.motion_asset() else {
                continue;
            };
            renderer.play_motion(motion);
            assert!(
                renderer.pending_motion().is_some_and(|p| p.ends_with(motion)),
                "{state}"
            );
        }
    }

    #[test]
    fn test_expression_resolution() {
        let (_dir, mut renderer) = renderer_with_model();

        renderer.set_expression("sad");
        assert!(renderer.active_expression().unwrap().ends_with("f03.exp3.json"));

        renderer.set_expression("f02");
        assert!(renderer.active_expression().unwrap().ends_with("f02.exp3.json"));

        // Model has no f07 (tired): keep showing the previous expression
        renderer.set_expression("tired");
        assert!(renderer.active_expression().unwrap().ends_with("f02.exp3.json"));
    }

    #[test]
    fn test_physics_steps_per_frame() {
        let (_dir, mut renderer) = renderer_with_model();
        renderer.start();
        for _ in 0..3 {
            renderer.draw_frame();
        }
        assert_eq!(renderer.surface().last().unwrap().physics_steps, 3);
    }

    #[test]
    fn test_update_model_discards_playback() {
        let (dir, mut renderer) = renderer_with_model();
        renderer.start();
        renderer.play_motion("idle.motion3.json");
        renderer.set_expression("happy");
        renderer.draw_frame();
        renderer.play_motion("idle.motion3.json");

        renderer.update_model(resolve(dir.path()).unwrap());
        assert!(renderer.active_motion().is_none());
        assert!(renderer.pending_motion().is_none());
        assert!(renderer.active_expression().is_none());

        renderer.draw_frame();
        let last = renderer.surface().last().unwrap();
        assert!(last.motion.is_none());
        assert!(last.expression.is_none());
        assert_eq!(last.physics_steps, 1);
    }

    #[test]
    fn test_frame_rate_validation() {
        let mut renderer = FrameRenderer::new(RecordingSurface::new());
        renderer.set_frame_rate(30.0);
        assert_eq!(renderer.frame_rate(), 30.0);

        renderer.set_frame_rate(0.0);
        renderer.set_frame_rate(f64::NAN);
        assert_eq!(renderer.frame_rate(), 30.0);

        renderer.set_frame_rate(1000.0);
        assert_eq!(renderer.frame_rate(), MAX_FRAME_RATE);
    }
}
