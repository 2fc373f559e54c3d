//! Display surfaces that receive finished frames.

use super::renderer::FrameDescriptor;

/// Destination for submitted frames (a window, an offscreen target, a test log)
pub trait FrameSurface {
    fn present(&mut self, frame: &FrameDescriptor);
}

/// Headless surface that keeps every frame it is given
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    frames: Vec<FrameDescriptor>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    pub fn last(&self) -> Option<&FrameDescriptor> {
        self.frames.last()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl FrameSurface for RecordingSurface {
    fn present(&mut self, frame: &FrameDescriptor) {
        self.frames.push(frame.clone());
    }
}
