//! Display-refresh pacing for the renderer.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::AvatarRenderer;
use crate::avatar::{AnimationStateMachine, Clock};

/// Host-side frame pacing.
///
/// Each [`FrameLoop::pump`] first fires due state-machine timers, then draws
/// at most one frame if the renderer is running and a frame is due.
#[derive(Debug)]
pub struct FrameLoop {
    clock: Rc<dyn Clock>,
    next_frame: Option<Duration>,
    frames: u64,
}

impl FrameLoop {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            next_frame: None,
            frames: 0,
        }
    }

    /// Frames drawn through this loop
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The host view became visible
    pub fn appear<R: AvatarRenderer + ?Sized>(&mut self, renderer: &RefCell<R>) {
        renderer.borrow_mut().start();
        self.next_frame = Some(self.clock.now());
    }

    /// The host view went away. Pending timers are left running.
    pub fn disappear<R: AvatarRenderer + ?Sized>(&mut self, renderer: &RefCell<R>) {
        renderer.borrow_mut().stop();
        self.next_frame = None;
    }

    /// Run one display refresh. Returns whether a frame was drawn.
    pub fn pump<R: AvatarRenderer + ?Sized>(
        &mut self,
        machine: &mut AnimationStateMachine,
        renderer: &RefCell<R>,
    ) -> bool {
        machine.poll();

        let now = self.clock.now();
        let Ok(mut renderer) = renderer.try_borrow_mut() else {
            tracing::warn!("Renderer is busy, skipping frame");
            return false;
        };

        if !renderer.is_rendering() {
            self.next_frame = None;
            return false;
        }

        let due = *self.next_frame.get_or_insert(now);
        if now < due {
            return false;
        }

        let Ok(interval) = Duration::try_from_secs_f64(1.0 / renderer.frame_rate()) else {
            tracing::warn!("Renderer reported an unusable frame rate");
            return false;
        };

        renderer.draw_frame();
        self.frames += 1;

        // Drop missed frames instead of bursting to catch up
        let next = due + interval;
        self.next_frame = Some(if next <= now { now + interval } else { next });
        true
    }
}
