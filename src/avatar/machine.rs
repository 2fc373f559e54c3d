//! Character animation state machine.
//!
//! Owns the current [`CharacterState`] and expression plus two one-shot timers:
//! one returning auto-reverting states to idle, one returning a held
//! expression to neutral. Timers fire from [`AnimationStateMachine::poll`],
//! which the host calls from its display loop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::Serialize;

use super::events::{ReactionEvent, StudyPhase};
use super::expression::{ActiveExpression, Expression};
use super::state::CharacterState;
use super::timer::{Clock, TimerSlot};
use crate::config::AnimationConfig;
use crate::render::AvatarRenderer;

/// Timing constants for the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    /// Delay before celebrating/confused revert to idle
    pub reversion: Duration,
    /// Hold time used by [`AnimationStateMachine::set_expression`]
    pub expression_hold: Duration,
    /// Warning signals are ignored at or above this remaining time
    pub warning_threshold: Duration,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            reversion: Duration::from_secs(3),
            expression_hold: Duration::from_millis(500),
            warning_threshold: Duration::from_secs(60),
        }
    }
}

impl From<&AnimationConfig> for AnimationTiming {
    fn from(config: &AnimationConfig) -> Self {
        let defaults = Self::default();
        let secs = |value: f64, fallback: Duration| {
            Duration::try_from_secs_f64(value).unwrap_or(fallback)
        };

        Self {
            reversion: secs(config.reversion_secs, defaults.reversion),
            expression_hold: secs(config.expression_secs, defaults.expression_hold),
            warning_threshold: secs(config.warning_threshold_secs, defaults.warning_threshold),
        }
    }
}

/// Read-only view of the machine for logging and display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvatarSnapshot {
    pub state: CharacterState,
    pub expression: ActiveExpression,
    pub is_speaking: bool,
    pub is_thinking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpressionPolicy {
    /// Show the new state's default expression and drop any pending reset
    ApplyDefault,
    /// Leave the current expression and its reset timer alone
    KeepCurrent,
}

/// The animation state machine for one character.
///
/// Single-threaded: every call, timer and frame happens on the host's UI loop.
#[derive(Debug)]
pub struct AnimationStateMachine {
    state: CharacterState,
    expression: ActiveExpression,
    timing: AnimationTiming,
    clock: Rc<dyn Clock>,
    renderer: Option<Weak<RefCell<dyn AvatarRenderer>>>,
    state_reversion: TimerSlot<CharacterState>,
    expression_reset: TimerSlot<Expression>,
}

impl AnimationStateMachine {
    /// Create an idle, neutral machine with no renderer attached
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            state: CharacterState::Idle,
            expression: ActiveExpression::default(),
            timing: AnimationTiming::default(),
            clock,
            renderer: None,
            state_reversion: TimerSlot::new(),
            expression_reset: TimerSlot::new(),
        }
    }

    pub fn with_timing(mut self, timing: AnimationTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Attach a renderer without taking ownership of it
    pub fn with_renderer<R: AvatarRenderer + 'static>(mut self, renderer: &Rc<RefCell<R>>) -> Self {
        self.attach_renderer(renderer);
        self
    }

    pub fn attach_renderer<R: AvatarRenderer + 'static>(&mut self, renderer: &Rc<RefCell<R>>) {
        let weak = Rc::downgrade(renderer);
        let handle: Weak<RefCell<dyn AvatarRenderer>> = weak;
        self.renderer = Some(handle);
    }

    /// Run headless: commands are dropped from now on
    pub fn detach_renderer(&mut self) {
        self.renderer = None;
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    pub fn expression(&self) -> &ActiveExpression {
        &self.expression
    }

    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }

    pub fn is_speaking(&self) -> bool {
        self.state == CharacterState::Speaking
    }

    pub fn is_thinking(&self) -> bool {
        self.state == CharacterState::Thinking
    }

    /// Deadline of the pending return to idle, if armed
    pub fn reversion_deadline(&self) -> Option<Duration> {
        self.state_reversion.deadline()
    }

    /// Deadline of the pending return to neutral, if armed
    pub fn expression_reset_deadline(&self) -> Option<Duration> {
        self.expression_reset.deadline()
    }

    pub fn snapshot(&self) -> AvatarSnapshot {
        AvatarSnapshot {
            state: self.state,
            expression: self.expression.clone(),
            is_speaking: self.is_speaking(),
            is_thinking: self.is_thinking(),
        }
    }

    /// Enter `to`. Does nothing if it is already the current state.
    pub fn transition(&mut self, to: CharacterState) {
        self.enter(to, ExpressionPolicy::ApplyDefault);
    }

    /// Show `expression` for the default hold time
    pub fn set_expression(&mut self, expression: Expression) {
        self.set_expression_for(expression, self.timing.expression_hold);
    }

    /// Show `expression`, returning to neutral after `hold` unless it is neutral.
    /// Does nothing if `expression` is already shown.
    pub fn set_expression_for(&mut self, expression: Expression, hold: Duration) {
        let next = ActiveExpression::Preset(expression);
        if self.expression == next {
            return;
        }

        self.expression_reset.cancel();
        self.show_expression(next);

        if expression != Expression::Neutral {
            let deadline = self.clock.now().saturating_add(hold);
            self.expression_reset.arm(deadline, Expression::Neutral);
        }
    }

    /// Show an expression by name and forward it to the renderer unconditionally.
    ///
    /// Names that are not presets are kept verbatim. Any pending reset is dropped.
    pub fn set_expression_named(&mut self, name: &str) {
        self.expression_reset.cancel();
        self.expression = ActiveExpression::from_name(name);
        if let ActiveExpression::Custom(ref custom) = self.expression {
            tracing::debug!("Custom expression '{}'", custom);
        }

        let name = self.expression.name().to_string();
        self.command(|r| r.set_expression(&name));
    }

    /// Follow the study timer
    pub fn update_state(&mut self, phase: StudyPhase) {
        let (state, expression) = match phase {
            StudyPhase::Focus { running: true } => (CharacterState::Focus, Expression::Focused),
            StudyPhase::ShortBreak { running: true } | StudyPhase::LongBreak { running: true } => {
                (CharacterState::Happy, Expression::Happy)
            }
            StudyPhase::Focus { running: false }
            | StudyPhase::ShortBreak { running: false }
            | StudyPhase::LongBreak { running: false } => {
                (CharacterState::Idle, Expression::Neutral)
            }
            StudyPhase::Completed => (CharacterState::Celebrating, Expression::Happy),
            StudyPhase::Warning { remaining } if remaining < self.timing.warning_threshold => {
                (CharacterState::Warning, Expression::Surprised)
            }
            StudyPhase::Warning { remaining } => {
                tracing::debug!(
                    "Ignoring warning with {:.1}s remaining",
                    remaining.as_secs_f64()
                );
                return;
            }
        };

        self.transition(state);
        self.expression_reset.cancel();
        self.show_expression(ActiveExpression::Preset(expression));
    }

    /// Play the fixed reaction for a quiz/study event.
    ///
    /// The reaction expression stays up over the new state's default until
    /// its own hold time runs out.
    pub fn react(&mut self, event: ReactionEvent) {
        let reaction = event.reaction();
        tracing::info!("Reacting to {}", event);

        self.set_expression_for(reaction.expression, reaction.hold);
        self.enter(reaction.state, ExpressionPolicy::KeepCurrent);
    }

    /// Fire every timer whose deadline has passed, earliest first.
    /// Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;

        loop {
            let expression_due = self.expression_reset.deadline().filter(|d| *d <= now);
            let state_due = self.state_reversion.deadline().filter(|d| *d <= now);

            let expression_first = match (expression_due, state_due) {
                (Some(e), Some(s)) => e <= s,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };

            if expression_first {
                if let Some(target) = self.expression_reset.take_due(now) {
                    tracing::debug!("Expression hold elapsed, resetting to {}", target);
                    self.show_expression(ActiveExpression::Preset(target));
                }
            } else if let Some(target) = self.state_reversion.take_due(now) {
                tracing::debug!("Auto-reverting {} to {}", self.state, target);
                self.enter(target, ExpressionPolicy::ApplyDefault);
            }
            fired += 1;
        }

        fired
    }

    fn enter(&mut self, to: CharacterState, policy: ExpressionPolicy) -> bool {
        if to == self.state {
            return false;
        }

        let from = std::mem::replace(&mut self.state, to);
        tracing::info!("Character state: {} -> {}", from, to);

        // A deliberate change always supersedes a pending reversion
        self.state_reversion.cancel();

        if policy == ExpressionPolicy::ApplyDefault {
            self.expression_reset.cancel();
            self.show_expression(ActiveExpression::Preset(to.default_expression()));
        }

        if let Some(motion) = to.motion_asset() {
            self.command(|r| r.play_motion(motion));
        }

        if to.auto_reverts() {
            let deadline = self.clock.now().saturating_add(self.timing.reversion);
            self.state_reversion.arm(deadline, CharacterState::Idle);
        }

        true
    }

    /// Set the expression and forward it if it changed
    fn show_expression(&mut self, next: ActiveExpression) {
        if self.expression == next {
            return;
        }
        self.expression = next;

        let name = self.expression.name().to_string();
        self.command(|r| r.set_expression(&name));
    }

    fn command(&self, f: impl FnOnce(&mut dyn AvatarRenderer)) {
        let Some(renderer) = self.renderer.as_ref().and_then(Weak::upgrade) else {
            tracing::trace!("No renderer attached, dropping command");
            return;
        };

        match renderer.try_borrow_mut() {
            Ok(mut renderer) => f(&mut *renderer),
            Err(_) => tracing::warn!("Renderer is busy, dropping command"),
        };
    }
}
