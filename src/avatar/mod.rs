//! Avatar animation state
//!
//! Character states, expressions, study/reaction events, and the state
//! machine that turns them into renderer commands.

pub mod events;
pub mod expression;
pub mod machine;
pub mod state;
pub mod timer;

pub use events::{Reaction, ReactionEvent, StudyPhase};
pub use expression::{ActiveExpression, Expression};
pub use machine::{AnimationStateMachine, AnimationTiming, AvatarSnapshot};
pub use state::CharacterState;
pub use timer::{Clock, ManualClock, SystemClock, TimerSlot};
