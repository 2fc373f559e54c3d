//! Domain events that drive the character

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::expression::Expression;
use super::state::CharacterState;

/// Study timer phase signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum StudyPhase {
    Focus { running: bool },
    ShortBreak { running: bool },
    LongBreak { running: bool },
    Completed,
    Warning { remaining: Duration },
}

impl fmt::Display for StudyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, running) = match self {
            Self::Focus { running } => ("focus", *running),
            Self::ShortBreak { running } => ("short_break", *running),
            Self::LongBreak { running } => ("long_break", *running),
            Self::Completed => return f.write_str("completed"),
            Self::Warning { remaining } => {
                return write!(f, "warning={}", remaining.as_secs_f64())
            }
        };
        if running {
            f.write_str(name)
        } else {
            write!(f, "{}_paused", name)
        }
    }
}

impl FromStr for StudyPhase {
    type Err = String;

    /// Accepts `focus`, `short_break`, `long_break` (optionally suffixed
    /// `_paused`), `completed`, and `warning=<seconds>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        if let Some(secs) = s.strip_prefix("warning=") {
            let remaining = secs
                .parse::<f64>()
                .ok()
                .and_then(|v| Duration::try_from_secs_f64(v).ok())
                .ok_or_else(|| format!("invalid remaining time: {}", secs))?;
            return Ok(Self::Warning { remaining });
        }

        let (name, running) = match s.strip_suffix("_paused") {
            Some(name) => (name, false),
            None => (s.as_str(), true),
        };

        match name {
            "focus" => Ok(Self::Focus { running }),
            "short_break" => Ok(Self::ShortBreak { running }),
            "long_break" => Ok(Self::LongBreak { running }),
            "completed" if running => Ok(Self::Completed),
            _ => Err(format!("unknown study phase: {}", s)),
        }
    }
}

/// Quiz/study outcome that triggers a short reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionEvent {
    CorrectAnswer,
    WrongAnswer,
    NewQuestion,
    StudyComplete,
    Tired,
}

/// What a reaction does: hold `expression` for `hold`, then enter `state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaction {
    pub expression: Expression,
    pub hold: Duration,
    pub state: CharacterState,
}

const fn reaction(expression: Expression, hold_ms: u64, state: CharacterState) -> Reaction {
    Reaction {
        expression,
        hold: Duration::from_millis(hold_ms),
        state,
    }
}

impl ReactionEvent {
    pub const ALL: [ReactionEvent; 5] = [
        Self::CorrectAnswer,
        Self::WrongAnswer,
        Self::NewQuestion,
        Self::StudyComplete,
        Self::Tired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CorrectAnswer => "correct_answer",
            Self::WrongAnswer => "wrong_answer",
            Self::NewQuestion => "new_question",
            Self::StudyComplete => "study_complete",
            Self::Tired => "tired",
        }
    }

    pub fn reaction(self) -> Reaction {
        match self {
            Self::CorrectAnswer => reaction(Expression::Happy, 2000, CharacterState::Celebrating),
            Self::WrongAnswer => reaction(Expression::Sad, 1500, CharacterState::Confused),
            Self::NewQuestion => reaction(Expression::Focused, 1000, CharacterState::Listening),
            Self::StudyComplete => reaction(Expression::Happy, 3000, CharacterState::Celebrating),
            Self::Tired => reaction(Expression::Tired, 2000, CharacterState::Sleeping),
        }
    }
}

impl fmt::Display for ReactionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == wanted)
            .ok_or_else(|| format!("unknown reaction: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_phases() {
        assert_eq!("focus".parse::<StudyPhase>(), Ok(StudyPhase::Focus { running: true }));
        assert_eq!(
            "short_break_paused".parse::<StudyPhase>(),
            Ok(StudyPhase::ShortBreak { running: false })
        );
        assert_eq!("completed".parse::<StudyPhase>(), Ok(StudyPhase::Completed));
        assert_eq!(
            "warning=45".parse::<StudyPhase>(),
            Ok(StudyPhase::Warning { remaining: Duration::from_secs(45) })
        );
        assert!("warning=-3".parse::<StudyPhase>().is_err());
        assert!("completed_paused".parse::<StudyPhase>().is_err());
        assert!("lunch".parse::<StudyPhase>().is_err());
    }

    #[test]
    fn test_phase_display_parses_back() {
        let phases = [
            StudyPhase::Focus { running: false },
            StudyPhase::LongBreak { running: true },
            StudyPhase::Completed,
            StudyPhase::Warning { remaining: Duration::from_secs(30) },
        ];
        for phase in phases {
            assert_eq!(phase.to_string().parse::<StudyPhase>(), Ok(phase));
        }
    }

    #[test]
    fn test_reaction_table() {
        let wrong = ReactionEvent::WrongAnswer.reaction();
        assert_eq!(wrong.expression, Expression::Sad);
        assert_eq!(wrong.hold, Duration::from_millis(1500));
        assert_eq!(wrong.state, CharacterState::Confused);

        let tired = ReactionEvent::Tired.reaction();
        assert_eq!(tired.expression, Expression::Tired);
        assert_eq!(tired.state, CharacterState::Sleeping);
    }

    #[test]
    fn test_parse_reactions() {
        for event in ReactionEvent::ALL {
            assert_eq!(event.to_string().parse::<ReactionEvent>(), Ok(event));
        }
        assert!("applause".parse::<ReactionEvent>().is_err());
    }
}
