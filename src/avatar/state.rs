//! Character behavioural states

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::expression::Expression;

/// The behavioural state of the character. `Idle` is the rest state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterState {
    #[default]
    Idle,
    Focus,
    Happy,
    Warning,
    Listening,
    Speaking,
    Thinking,
    Celebrating,
    Confused,
    Sleeping,
    Studying,
}

/// Per-state motion asset and default expression
struct StateEntry {
    name: &'static str,
    motion: Option<&'static str>,
    expression: Expression,
}

static STATE_TABLE: [StateEntry; 11] = [
    StateEntry { name: "idle", motion: Some("idle.motion3.json"), expression: Expression::Neutral },
    StateEntry { name: "focus", motion: Some("tap.motion3.json"), expression: Expression::Focused },
    StateEntry { name: "happy", motion: Some("flick_head.motion3.json"), expression: Expression::Happy },
    StateEntry { name: "warning", motion: Some("shake.motion3.json"), expression: Expression::Surprised },
    StateEntry { name: "listening", motion: Some("tap.motion3.json"), expression: Expression::Focused },
    StateEntry { name: "speaking", motion: Some("tap.motion3.json"), expression: Expression::Focused },
    StateEntry { name: "thinking", motion: Some("shake.motion3.json"), expression: Expression::Focused },
    StateEntry { name: "celebrating", motion: Some("flick_head.motion3.json"), expression: Expression::Happy },
    StateEntry { name: "confused", motion: Some("shake.motion3.json"), expression: Expression::Surprised },
    StateEntry { name: "sleeping", motion: Some("idle.motion3.json"), expression: Expression::Tired },
    StateEntry { name: "studying", motion: Some("tap.motion3.json"), expression: Expression::Focused },
];

impl CharacterState {
    pub const ALL: [CharacterState; 11] = [
        Self::Idle,
        Self::Focus,
        Self::Happy,
        Self::Warning,
        Self::Listening,
        Self::Speaking,
        Self::Thinking,
        Self::Celebrating,
        Self::Confused,
        Self::Sleeping,
        Self::Studying,
    ];

    fn entry(self) -> &'static StateEntry {
        &STATE_TABLE[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.entry().name
    }

    /// Logical name of the motion played on entering this state
    pub fn motion_asset(self) -> Option<&'static str> {
        self.entry().motion
    }

    /// Expression applied on entering this state
    pub fn default_expression(self) -> Expression {
        self.entry().expression
    }

    /// States that fall back to idle on their own after a delay
    pub fn auto_reverts(self) -> bool {
        matches!(self, Self::Celebrating | Self::Confused)
    }
}

impl fmt::Display for CharacterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == wanted)
            .ok_or_else(|| format!("unknown character state: {}", s))
    }
}
