//! Facial expressions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A preset expression, independent of the character state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    #[default]
    Neutral,
    Happy,
    Sad,
    Surprised,
    Angry,
    Focused,
    Tired,
}

static EXPRESSION_TABLE: [(&str, &str); 7] = [
    ("neutral", "f01.exp3.json"),
    ("happy", "f02.exp3.json"),
    ("sad", "f03.exp3.json"),
    ("surprised", "f04.exp3.json"),
    ("angry", "f05.exp3.json"),
    ("focused", "f06.exp3.json"),
    ("tired", "f07.exp3.json"),
];

impl Expression {
    pub const ALL: [Expression; 7] = [
        Self::Neutral,
        Self::Happy,
        Self::Sad,
        Self::Surprised,
        Self::Angry,
        Self::Focused,
        Self::Tired,
    ];

    pub fn as_str(self) -> &'static str {
        EXPRESSION_TABLE[self as usize].0
    }

    /// File name of the expression asset inside a model
    pub fn asset_name(self) -> &'static str {
        EXPRESSION_TABLE[self as usize].1
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|expr| expr.as_str() == wanted)
            .ok_or_else(|| format!("unknown expression: {}", s))
    }
}

/// The expression currently shown.
///
/// Free-form names that are not a preset are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActiveExpression {
    Preset(Expression),
    Custom(String),
}

impl ActiveExpression {
    /// Interpret a free-form name, preferring presets
    pub fn from_name(name: &str) -> Self {
        name.parse::<Expression>()
            .map(Self::Preset)
            .unwrap_or_else(|_| Self::Custom(name.to_string()))
    }

    /// Name forwarded to the renderer
    pub fn name(&self) -> &str {
        match self {
            Self::Preset(expr) => expr.as_str(),
            Self::Custom(name) => name,
        }
    }

    pub fn preset(&self) -> Option<Expression> {
        match self {
            Self::Preset(expr) => Some(*expr),
            Self::Custom(_) => None,
        }
    }
}

impl Default for ActiveExpression {
    fn default() -> Self {
        Self::Preset(Expression::Neutral)
    }
}

impl From<Expression> for ActiveExpression {
    fn from(expr: Expression) -> Self {
        Self::Preset(expr)
    }
}

impl fmt::Display for ActiveExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
