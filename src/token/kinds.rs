//! Token vocabulary: concrete tokens consumed by the solver and the display
//! tokens shown to players (which may be ambiguous).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PuzzleError, Result};

/// Largest number printed on a single tile
pub const MAX_TILE_NUMBER: u8 = 20;
/// Largest light (concatenable) number
pub const MAX_LIGHT_NUMBER: u8 = 9;
/// Number of distinct display token kinds (21 numbers, 4 operators, 2 choices, `=`, `?`)
pub const KIND_COUNT: usize = 29;

const KIND_OP_BASE: usize = 21;
const KIND_CHOICE_BASE: usize = 25;
const KIND_EQUALS: usize = 27;
const KIND_WILDCARD: usize = 28;

/// Concrete arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "×",
            Operator::Div => "÷",
        }
    }

    #[inline]
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operator::Mul | Operator::Div)
    }

    /// The choice pair this operator belongs to
    pub fn choice(self) -> ChoiceOperator {
        match self {
            Operator::Add | Operator::Sub => ChoiceOperator::AddSub,
            Operator::Mul | Operator::Div => ChoiceOperator::MulDiv,
        }
    }

    fn index(self) -> usize {
        match self {
            Operator::Add => 0,
            Operator::Sub => 1,
            Operator::Mul => 2,
            Operator::Div => 3,
        }
    }
}

/// An unresolved pair of operators, resolved per occurrence at solve time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChoiceOperator {
    AddSub,
    MulDiv,
}

impl ChoiceOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            ChoiceOperator::AddSub => "+/-",
            ChoiceOperator::MulDiv => "×/÷",
        }
    }

    pub fn members(self) -> [Operator; 2] {
        match self {
            ChoiceOperator::AddSub => [Operator::Add, Operator::Sub],
            ChoiceOperator::MulDiv => [Operator::Mul, Operator::Div],
        }
    }

    pub fn contains(self, op: Operator) -> bool {
        op.choice() == self
    }
}

/// Token with a single, fixed meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConcreteToken {
    Number(u8),
    Op(Operator),
    Equals,
}

/// Every concrete token, ordered so that each display token's candidates
/// form a contiguous run.
static VOCABULARY: [ConcreteToken; 26] = [
    ConcreteToken::Number(0),
    ConcreteToken::Number(1),
    ConcreteToken::Number(2),
    ConcreteToken::Number(3),
    ConcreteToken::Number(4),
    ConcreteToken::Number(5),
    ConcreteToken::Number(6),
    ConcreteToken::Number(7),
    ConcreteToken::Number(8),
    ConcreteToken::Number(9),
    ConcreteToken::Number(10),
    ConcreteToken::Number(11),
    ConcreteToken::Number(12),
    ConcreteToken::Number(13),
    ConcreteToken::Number(14),
    ConcreteToken::Number(15),
    ConcreteToken::Number(16),
    ConcreteToken::Number(17),
    ConcreteToken::Number(18),
    ConcreteToken::Number(19),
    ConcreteToken::Number(20),
    ConcreteToken::Op(Operator::Add),
    ConcreteToken::Op(Operator::Sub),
    ConcreteToken::Op(Operator::Mul),
    ConcreteToken::Op(Operator::Div),
    ConcreteToken::Equals,
];

impl ConcreteToken {
    /// All 26 concrete tokens a wildcard may stand for
    pub fn vocabulary() -> &'static [ConcreteToken] {
        &VOCABULARY
    }

    pub fn number(value: u8) -> Result<Self> {
        if value > MAX_TILE_NUMBER {
            return Err(PuzzleError::InvalidToken(format!(
                "number {} exceeds tile range 0-{}",
                value, MAX_TILE_NUMBER
            )));
        }
        Ok(ConcreteToken::Number(value))
    }

    #[inline]
    pub fn is_light(self) -> bool {
        matches!(self, ConcreteToken::Number(n) if n <= MAX_LIGHT_NUMBER)
    }

    #[inline]
    pub fn is_heavy(self) -> bool {
        matches!(self, ConcreteToken::Number(n) if n > MAX_LIGHT_NUMBER)
    }
}

/// Token as persisted and shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayToken {
    Number(u8),
    Op(Operator),
    Choice(ChoiceOperator),
    Equals,
    Wildcard,
}

impl DisplayToken {
    /// Concrete tokens this display token may resolve to
    pub fn candidates(self) -> &'static [ConcreteToken] {
        match self {
            DisplayToken::Number(n) => {
                let i = n.min(MAX_TILE_NUMBER) as usize;
                &VOCABULARY[i..i + 1]
            }
            DisplayToken::Op(op) => {
                let i = KIND_OP_BASE + op.index();
                &VOCABULARY[i..i + 1]
            }
            DisplayToken::Choice(ChoiceOperator::AddSub) => &VOCABULARY[21..23],
            DisplayToken::Choice(ChoiceOperator::MulDiv) => &VOCABULARY[23..25],
            DisplayToken::Equals => &VOCABULARY[25..26],
            DisplayToken::Wildcard => &VOCABULARY[..],
        }
    }

    /// Whether this tile may stand for `value`
    #[inline]
    pub fn accepts(self, value: ConcreteToken) -> bool {
        match self {
            DisplayToken::Wildcard => true,
            DisplayToken::Choice(choice) => {
                matches!(value, ConcreteToken::Op(op) if choice.contains(op))
            }
            other => other == DisplayToken::from(value),
        }
    }

    /// Dense index used by [`TokenCounts`](super::TokenCounts)
    #[inline]
    pub fn kind_index(self) -> usize {
        match self {
            DisplayToken::Number(n) => n.min(MAX_TILE_NUMBER) as usize,
            DisplayToken::Op(op) => KIND_OP_BASE + op.index(),
            DisplayToken::Choice(ChoiceOperator::AddSub) => KIND_CHOICE_BASE,
            DisplayToken::Choice(ChoiceOperator::MulDiv) => KIND_CHOICE_BASE + 1,
            DisplayToken::Equals => KIND_EQUALS,
            DisplayToken::Wildcard => KIND_WILDCARD,
        }
    }

    pub fn from_kind_index(index: usize) -> Option<Self> {
        match index {
            0..=20 => Some(DisplayToken::Number(index as u8)),
            21..=24 => Some(DisplayToken::Op(Operator::ALL[index - KIND_OP_BASE])),
            25 => Some(DisplayToken::Choice(ChoiceOperator::AddSub)),
            26 => Some(DisplayToken::Choice(ChoiceOperator::MulDiv)),
            KIND_EQUALS => Some(DisplayToken::Equals),
            KIND_WILDCARD => Some(DisplayToken::Wildcard),
            _ => None,
        }
    }

    #[inline]
    pub fn is_light(self) -> bool {
        matches!(self, DisplayToken::Number(n) if n <= MAX_LIGHT_NUMBER)
    }

    #[inline]
    pub fn is_heavy(self) -> bool {
        matches!(self, DisplayToken::Number(n) if n > MAX_LIGHT_NUMBER)
    }

    /// Concrete form, if this token is unambiguous
    pub fn resolved(self) -> Option<ConcreteToken> {
        match self {
            DisplayToken::Number(n) => Some(ConcreteToken::Number(n)),
            DisplayToken::Op(op) => Some(ConcreteToken::Op(op)),
            DisplayToken::Equals => Some(ConcreteToken::Equals),
            DisplayToken::Choice(_) | DisplayToken::Wildcard => None,
        }
    }
}

impl From<ConcreteToken> for DisplayToken {
    fn from(token: ConcreteToken) -> Self {
        match token {
            ConcreteToken::Number(n) => DisplayToken::Number(n),
            ConcreteToken::Op(op) => DisplayToken::Op(op),
            ConcreteToken::Equals => DisplayToken::Equals,
        }
    }
}

/// One tile of an arrangement: how it is shown and the value it takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedTile {
    pub shown: DisplayToken,
    pub value: ConcreteToken,
}

impl PlacedTile {
    /// Tile shown exactly as its value
    pub fn plain(value: ConcreteToken) -> Self {
        Self {
            shown: value.into(),
            value,
        }
    }

    /// Tile shown as `shown` resolving to `value`; `None` if `shown` cannot take it
    pub fn resolved(shown: DisplayToken, value: ConcreteToken) -> Option<Self> {
        shown.accepts(value).then_some(Self { shown, value })
    }
}

/// Answer slot pre-filled for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockedPosition {
    pub index: usize,
    pub value: ConcreteToken,
}

// ============================================================================
// Text notation
// ============================================================================

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for ChoiceOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for ConcreteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteToken::Number(n) => write!(f, "{}", n),
            ConcreteToken::Op(op) => f.write_str(op.symbol()),
            ConcreteToken::Equals => f.write_str("="),
        }
    }
}

impl fmt::Display for DisplayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayToken::Number(n) => write!(f, "{}", n),
            DisplayToken::Op(op) => f.write_str(op.symbol()),
            DisplayToken::Choice(choice) => f.write_str(choice.symbol()),
            DisplayToken::Equals => f.write_str("="),
            DisplayToken::Wildcard => f.write_str("?"),
        }
    }
}

impl FromStr for DisplayToken {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let token = match s {
            "+" => DisplayToken::Op(Operator::Add),
            "-" | "−" => DisplayToken::Op(Operator::Sub),
            "×" | "*" | "x" | "X" => DisplayToken::Op(Operator::Mul),
            "÷" | "/" => DisplayToken::Op(Operator::Div),
            "+/-" | "+/−" | "±" => DisplayToken::Choice(ChoiceOperator::AddSub),
            "×/÷" | "*/÷" | "x/÷" => DisplayToken::Choice(ChoiceOperator::MulDiv),
            "=" => DisplayToken::Equals,
            "?" | "_" => DisplayToken::Wildcard,
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                let value: u32 = digits
                    .parse()
                    .map_err(|_| PuzzleError::InvalidToken(digits.to_string()))?;
                if value > MAX_TILE_NUMBER as u32 {
                    return Err(PuzzleError::InvalidToken(format!(
                        "{} is not a tile number (0-{})",
                        digits, MAX_TILE_NUMBER
                    )));
                }
                DisplayToken::Number(value as u8)
            }
            other => return Err(PuzzleError::InvalidToken(other.to_string())),
        };
        Ok(token)
    }
}

impl FromStr for ConcreteToken {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self> {
        let token: DisplayToken = s.parse()?;
        token.resolved().ok_or_else(|| {
            PuzzleError::InvalidToken(format!("{} is ambiguous, expected a concrete token", s))
        })
    }
}

impl TryFrom<String> for DisplayToken {
    type Error = PuzzleError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for ConcreteToken {
    type Error = PuzzleError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DisplayToken> for String {
    fn from(token: DisplayToken) -> Self {
        token.to_string()
    }
}

impl From<ConcreteToken> for String {
    fn from(token: ConcreteToken) -> Self {
        token.to_string()
    }
}
