//! Strict left-to-right equation evaluation
//!
//! A term is one heavy tile (10-20) or a run of up to three light tiles read
//! as a decimal number without a leading zero. Each side of `=` is folded
//! left to right with no operator precedence.

use thiserror::Error;

use crate::token::{ConcreteToken, Operator, MAX_LIGHT_NUMBER};

/// Longest run of light tiles forming one number
pub const MAX_NUMBER_DIGITS: u8 = 3;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("number tile cannot continue the current term")]
    MisplacedNumber,

    #[error("operator must follow a number")]
    MisplacedOperator,

    #[error("equals sign must follow a number and appear once")]
    MisplacedEquals,

    #[error("expression ends before both sides are complete")]
    Incomplete,

    #[error("division by zero")]
    DivisionByZero,

    #[error("division leaves a remainder")]
    InexactDivision,

    #[error("arithmetic overflow")]
    Overflow,
}

/// Apply one operator with exact integer semantics
#[inline]
pub fn apply(op: Operator, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
    match op {
        Operator::Add => lhs.checked_add(rhs).ok_or(EvalError::Overflow),
        Operator::Sub => lhs.checked_sub(rhs).ok_or(EvalError::Overflow),
        Operator::Mul => lhs.checked_mul(rhs).ok_or(EvalError::Overflow),
        Operator::Div => {
            if rhs == 0 {
                Err(EvalError::DivisionByZero)
            } else if lhs % rhs != 0 {
                Err(EvalError::InexactDivision)
            } else {
                lhs.checked_div(rhs).ok_or(EvalError::Overflow)
            }
        }
    }
}

/// Term currently being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Term {
    Empty,
    Open { value: i64, digits: u8 },
    Closed(i64),
}

impl Term {
    fn value(self) -> Option<i64> {
        match self {
            Term::Empty => None,
            Term::Open { value, .. } | Term::Closed(value) => Some(value),
        }
    }
}

/// Incremental evaluation state after a prefix of tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Value of the left side once `=` has been read
    pub(super) left: Option<i64>,
    /// Folded value of the current side and the operator awaiting the next term
    pub(super) pending: Option<(i64, Operator)>,
    pub(super) term: Term,
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

impl Cursor {
    pub fn new() -> Self {
        Self {
            left: None,
            pending: None,
            term: Term::Empty,
        }
    }

    /// Feed one token
    pub fn push(&self, token: ConcreteToken) -> Result<Cursor, EvalError> {
        match token {
            ConcreteToken::Number(n) => {
                let n64 = n as i64;
                let term = match self.term {
                    Term::Empty if n > MAX_LIGHT_NUMBER || n == 0 => Term::Closed(n64),
                    Term::Empty => Term::Open {
                        value: n64,
                        digits: 1,
                    },
                    Term::Open { value, digits } if n <= MAX_LIGHT_NUMBER => {
                        let value = value * 10 + n64;
                        if digits + 1 >= MAX_NUMBER_DIGITS {
                            Term::Closed(value)
                        } else {
                            Term::Open {
                                value,
                                digits: digits + 1,
                            }
                        }
                    }
                    _ => return Err(EvalError::MisplacedNumber),
                };
                Ok(Cursor { term, ..*self })
            }
            ConcreteToken::Op(op) => {
                let value = self.side_value()?.ok_or(EvalError::MisplacedOperator)?;
                Ok(Cursor {
                    left: self.left,
                    pending: Some((value, op)),
                    term: Term::Empty,
                })
            }
            ConcreteToken::Equals => {
                if self.left.is_some() {
                    return Err(EvalError::MisplacedEquals);
                }
                let value = self.side_value()?.ok_or(EvalError::MisplacedEquals)?;
                Ok(Cursor {
                    left: Some(value),
                    pending: None,
                    term: Term::Empty,
                })
            }
        }
    }

    /// `(left, right)` values once the whole equation has been read
    pub fn finish(&self) -> Result<(i64, i64), EvalError> {
        let left = self.left.ok_or(EvalError::Incomplete)?;
        let right = self.side_value()?.ok_or(EvalError::Incomplete)?;
        Ok((left, right))
    }

    /// Current side folded with the term being read; `None` if no term is present
    pub(super) fn side_value(&self) -> Result<Option<i64>, EvalError> {
        let Some(term) = self.term.value() else {
            return Ok(None);
        };
        match self.pending {
            None => Ok(Some(term)),
            Some((acc, op)) => apply(op, acc, term).map(Some),
        }
    }

    #[inline]
    pub fn on_left_side(&self) -> bool {
        self.left.is_none()
    }

    #[inline]
    pub(super) fn expects_term(&self) -> bool {
        self.term == Term::Empty
    }
}

/// Evaluate a complete equation, returning both side values
pub fn evaluate_equation(tokens: &[ConcreteToken]) -> Result<(i64, i64), EvalError> {
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut cursor = Cursor::new();
    for &token in tokens {
        cursor = cursor.push(token)?;
    }
    cursor.finish()
}

/// Whether the tokens form a well-formed, balanced equation
pub fn is_valid_equation(tokens: &[ConcreteToken]) -> bool {
    matches!(evaluate_equation(tokens), Ok((l, r)) if l == r)
}
