//! Constraint specs: how many tokens of each category a puzzle holds

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PuzzleError, Result};
use crate::token::{ChoiceOperator, DisplayToken, Operator};

/// Smallest possible equation (`a = b`)
pub const MIN_TOTAL_TOKENS: u32 = 3;
/// Upper bound keeping solver searches tractable
pub const MAX_TOTAL_TOKENS: u32 = 20;
/// Tokens left for the player to place when lock mode is on
pub const LOCK_BASE_TOKENS: u32 = 8;

/// Token category a count rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintCategory {
    Total,
    Operators,
    Equals,
    Heavy,
    Wildcards,
    Zeros,
}

impl ConstraintCategory {
    pub const ALL: [ConstraintCategory; 6] = [
        ConstraintCategory::Total,
        ConstraintCategory::Operators,
        ConstraintCategory::Equals,
        ConstraintCategory::Heavy,
        ConstraintCategory::Wildcards,
        ConstraintCategory::Zeros,
    ];
}

impl fmt::Display for ConstraintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintCategory::Total => "total",
            ConstraintCategory::Operators => "operators",
            ConstraintCategory::Equals => "equals",
            ConstraintCategory::Heavy => "heavy",
            ConstraintCategory::Wildcards => "wildcards",
            ConstraintCategory::Zeros => "zeros",
        };
        f.write_str(name)
    }
}

/// Either an exact count or an inclusive range
///
/// Serialized as a bare number or as `{ "min": a, "max": b }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountRule {
    Fixed(u32),
    Range { min: u32, max: u32 },
}

impl CountRule {
    #[inline]
    pub fn min(&self) -> u32 {
        match *self {
            CountRule::Fixed(n) => n,
            CountRule::Range { min, .. } => min,
        }
    }

    #[inline]
    pub fn max(&self) -> u32 {
        match *self {
            CountRule::Fixed(n) => n,
            CountRule::Range { max, .. } => max,
        }
    }

    pub fn contains(&self, n: u32) -> bool {
        (self.min()..=self.max()).contains(&n)
    }

    pub fn is_range(&self) -> bool {
        matches!(self, CountRule::Range { .. })
    }

    /// Draw a count uniformly from the rule
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match *self {
            CountRule::Fixed(n) => n,
            CountRule::Range { min, max } => rng.gen_range(min..=max.max(min)),
        }
    }

    /// Range rules grow by one on each side; fixed counts are untouched
    pub fn widened(&self) -> CountRule {
        match *self {
            CountRule::Fixed(n) => CountRule::Fixed(n),
            CountRule::Range { min, max } => CountRule::Range {
                min: min.saturating_sub(1),
                max: max.saturating_add(1),
            },
        }
    }

    fn validate(&self, category: ConstraintCategory) -> Result<()> {
        if let CountRule::Range { min, max } = *self {
            if min > max {
                return Err(PuzzleError::config(format!(
                    "{} range has min {} > max {}",
                    category, min, max
                )));
            }
        }
        Ok(())
    }
}

/// Exact per-symbol operator counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorBreakdown {
    pub add: u32,
    pub sub: u32,
    pub mul: u32,
    pub div: u32,
    pub add_sub: u32,
    pub mul_div: u32,
}

impl OperatorBreakdown {
    /// Operator tiles requested, saturating at `u32::MAX`
    pub fn total(&self) -> u32 {
        [self.add, self.sub, self.mul, self.div, self.add_sub, self.mul_div]
            .into_iter()
            .fold(0u32, u32::saturating_add)
    }

    /// One display token per requested operator tile
    pub fn display_tokens(&self) -> Vec<DisplayToken> {
        let entries = [
            (DisplayToken::Op(Operator::Add), self.add),
            (DisplayToken::Op(Operator::Sub), self.sub),
            (DisplayToken::Op(Operator::Mul), self.mul),
            (DisplayToken::Op(Operator::Div), self.div),
            (DisplayToken::Choice(ChoiceOperator::AddSub), self.add_sub),
            (DisplayToken::Choice(ChoiceOperator::MulDiv), self.mul_div),
        ];
        entries
            .iter()
            .flat_map(|&(token, n)| std::iter::repeat(token).take(n as usize))
            .collect()
    }

    /// Parse `{ "+": 1, "×/÷": 2 }` style maps
    pub fn from_symbols(symbols: &BTreeMap<String, u32>) -> Result<Self> {
        let mut breakdown = Self::default();
        for (symbol, &count) in symbols {
            let token: DisplayToken = symbol
                .parse()
                .map_err(|_| PuzzleError::config(format!("unknown operator symbol '{}'", symbol)))?;
            let slot = match token {
                DisplayToken::Op(Operator::Add) => &mut breakdown.add,
                DisplayToken::Op(Operator::Sub) => &mut breakdown.sub,
                DisplayToken::Op(Operator::Mul) => &mut breakdown.mul,
                DisplayToken::Op(Operator::Div) => &mut breakdown.div,
                DisplayToken::Choice(ChoiceOperator::AddSub) => &mut breakdown.add_sub,
                DisplayToken::Choice(ChoiceOperator::MulDiv) => &mut breakdown.mul_div,
                _ => {
                    return Err(PuzzleError::config(format!(
                        "'{}' is not an operator symbol",
                        symbol
                    )))
                }
            };
            *slot = slot.checked_add(count).ok_or_else(|| {
                PuzzleError::config(format!("operator count for '{}' overflows", symbol))
            })?;
        }
        Ok(breakdown)
    }

    pub fn to_symbols(&self) -> BTreeMap<String, u32> {
        let mut map = BTreeMap::new();
        for token in self.display_tokens() {
            *map.entry(token.to_string()).or_insert(0) += 1;
        }
        map
    }
}

/// How operator symbols are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorMode {
    /// Uniform over `+ − × ÷`
    Random,
    /// Exactly these symbols, choice tiles included
    Specific(OperatorBreakdown),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    #[default]
    Disabled,
    Enabled,
}

/// Validated constraint spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConstraintSpec", into = "RawConstraintSpec")]
pub struct ConstraintSpec {
    total: u32,
    operators: CountRule,
    equals: CountRule,
    heavy: CountRule,
    wildcards: CountRule,
    zeros: CountRule,
    operator_mode: OperatorMode,
    lock_mode: LockMode,
}

impl ConstraintSpec {
    pub fn builder(total: u32) -> ConstraintSpecBuilder {
        ConstraintSpecBuilder::new(total)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn operators(&self) -> CountRule {
        self.operators
    }

    pub fn equals(&self) -> CountRule {
        self.equals
    }

    pub fn heavy(&self) -> CountRule {
        self.heavy
    }

    pub fn wildcards(&self) -> CountRule {
        self.wildcards
    }

    pub fn zeros(&self) -> CountRule {
        self.zeros
    }

    pub fn operator_mode(&self) -> OperatorMode {
        self.operator_mode
    }

    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    /// `total − 8` when lock mode is on
    pub fn lock_count(&self) -> Option<usize> {
        match self.lock_mode {
            LockMode::Enabled => Some(self.total.saturating_sub(LOCK_BASE_TOKENS) as usize),
            LockMode::Disabled => None,
        }
    }

    /// Rule for a category (`Total` maps to the fixed total)
    pub fn rule(&self, category: ConstraintCategory) -> CountRule {
        match category {
            ConstraintCategory::Total => CountRule::Fixed(self.total),
            ConstraintCategory::Operators => self.operators,
            ConstraintCategory::Equals => self.equals,
            ConstraintCategory::Heavy => self.heavy,
            ConstraintCategory::Wildcards => self.wildcards,
            ConstraintCategory::Zeros => self.zeros,
        }
    }

    /// Copy with every range rule widened by one, equals excluded
    pub fn relaxed(&self) -> ConstraintSpec {
        let operators = match self.operator_mode {
            OperatorMode::Specific(_) => self.operators,
            OperatorMode::Random => self.operators.widened(),
        };
        ConstraintSpec {
            operators,
            heavy: self.heavy.widened(),
            wildcards: self.wildcards.widened(),
            zeros: self.zeros.widened(),
            ..self.clone()
        }
    }

    /// Categories [`relaxed`](Self::relaxed) actually widens
    pub fn range_categories(&self) -> Vec<ConstraintCategory> {
        let relaxed = self.relaxed();
        [
            ConstraintCategory::Operators,
            ConstraintCategory::Heavy,
            ConstraintCategory::Wildcards,
            ConstraintCategory::Zeros,
        ]
        .into_iter()
        .filter(|&c| relaxed.rule(c) != self.rule(c))
        .collect()
    }

    /// Operator counts the rule admits whose terms can hold the number tiles.
    ///
    /// With `k` operators there are `k + 2` terms and `total − k − 1` number
    /// tiles; a term holds one heavy tile or 1-3 light tiles.
    pub fn feasible_operator_counts(&self) -> Vec<u32> {
        let admitted = match self.operator_mode {
            OperatorMode::Specific(breakdown) => breakdown.total()..=breakdown.total(),
            OperatorMode::Random => self.operators.min()..=self.operators.max().min(self.total),
        };
        let heavy = self.heavy.min();
        admitted
            .filter(|&ops| {
                let Some(numbers) = ops
                    .checked_add(1)
                    .and_then(|used| self.total.checked_sub(used))
                else {
                    return false;
                };
                let terms = ops + 2;
                heavy <= terms && terms <= numbers && numbers <= 3 * terms - 2 * heavy
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for category in [
            ConstraintCategory::Operators,
            ConstraintCategory::Equals,
            ConstraintCategory::Heavy,
            ConstraintCategory::Wildcards,
            ConstraintCategory::Zeros,
        ] {
            let rule = self.rule(category);
            rule.validate(category)?;
            if rule.min() > self.total {
                return Err(PuzzleError::config(format!(
                    "{} minimum {} exceeds total {}",
                    category,
                    rule.min(),
                    self.total
                )));
            }
        }

        if self.equals.min() != 1 || self.equals.max() != 1 {
            return Err(PuzzleError::config(format!(
                "equals count must be exactly 1, got {:?}",
                self.equals
            )));
        }

        if !(MIN_TOTAL_TOKENS..=MAX_TOTAL_TOKENS).contains(&self.total) {
            return Err(PuzzleError::config(format!(
                "total {} outside {}-{}",
                self.total, MIN_TOTAL_TOKENS, MAX_TOTAL_TOKENS
            )));
        }

        let minimums = [
            self.operators.min(),
            self.equals.min(),
            self.heavy.min(),
            self.wildcards.min(),
            self.zeros.min(),
        ]
        .into_iter()
        .try_fold(0u32, u32::checked_add)
        .ok_or_else(|| PuzzleError::config("category minimums overflow"))?;
        if minimums > self.total {
            return Err(PuzzleError::config(format!(
                "category minimums sum to {} but total is {}",
                minimums, self.total
            )));
        }

        if let OperatorMode::Specific(breakdown) = self.operator_mode {
            if !self.operators.contains(breakdown.total()) {
                return Err(PuzzleError::config(format!(
                    "operator symbols sum to {} which the operators rule {:?} does not admit",
                    breakdown.total(),
                    self.operators
                )));
            }
        }

        if self.feasible_operator_counts().is_empty() {
            return Err(PuzzleError::config(format!(
                "no admitted operator count lays out {} tokens into terms of 1-3 digits \
                 (operators {:?}, heavy {:?})",
                self.total, self.operators, self.heavy
            )));
        }

        if self.lock_mode == LockMode::Enabled && self.total < LOCK_BASE_TOKENS {
            return Err(PuzzleError::config(format!(
                "lock mode needs at least {} tokens, total is {}",
                LOCK_BASE_TOKENS, self.total
            )));
        }

        Ok(())
    }
}

/// Builder for [`ConstraintSpec`]; `build` validates
#[derive(Debug, Clone)]
pub struct ConstraintSpecBuilder {
    spec: ConstraintSpec,
}

impl ConstraintSpecBuilder {
    fn new(total: u32) -> Self {
        Self {
            spec: ConstraintSpec {
                total,
                operators: CountRule::Fixed(1),
                equals: CountRule::Fixed(1),
                heavy: CountRule::Fixed(0),
                wildcards: CountRule::Fixed(0),
                zeros: CountRule::Range { min: 0, max: total },
                operator_mode: OperatorMode::Random,
                lock_mode: LockMode::Disabled,
            },
        }
    }

    pub fn operators(mut self, rule: CountRule) -> Self {
        self.spec.operators = rule;
        self
    }

    pub fn equals(mut self, rule: CountRule) -> Self {
        self.spec.equals = rule;
        self
    }

    pub fn heavy(mut self, rule: CountRule) -> Self {
        self.spec.heavy = rule;
        self
    }

    pub fn wildcards(mut self, rule: CountRule) -> Self {
        self.spec.wildcards = rule;
        self
    }

    pub fn zeros(mut self, rule: CountRule) -> Self {
        self.spec.zeros = rule;
        self
    }

    /// Fix the operator symbols; their sum must satisfy the operators rule
    pub fn operator_symbols(mut self, breakdown: OperatorBreakdown) -> Self {
        self.spec.operator_mode = OperatorMode::Specific(breakdown);
        self
    }

    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.spec.lock_mode = mode;
        self
    }

    pub fn build(self) -> Result<ConstraintSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

// ============================================================================
// Wire form
// ============================================================================

fn default_equals() -> CountRule {
    CountRule::Fixed(1)
}

fn zero_rule() -> CountRule {
    CountRule::Fixed(0)
}

/// Unvalidated constraint spec as found in configuration files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConstraintSpec {
    pub total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<CountRule>,
    #[serde(default = "default_equals")]
    pub equals: CountRule,
    #[serde(default = "zero_rule")]
    pub heavy: CountRule,
    #[serde(default = "zero_rule")]
    pub wildcards: CountRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zeros: Option<CountRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_symbols: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub lock_mode: bool,
}

impl TryFrom<RawConstraintSpec> for ConstraintSpec {
    type Error = PuzzleError;

    fn try_from(raw: RawConstraintSpec) -> Result<Self> {
        let breakdown = raw
            .operator_symbols
            .as_ref()
            .map(OperatorBreakdown::from_symbols)
            .transpose()?;
        // Without an explicit rule the symbol counts define the operator count
        let operators = raw.operators.unwrap_or(match breakdown {
            Some(b) => CountRule::Fixed(b.total()),
            None => CountRule::Fixed(1),
        });

        let mut builder = ConstraintSpec::builder(raw.total)
            .operators(operators)
            .equals(raw.equals)
            .heavy(raw.heavy)
            .wildcards(raw.wildcards)
            .lock_mode(if raw.lock_mode {
                LockMode::Enabled
            } else {
                LockMode::Disabled
            });
        if let Some(zeros) = raw.zeros {
            builder = builder.zeros(zeros);
        }
        if let Some(breakdown) = breakdown {
            builder = builder.operator_symbols(breakdown);
        }
        builder.build()
    }
}

impl From<ConstraintSpec> for RawConstraintSpec {
    fn from(spec: ConstraintSpec) -> Self {
        let operator_symbols = match spec.operator_mode {
            OperatorMode::Specific(b) => Some(b.to_symbols()),
            OperatorMode::Random => None,
        };
        RawConstraintSpec {
            total: spec.total,
            operators: Some(spec.operators),
            equals: spec.equals,
            heavy: spec.heavy,
            wildcards: spec.wildcards,
            zeros: Some(spec.zeros),
            operator_symbols,
            lock_mode: spec.lock_mode == LockMode::Enabled,
        }
    }
}
