//! Fixed-size token multiset

use super::kinds::{ChoiceOperator, DisplayToken, Operator, KIND_COUNT, MAX_LIGHT_NUMBER};

/// Copies of one tile kind a [`TokenCounts`] can hold
pub const MAX_PER_KIND: usize = u8::MAX as usize;

/// Multiset of display tokens, one counter per token kind.
///
/// Small enough to copy and hash, so it doubles as part of the solver's memo key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenCounts {
    counts: [u8; KIND_COUNT],
}

impl TokenCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `tokens`; kinds past [`MAX_PER_KIND`] copies saturate, so use
    /// [`try_from_tokens`](Self::try_from_tokens) for unbounded input
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a DisplayToken>,
    {
        let mut counts = Self::new();
        for token in tokens {
            counts.add(*token);
        }
        counts
    }

    /// Count `tokens`, or `None` if some kind exceeds [`MAX_PER_KIND`]
    pub fn try_from_tokens<'a, I>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a DisplayToken>,
    {
        let mut counts = Self::new();
        for token in tokens {
            if !counts.try_add(*token) {
                return None;
            }
        }
        Some(counts)
    }

    #[inline]
    pub fn get(&self, token: DisplayToken) -> u8 {
        self.counts[token.kind_index()]
    }

    #[inline]
    pub fn add(&mut self, token: DisplayToken) {
        let slot = &mut self.counts[token.kind_index()];
        *slot = slot.saturating_add(1);
    }

    /// Add one occurrence unless the kind is full
    #[inline]
    pub fn try_add(&mut self, token: DisplayToken) -> bool {
        let slot = &mut self.counts[token.kind_index()];
        match slot.checked_add(1) {
            Some(n) => {
                *slot = n;
                true
            }
            None => false,
        }
    }

    /// Remove one occurrence; returns false if none was present
    #[inline]
    pub fn remove(&mut self, token: DisplayToken) -> bool {
        let slot = &mut self.counts[token.kind_index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Present kinds with their multiplicity, in kind order
    pub fn iter(&self) -> impl Iterator<Item = (DisplayToken, u8)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .filter_map(|(i, &c)| DisplayToken::from_kind_index(i).map(|t| (t, c)))
    }

    /// Number tiles (light and heavy), excluding wildcards
    pub fn numbers(&self) -> usize {
        self.counts[..=20].iter().map(|&c| c as usize).sum()
    }

    pub fn light_numbers(&self) -> usize {
        self.counts[..=MAX_LIGHT_NUMBER as usize]
            .iter()
            .map(|&c| c as usize)
            .sum()
    }

    pub fn heavy_numbers(&self) -> usize {
        self.numbers() - self.light_numbers()
    }

    pub fn zeros(&self) -> usize {
        self.get(DisplayToken::Number(0)) as usize
    }

    pub fn wildcards(&self) -> usize {
        self.get(DisplayToken::Wildcard) as usize
    }

    pub fn equals(&self) -> usize {
        self.get(DisplayToken::Equals) as usize
    }

    /// Concrete operators plus choice operators
    pub fn operators(&self) -> usize {
        let concrete: usize = Operator::ALL
            .iter()
            .map(|&op| self.get(DisplayToken::Op(op)) as usize)
            .sum();
        concrete
            + self.get(DisplayToken::Choice(ChoiceOperator::AddSub)) as usize
            + self.get(DisplayToken::Choice(ChoiceOperator::MulDiv)) as usize
    }

    /// Whether any remaining tile could become `×` or `÷`
    pub fn has_multiplicative(&self) -> bool {
        self.get(DisplayToken::Op(Operator::Mul)) > 0
            || self.get(DisplayToken::Op(Operator::Div)) > 0
            || self.get(DisplayToken::Choice(ChoiceOperator::MulDiv)) > 0
            || self.wildcards() > 0
    }
}

impl<'a> FromIterator<&'a DisplayToken> for TokenCounts {
    fn from_iter<I: IntoIterator<Item = &'a DisplayToken>>(iter: I) -> Self {
        Self::from_tokens(iter)
    }
}

impl FromIterator<DisplayToken> for TokenCounts {
    fn from_iter<I: IntoIterator<Item = DisplayToken>>(iter: I) -> Self {
        let mut counts = Self::new();
        for token in iter {
            counts.add(token);
        }
        counts
    }
}
