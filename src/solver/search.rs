//! Memoized depth-first search over tile arrangements

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::warn;

use super::bound::feasible;
use super::evaluator::Cursor;
use crate::token::{
    format_tokens, ConcreteToken, DisplayToken, LockedPosition, PlacedTile, TokenCounts,
};

/// Default cap on node expansions per search
pub const DEFAULT_NODE_BUDGET: u64 = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    pub node_budget: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            node_budget: DEFAULT_NODE_BUDGET,
        }
    }
}

/// One complete arrangement of a token set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equation {
    tiles: Vec<PlacedTile>,
}

impl Equation {
    pub fn new(tiles: Vec<PlacedTile>) -> Self {
        Self { tiles }
    }

    pub fn tiles(&self) -> &[PlacedTile] {
        &self.tiles
    }

    /// Concrete values in arrangement order
    pub fn values(&self) -> Vec<ConcreteToken> {
        self.tiles.iter().map(|t| t.value).collect()
    }

    /// Tiles as they appear among the elements, in arrangement order
    pub fn shown(&self) -> Vec<DisplayToken> {
        self.tiles.iter().map(|t| t.shown).collect()
    }

    pub fn into_tiles(self) -> Vec<PlacedTile> {
        self.tiles
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_tokens(&self.values()))
    }
}

/// Outcome of an enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveReport {
    pub equations: Vec<Equation>,
    /// The node budget ran out before the search space was covered
    pub exhausted: bool,
    pub nodes: u64,
}

/// Outcome of a count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountReport {
    /// Distinct arrangements found, saturating at the cap
    pub count: u64,
    pub exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StateKey {
    remaining: TokenCounts,
    cursor: Cursor,
}

type Successors = SmallVec<[(PlacedTile, TokenCounts, Cursor); 32]>;

/// Stateless equation solver; cheap to clone and share
#[derive(Debug, Clone, Copy, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    /// Whether at least one valid arrangement exists
    pub fn is_solvable(&self, tokens: &[DisplayToken]) -> bool {
        self.find_one(tokens).is_some()
    }

    pub fn find_one(&self, tokens: &[DisplayToken]) -> Option<Equation> {
        self.find_with_locks(tokens, &[])
    }

    /// First arrangement whose slot `lock.index` takes `lock.value` for every lock
    pub fn find_with_locks(
        &self,
        tokens: &[DisplayToken],
        locks: &[LockedPosition],
    ) -> Option<Equation> {
        let report = self.search(tokens, locks, 1);
        if report.exhausted {
            return None;
        }
        report.equations.into_iter().next()
    }

    /// Collect up to `cap` distinct arrangements
    pub fn enumerate(&self, tokens: &[DisplayToken], cap: usize) -> SolveReport {
        self.search(tokens, &[], cap)
    }

    /// Count distinct arrangements, stopping at `cap`
    pub fn count_equations(&self, tokens: &[DisplayToken], cap: u64) -> CountReport {
        if tokens.is_empty() || cap == 0 {
            return CountReport::default();
        }
        let mut counter = Counter {
            budget: self.config.node_budget,
            nodes: 0,
            exhausted: false,
            cap,
            memo: AHashMap::new(),
        };
        let Some(remaining) = TokenCounts::try_from_tokens(tokens) else {
            warn!(target: "solver", tiles = tokens.len(), "Too many copies of one tile to count");
            return CountReport::default();
        };
        let count = counter.count(remaining, Cursor::new());
        if counter.exhausted {
            warn!(
                target: "solver",
                tokens = %format_tokens(tokens),
                nodes = counter.nodes,
                "Node budget exhausted while counting equations"
            );
        }
        CountReport {
            count: count.min(cap),
            exhausted: counter.exhausted,
        }
    }

    fn search(
        &self,
        tokens: &[DisplayToken],
        locks: &[LockedPosition],
        cap: usize,
    ) -> SolveReport {
        if tokens.is_empty() || cap == 0 {
            return SolveReport::default();
        }
        let Some(remaining) = TokenCounts::try_from_tokens(tokens) else {
            warn!(target: "solver", tiles = tokens.len(), "Too many copies of one tile to search");
            return SolveReport::default();
        };
        let mut slots = vec![None; tokens.len()];
        for lock in locks {
            let Some(slot) = slots.get_mut(lock.index) else {
                return SolveReport::default();
            };
            match *slot {
                None => *slot = Some(lock.value),
                Some(value) if value == lock.value => {}
                Some(_) => return SolveReport::default(),
            }
        }

        let mut search = Search {
            slots,
            budget: self.config.node_budget,
            nodes: 0,
            exhausted: false,
            cap,
            dead: AHashSet::new(),
            path: Vec::with_capacity(tokens.len()),
            found: Vec::new(),
        };
        search.explore(remaining, Cursor::new());
        if search.exhausted {
            warn!(
                target: "solver",
                tokens = %format_tokens(tokens),
                nodes = search.nodes,
                found = search.found.len(),
                "Node budget exhausted"
            );
        }
        SolveReport {
            equations: search.found,
            exhausted: search.exhausted,
            nodes: search.nodes,
        }
    }
}

// ============================================================================
// Search internals
// ============================================================================

/// Every tile that may legally come next
fn successors(
    remaining: &TokenCounts,
    cursor: &Cursor,
    lock: Option<ConcreteToken>,
) -> Successors {
    let mut out = Successors::new();
    for (shown, _) in remaining.iter() {
        let mut next = *remaining;
        next.remove(shown);
        for &value in shown.candidates() {
            if lock.is_some_and(|locked| locked != value) {
                continue;
            }
            let Ok(cursor) = cursor.push(value) else {
                continue;
            };
            if feasible(&next, &cursor) {
                out.push((PlacedTile { shown, value }, next, cursor));
            }
        }
    }
    out
}

#[inline]
fn is_balanced(cursor: &Cursor) -> bool {
    matches!(cursor.finish(), Ok((l, r)) if l == r)
}

struct Search {
    /// Locked value per answer slot
    slots: Vec<Option<ConcreteToken>>,
    budget: u64,
    nodes: u64,
    exhausted: bool,
    cap: usize,
    /// States known to admit no completion
    dead: AHashSet<StateKey>,
    path: Vec<PlacedTile>,
    found: Vec<Equation>,
}

impl Search {
    #[inline]
    fn done(&self) -> bool {
        self.exhausted || self.found.len() >= self.cap
    }

    fn explore(&mut self, remaining: TokenCounts, cursor: Cursor) -> bool {
        if remaining.is_empty() {
            if is_balanced(&cursor) {
                self.found.push(Equation::new(self.path.clone()));
                return true;
            }
            return false;
        }

        let key = StateKey { remaining, cursor };
        if self.dead.contains(&key) {
            return false;
        }
        self.nodes += 1;
        if self.nodes > self.budget {
            self.exhausted = true;
            return false;
        }

        let position = self.slots.len() - remaining.total();
        let lock = self.slots.get(position).copied().flatten();
        let mut any = false;
        for (tile, next, next_cursor) in successors(&remaining, &cursor, lock) {
            self.path.push(tile);
            any |= self.explore(next, next_cursor);
            self.path.pop();
            if self.done() {
                return any;
            }
        }
        if !any {
            self.dead.insert(key);
        }
        any
    }
}

struct Counter {
    budget: u64,
    nodes: u64,
    exhausted: bool,
    cap: u64,
    memo: AHashMap<StateKey, u64>,
}

impl Counter {
    fn count(&mut self, remaining: TokenCounts, cursor: Cursor) -> u64 {
        if remaining.is_empty() {
            return u64::from(is_balanced(&cursor));
        }

        let key = StateKey { remaining, cursor };
        if let Some(&count) = self.memo.get(&key) {
            return count;
        }
        self.nodes += 1;
        if self.nodes > self.budget {
            self.exhausted = true;
            return 0;
        }

        let mut total = 0u64;
        for (_, next, next_cursor) in successors(&remaining, &cursor, None) {
            total = total.saturating_add(self.count(next, next_cursor)).min(self.cap);
            if self.exhausted {
                return total;
            }
        }
        self.memo.insert(key, total);
        total
    }
}
