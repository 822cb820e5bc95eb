//! FAQ traversal replay.
//!
//! The FAQ section "walks" its items either breadth-first (grouped by
//! category) or depth-first (page order), lighting one item up per step.
//! The replay is a pure function of elapsed time.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::IntroError;

/// Category order used for breadth-first replays on the site.
pub const DEFAULT_CATEGORY_ORDER: &[&str] = &["General", "Registration", "Prizes", "Technical"];

/// Delay between two visited items.
pub const STEP_INTERVAL: Duration = Duration::from_millis(350);

/// Settle time after the last item before the replay counts as complete.
pub const SETTLE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Grouped by category.
    #[default]
    Bfs,
    /// Page order.
    Dfs,
}

impl FromStr for TraversalMode {
    type Err = IntroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" => Ok(TraversalMode::Bfs),
            "dfs" => Ok(TraversalMode::Dfs),
            other => Err(IntroError::invalid_config(format!(
                "unknown traversal mode '{other}' (expected bfs or dfs)"
            ))),
        }
    }
}

/// Visit order as item indices.
///
/// `categories[i]` is the category of item `i`. Breadth-first groups items
/// by `category_order`; items in unlisted categories follow in page order.
pub fn traversal_order<S: AsRef<str>>(
    categories: &[S],
    mode: TraversalMode,
    category_order: &[&str],
) -> Vec<usize> {
    match mode {
        TraversalMode::Dfs => (0..categories.len()).collect(),
        TraversalMode::Bfs => {
            let rank = |category: &str| {
                category_order
                    .iter()
                    .position(|c| *c == category)
                    .unwrap_or(category_order.len())
            };
            let mut order: Vec<usize> = (0..categories.len()).collect();
            // Stable sort keeps page order within a category.
            order.sort_by_key(|&idx| rank(categories[idx].as_ref()));
            order
        }
    }
}

/// Timed replay of a visit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalReplay {
    order: Vec<usize>,
}

impl TraversalReplay {
    pub fn new(order: Vec<usize>) -> Self {
        Self { order }
    }

    /// Builds the replay for `categories` in `mode` using the site's
    /// category order.
    pub fn for_categories<S: AsRef<str>>(categories: &[S], mode: TraversalMode) -> Self {
        Self::new(traversal_order(categories, mode, DEFAULT_CATEGORY_ORDER))
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Total replay length, settle included.
    pub fn duration(&self) -> Duration {
        STEP_INTERVAL * self.order.len() as u32 + SETTLE
    }

    /// Items visited by `elapsed`, in visit order. Item `i` of the order is
    /// visited at `i * STEP_INTERVAL`.
    pub fn visited(&self, elapsed: Duration) -> &[usize] {
        if self.order.is_empty() {
            return &[];
        }
        let steps = (elapsed.as_millis() / STEP_INTERVAL.as_millis()) as usize + 1;
        &self.order[..steps.min(self.order.len())]
    }

    /// Item being highlighted, or `None` once the replay is complete.
    pub fn current(&self, elapsed: Duration) -> Option<usize> {
        if self.is_complete(elapsed) {
            return None;
        }
        self.visited(elapsed).last().copied()
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration()
    }

    /// 1-based visit number of `item` by `elapsed`, as shown on its badge.
    pub fn visit_number(&self, item: usize, elapsed: Duration) -> Option<usize> {
        self.visited(elapsed)
            .iter()
            .position(|&idx| idx == item)
            .map(|pos| pos + 1)
    }
}

// =============================================================================
// TESTS
// =============================================================================
