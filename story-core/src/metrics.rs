//! Per-run and per-strategy metrics.
//!
//! These numbers are what a strategy comparison looks at: how much the
//! state grew, how many inconsistencies appeared, and how often the same
//! anachronistic object came back after it had already been flagged.

use crate::memory::{BannedObject, NarrativeState, ViolationKind};
use crate::prompt::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Metrics for one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryMetrics {
    pub strategy: Strategy,
    pub turns: usize,
    pub execution_time_seconds: f64,
    pub total_facts: usize,
    pub facts_per_turn: f64,
    pub total_items: usize,
    pub total_inconsistencies: usize,
    /// Inconsistencies per turn.
    pub inconsistency_rate: f64,
    /// Inconsistencies naming an object category that was already flagged.
    pub repeated_inconsistencies: usize,
    pub inconsistencies_by_kind: BTreeMap<ViolationKind, usize>,
    pub avg_turn_length_words: f64,
    pub turn_lengths: Vec<usize>,
}

impl StoryMetrics {
    pub fn from_state(
        state: &NarrativeState,
        strategy: Strategy,
        total_turns: usize,
        elapsed: Duration,
    ) -> Self {
        let mut by_kind = BTreeMap::new();
        let mut seen = HashSet::new();
        let mut repeated = 0;

        for inconsistency in state.inconsistencies() {
            *by_kind.entry(inconsistency.kind).or_insert(0) += 1;
            for object in BannedObject::detect(&inconsistency.description) {
                if !seen.insert(object) {
                    repeated += 1;
                }
            }
        }

        let turn_lengths: Vec<usize> = state
            .history()
            .iter()
            .map(|turn| turn.assistant.split_whitespace().count())
            .collect();
        let avg_turn_length_words = if turn_lengths.is_empty() {
            0.0
        } else {
            turn_lengths.iter().sum::<usize>() as f64 / turn_lengths.len() as f64
        };

        let total_facts = state.facts().len();
        let total_inconsistencies = state.inconsistencies().len();

        Self {
            strategy,
            turns: total_turns,
            execution_time_seconds: elapsed.as_secs_f64(),
            total_facts,
            facts_per_turn: per_turn(total_facts, total_turns),
            total_items: state.items().len(),
            total_inconsistencies,
            inconsistency_rate: per_turn(total_inconsistencies, total_turns),
            repeated_inconsistencies: repeated,
            inconsistencies_by_kind: by_kind,
            avg_turn_length_words,
            turn_lengths,
        }
    }
}

fn per_turn(count: usize, turns: usize) -> f64 {
    if turns == 0 {
        0.0
    } else {
        count as f64 / turns as f64
    }
}

/// Averages over several runs of the same strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub strategy: Strategy,
    pub runs: usize,
    pub avg_facts: f64,
    pub avg_items: f64,
    pub avg_inconsistencies: f64,
    pub avg_repeated_inconsistencies: f64,
    pub avg_inconsistency_rate: f64,
    pub avg_turn_length: f64,
}

impl StrategyStats {
    /// Average the runs of `strategy`; runs of other strategies are ignored.
    ///
    /// Returns `None` when there is no matching run.
    pub fn from_runs(strategy: Strategy, runs: &[StoryMetrics]) -> Option<Self> {
        let runs: Vec<&StoryMetrics> = runs.iter().filter(|m| m.strategy == strategy).collect();
        if runs.is_empty() {
            return None;
        }
        let n = runs.len() as f64;
        let avg = |f: fn(&StoryMetrics) -> f64| runs.iter().map(|m| f(m)).sum::<f64>() / n;

        Some(Self {
            strategy,
            runs: runs.len(),
            avg_facts: avg(|m| m.total_facts as f64),
            avg_items: avg(|m| m.total_items as f64),
            avg_inconsistencies: avg(|m| m.total_inconsistencies as f64),
            avg_repeated_inconsistencies: avg(|m| m.repeated_inconsistencies as f64),
            avg_inconsistency_rate: avg(|m| m.inconsistency_rate),
            avg_turn_length: avg(|m| m.avg_turn_length_words),
        })
    }

    /// Percent fewer inconsistencies than `baseline` (0 when it has none).
    pub fn inconsistency_reduction(&self, baseline: &StrategyStats) -> f64 {
        reduction(baseline.avg_inconsistencies, self.avg_inconsistencies)
    }

    /// Percent fewer repeated inconsistencies than `baseline`.
    pub fn repeat_reduction(&self, baseline: &StrategyStats) -> f64 {
        reduction(
            baseline.avg_repeated_inconsistencies,
            self.avg_repeated_inconsistencies,
        )
    }
}

fn reduction(baseline: f64, value: f64) -> f64 {
    if baseline > 0.0 {
        (baseline - value) / baseline * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_state;

    fn state_with_repeats() -> NarrativeState {
        let mut state = sample_state();
        state.append_turn("a", "one two three four");
        state.append_turn("b", "five six");
        state.record_inconsistency(ViolationKind::Anachronism, "a telescope", "x", 0);
        state.record_inconsistency(ViolationKind::Anachronism, "the spyglass again", "x", 1);
        state.record_inconsistency(ViolationKind::Contradiction, "pistol and telescope", "x", 1);
        state
    }

    #[test]
    fn test_metrics_from_state() {
        let metrics = StoryMetrics::from_state(
            &state_with_repeats(),
            Strategy::Baseline,
            2,
            Duration::from_millis(1500),
        );

        assert_eq!(metrics.total_facts, 1);
        assert_eq!(metrics.facts_per_turn, 0.5);
        assert_eq!(metrics.total_inconsistencies, 3);
        assert_eq!(metrics.inconsistency_rate, 1.5);
        // Spotting device seen three times: two repeats. Firearm once.
        assert_eq!(metrics.repeated_inconsistencies, 2);
        assert_eq!(metrics.inconsistencies_by_kind[&ViolationKind::Anachronism], 2);
        assert_eq!(metrics.inconsistencies_by_kind[&ViolationKind::Contradiction], 1);
        assert_eq!(metrics.turn_lengths, vec![4, 2]);
        assert_eq!(metrics.avg_turn_length_words, 3.0);
        assert_eq!(metrics.execution_time_seconds, 1.5);
    }

    #[test]
    fn test_zero_turns() {
        let metrics =
            StoryMetrics::from_state(&sample_state(), Strategy::Feedback, 0, Duration::ZERO);
        assert_eq!(metrics.facts_per_turn, 0.0);
        assert_eq!(metrics.avg_turn_length_words, 0.0);
    }

    #[test]
    fn test_strategy_stats() {
        let state = state_with_repeats();
        let b1 = StoryMetrics::from_state(&state, Strategy::Baseline, 2, Duration::ZERO);
        let mut b2 = b1.clone();
        b2.total_inconsistencies = 5;
        let a = StoryMetrics::from_state(&sample_state(), Strategy::Feedback, 2, Duration::ZERO);

        let runs = vec![b1, b2, a];
        let baseline = StrategyStats::from_runs(Strategy::Baseline, &runs).unwrap();
        let feedback = StrategyStats::from_runs(Strategy::Feedback, &runs).unwrap();

        assert_eq!(baseline.runs, 2);
        assert_eq!(baseline.avg_inconsistencies, 4.0);
        assert_eq!(feedback.avg_inconsistencies, 0.0);
        assert_eq!(feedback.inconsistency_reduction(&baseline), 100.0);
        assert_eq!(feedback.repeat_reduction(&baseline), 100.0);
        assert!(StrategyStats::from_runs(Strategy::Feedback, &[]).is_none());
    }
}
