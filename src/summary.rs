use crate::metrics::{DerivedMetrics, MetricsDisplay};
use crate::scoring::{AggregateCounters, LetterStats};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharAccuracy {
    pub character: char,
    pub ratio: f64,
}

/// How the typing phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionEnd {
    Finished,
    Terminated,
}

/// Everything the summary view shows for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub ended: SessionEnd,
    pub counters: AggregateCounters,
    pub metrics: DerivedMetrics,
    pub display: MetricsDisplay,
    pub show_stats: bool,
    /// Present only when the graph is enabled and some letter was typed correctly.
    pub accuracy_by_char: Option<Vec<CharAccuracy>>,
}

pub struct SummaryBuilder;

impl SummaryBuilder {
    /// Accuracy per letter in ascending character order.
    pub fn accuracy_by_char(letters: &LetterStats) -> Vec<CharAccuracy> {
        letters
            .iter()
            .map(|(&character, tally)| CharAccuracy {
                character,
                ratio: tally.accuracy(),
            })
            .collect()
    }

    pub fn has_graph_data(letters: &LetterStats) -> bool {
        letters.values().any(|tally| tally.correct > 0)
    }
}
