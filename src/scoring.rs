use std::collections::BTreeMap;

use crate::text_source::TargetText;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Position of the word being typed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub word_index: usize,
    /// Character offset of the word start in the rendered text, spaces included.
    pub char_offset: usize,
}

impl Cursor {
    fn advance(&mut self, word_len: usize) {
        self.word_index += 1;
        self.char_offset += word_len + 1;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LetterTally {
    pub total: u32,
    pub correct: u32,
}

impl LetterTally {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

pub type LetterStats = BTreeMap<char, LetterTally>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateCounters {
    pub correct_chars: u32,
    pub total_chars: u32,
    pub words_completed: u32,
}

/// How one character of the target text was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharMark {
    /// Offset in the rendered text.
    pub offset: usize,
    pub expected: char,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredWord {
    pub word_index: usize,
    pub char_offset: usize,
    pub marks: Vec<CharMark>,
    pub overrun: bool,
    pub finished: bool,
    pub counters: AggregateCounters,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WordResult {
    /// Nothing but whitespace was submitted.
    Ignored,
    Scored(ScoredWord),
}

impl WordResult {
    pub fn finished(&self) -> bool {
        matches!(self, WordResult::Scored(scored) if scored.finished)
    }
}

/// Scores submitted words and keeps the running tallies for one session.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    counters: AggregateCounters,
    letters: LetterStats,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> AggregateCounters {
        self.counters
    }

    pub fn letter_stats(&self) -> &LetterStats {
        &self.letters
    }

    pub fn reset(&mut self) {
        self.counters = AggregateCounters::default();
        self.letters.clear();
    }

    fn record_letter(&mut self, letter: char, outcome: Outcome) {
        let tally = self.letters.entry(letter).or_default();
        tally.total += 1;
        if outcome == Outcome::Correct {
            tally.correct += 1;
        }
    }

    /// Score `typed` against the word under `cursor` and move the cursor on.
    pub fn submit_word(
        &mut self,
        text: &TargetText,
        cursor: &mut Cursor,
        typed: &str,
    ) -> WordResult {
        let typed = typed.trim();
        if typed.is_empty() {
            return WordResult::Ignored;
        }
        let Some(expected) = text.word(cursor.word_index) else {
            return WordResult::Ignored;
        };

        let typed: Vec<char> = typed.chars().collect();
        let start = *cursor;
        let mut marks = Vec::new();
        let mut expected_len = 0;

        for (i, letter) in expected.chars().enumerate() {
            expected_len += 1;
            self.counters.total_chars += 1;

            let outcome = if typed.get(i) == Some(&letter) {
                self.counters.correct_chars += 1;
                Outcome::Correct
            } else {
                Outcome::Incorrect
            };
            self.record_letter(letter, outcome);
            marks.push(CharMark {
                offset: start.char_offset + i,
                expected: letter,
                outcome,
            });
        }

        // extra characters cost a single credit, however many there are
        let overrun = typed.len() > expected_len;
        if overrun {
            self.counters.correct_chars = self.counters.correct_chars.saturating_sub(1);
        }

        self.counters.words_completed += 1;
        cursor.advance(expected_len);

        WordResult::Scored(ScoredWord {
            word_index: start.word_index,
            char_offset: start.char_offset,
            marks,
            overrun,
            finished: cursor.word_index >= text.len(),
            counters: self.counters,
        })
    }
}
