//! Closing quiz.
//!
//! The first answer to a question is final. The chosen option is shown right away
//! (correct/incorrect styling); scoring and moving on happen one second later.

use tracing::{debug, info};

use crate::clock::{Animated, Millis, Timeline};
use crate::content::{Question, QuestionBank};
use crate::error::{ExplorerError, Outcome, Result};

/// Delay between selecting an option and scoring it.
pub const REVEAL_MS: Millis = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuizPhase {
    Answering { index: usize },
    Revealed { index: usize, correct: bool },
    Complete { score: u32, total: usize },
}

/// Styling for one option button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionFeedback {
    Neutral,
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    Answer(usize),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuizState {
    pub current_question_index: usize,
    pub score: u32,
    pub selected_option: Option<usize>,
    pub completed: bool,
}

#[derive(Debug)]
struct Reveal {
    correct: bool,
}

#[derive(Debug)]
pub struct Quiz {
    bank: QuestionBank,
    index: usize,
    score: u32,
    selected: Option<usize>,
    completed: bool,
    timeline: Timeline<Reveal>,
}

impl Default for Quiz {
    fn default() -> Self {
        Self::new(QuestionBank::builtin())
    }
}

impl Quiz {
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank,
            index: 0,
            score: 0,
            selected: None,
            completed: false,
            timeline: Timeline::new(),
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn total(&self) -> usize {
        self.bank.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Question on screen, `None` once the quiz is complete.
    pub fn current(&self) -> Option<&Question> {
        if self.completed {
            None
        } else {
            self.bank.get(self.index)
        }
    }

    pub fn state(&self) -> QuizState {
        QuizState {
            current_question_index: self.index,
            score: self.score,
            selected_option: self.selected,
            completed: self.completed,
        }
    }

    pub fn phase(&self) -> QuizPhase {
        if self.completed {
            return QuizPhase::Complete {
                score: self.score,
                total: self.total(),
            };
        }
        match (self.selected, self.current()) {
            (Some(option), Some(q)) => QuizPhase::Revealed {
                index: self.index,
                correct: option == q.correct_option,
            },
            _ => QuizPhase::Answering { index: self.index },
        }
    }

    pub fn option_feedback(&self, option: usize) -> OptionFeedback {
        match (self.selected, self.current()) {
            (Some(sel), Some(q)) if sel == option => {
                if option == q.correct_option {
                    OptionFeedback::Correct
                } else {
                    OptionFeedback::Incorrect
                }
            }
            _ => OptionFeedback::Neutral,
        }
    }

    pub fn apply(&mut self, now: Millis, event: QuizEvent) -> Result<Outcome> {
        match event {
            QuizEvent::Answer(option) => self.submit(now, option),
            QuizEvent::Reset => Ok(self.reset()),
        }
    }

    /// Answer the current question. Later answers to the same question are dropped.
    pub fn submit(&mut self, now: Millis, option: usize) -> Result<Outcome> {
        let Some(question) = self.current() else {
            debug!(option, "quiz complete; answer ignored");
            return Ok(Outcome::Ignored);
        };
        let len = question.options.len();
        if option >= len {
            return Err(ExplorerError::OptionOutOfRange { index: option, len });
        }
        if self.selected.is_some() {
            debug!(option, index = self.index, "question already answered");
            return Ok(Outcome::Ignored);
        }

        let correct = option == question.correct_option;
        self.selected = Some(option);
        self.timeline.sync(now);
        self.timeline.schedule_in(REVEAL_MS, Reveal { correct });
        debug!(index = self.index, option, correct, "answer selected");
        Ok(Outcome::Accepted)
    }

    /// Back to the first question. Only available from the result screen.
    pub fn reset(&mut self) -> Outcome {
        if !self.completed {
            debug!("quiz not complete; reset ignored");
            return Outcome::Ignored;
        }
        self.timeline.cancel();
        self.index = 0;
        self.score = 0;
        self.selected = None;
        self.completed = false;
        info!("quiz reset");
        Outcome::Accepted
    }

    fn reveal(&mut self, correct: bool) {
        if correct {
            self.score += 1;
        }
        if self.index + 1 < self.total() {
            self.index += 1;
            self.selected = None;
        } else {
            self.completed = true;
            self.selected = None;
            info!(score = self.score, total = self.total(), "quiz complete");
        }
    }
}

impl Animated for Quiz {
    fn advance_to(&mut self, now: Millis) {
        while let Some((_, Reveal { correct })) = self.timeline.pop_due(now) {
            self.reveal(correct);
        }
        self.timeline.sync(now);
    }

    /// Drops a pending reveal; the selection is cleared so the question can be answered again.
    fn cancel(&mut self) {
        if self.timeline.cancel() > 0 {
            self.selected = None;
        }
    }

    fn next_deadline(&self) -> Option<Millis> {
        self.timeline.next_deadline()
    }

    fn is_active(&self) -> bool {
        !self.timeline.is_empty()
    }
}
