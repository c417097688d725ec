//! Round lifecycle and scoring.
//!
//! A round targets one country and allows two attempts:
//! - `AwaitingFirstGuess` → `Resolved` on a correct guess (+1 point)
//! - `AwaitingFirstGuess` → `AwaitingSecondGuess` on a miss
//! - `AwaitingSecondGuess` → `Resolved` either way (+0.5 on a correct guess)
//!
//! `Resolved` is left only by assigning a new target.

use crate::catalog::{CountryRecord, Difficulty};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    AwaitingFirstGuess,
    AwaitingSecondGuess,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Guess(String),
    NewTarget(CountryRecord),
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Outcome of a scored guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Correct { answer: String },
    TryAgain,
    CorrectSecondTry { answer: String },
    Incorrect { answer: String },
}

impl Message {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Correct { .. } | Self::CorrectSecondTry { .. } => Severity::Success,
            Self::TryAgain => Severity::Warning,
            Self::Incorrect { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Correct { answer } => write!(f, "✅ Correct! It's {answer}."),
            Self::TryAgain => f.write_str("❌ Incorrect! One more try."),
            Self::CorrectSecondTry { answer } => {
                write!(f, "✅ Correct on second try! It's {answer}.")
            }
            Self::Incorrect { answer } => {
                write!(f, "❌ Incorrect. The correct answer was {answer}.")
            }
        }
    }
}

/// What the front end should do with the message area after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Show(Message),
    ClearMessage,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoundState {
    target: Option<CountryRecord>,
    // Half points keep 1.0 and 0.5 increments exact.
    half_points: u32,
    phase: Phase,
}

impl RoundState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target(&self) -> Option<&CountryRecord> {
        self.target.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        f64::from(self.half_points) / 2.0
    }

    /// Applies one event and reports how the message area should change.
    #[must_use]
    pub fn transition(mut self, event: RoundEvent) -> (Self, Directive) {
        match event {
            RoundEvent::Restart => (Self::new(), Directive::ClearMessage),
            RoundEvent::NewTarget(record) => {
                self.target = Some(record);
                self.phase = Phase::AwaitingFirstGuess;
                (self, Directive::ClearMessage)
            }
            RoundEvent::Guess(text) => {
                let directive = self.guess(&text);
                (self, directive)
            }
        }
    }

    fn guess(&mut self, text: &str) -> Directive {
        let guess = normalize(text);
        if guess.is_empty() {
            return Directive::Unchanged;
        }
        let Some(target) = &self.target else {
            return Directive::Unchanged;
        };
        let correct = guess == normalize(&target.common_name);
        let answer = target.common_name.clone();

        let message = match (self.phase, correct) {
            (Phase::Resolved, _) => return Directive::Unchanged,
            (Phase::AwaitingFirstGuess, true) => {
                self.half_points = self.half_points.saturating_add(2);
                self.phase = Phase::Resolved;
                Message::Correct { answer }
            }
            (Phase::AwaitingFirstGuess, false) => {
                self.phase = Phase::AwaitingSecondGuess;
                Message::TryAgain
            }
            (Phase::AwaitingSecondGuess, true) => {
                self.half_points = self.half_points.saturating_add(1);
                self.phase = Phase::Resolved;
                Message::CorrectSecondTry { answer }
            }
            (Phase::AwaitingSecondGuess, false) => {
                self.phase = Phase::Resolved;
                Message::Incorrect { answer }
            }
        };
        Directive::Show(message)
    }
}

/// Trims and case-folds a name for comparison.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Initials of every word in the target's name, shown for multi-word rounds.
#[must_use]
pub fn hint(target: &CountryRecord, difficulty: Difficulty) -> Option<String> {
    if difficulty != Difficulty::MultipleWords {
        return None;
    }
    let initials: Vec<String> = target
        .common_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .map(|c| c.to_uppercase().collect())
        .collect();
    Some(initials.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn france() -> CountryRecord {
        CountryRecord::new("France", &["Europe"], "https://flagcdn.com/w320/fr.png")
    }

    fn round_for(target: CountryRecord) -> RoundState {
        RoundState::new().transition(RoundEvent::NewTarget(target)).0
    }

    fn guess(state: RoundState, text: &str) -> (RoundState, Directive) {
        state.transition(RoundEvent::Guess(text.to_string()))
    }

    #[test]
    fn test_new_round_state() {
        let state = RoundState::new();
        assert!(state.target().is_none());
        assert_eq!(state.score(), 0.0);
        assert_eq!(state.phase(), Phase::AwaitingFirstGuess);
    }

    #[test]
    fn test_correct_first_guess() {
        let (state, directive) = guess(round_for(france()), "France");
        assert_eq!(state.score(), 1.0);
        assert_eq!(state.phase(), Phase::Resolved);
        assert_eq!(
            directive,
            Directive::Show(Message::Correct {
                answer: "France".to_string()
            })
        );
    }

    #[test]
    fn test_second_try_scenario() {
        let (state, first) = guess(round_for(france()), "spain");
        assert_eq!(first, Directive::Show(Message::TryAgain));
        assert_eq!(state.score(), 0.0);
        assert_eq!(state.phase(), Phase::AwaitingSecondGuess);

        let (state, second) = guess(state, "france");
        assert_eq!(
            second,
            Directive::Show(Message::CorrectSecondTry {
                answer: "France".to_string()
            })
        );
        assert_eq!(state.score(), 0.5);
        assert_eq!(state.phase(), Phase::Resolved);
    }

    #[test]
    fn test_two_misses_reveal_answer() {
        let (state, _) = guess(round_for(france()), "spain");
        let (state, directive) = guess(state, "italy");
        assert_eq!(
            directive,
            Directive::Show(Message::Incorrect {
                answer: "France".to_string()
            })
        );
        assert_eq!(state.score(), 0.0);
        assert_eq!(state.phase(), Phase::Resolved);
    }

    #[test]
    fn test_guess_normalization() {
        for text in [" France ", "france", "FRANCE", "\tfRaNcE\n"] {
            let (state, _) = guess(round_for(france()), text);
            assert_eq!(state.score(), 1.0, "'{text}' should match France");
        }
    }

    #[test]
    fn test_blank_guess_changes_nothing() {
        for text in ["", "   ", "\t\n"] {
            let before = round_for(france());
            let (after, directive) = guess(before.clone(), text);
            assert_eq!(directive, Directive::Unchanged);
            assert_eq!(after, before);
        }
        let (missed, _) = guess(round_for(france()), "spain");
        let (after, directive) = guess(missed.clone(), "  ");
        assert_eq!(directive, Directive::Unchanged);
        assert_eq!(after, missed);
    }

    #[test]
    fn test_resolved_round_ignores_further_guesses() {
        let (state, _) = guess(round_for(france()), "spain");
        let (state, _) = guess(state, "italy");
        let (state, directive) = guess(state, "france");
        assert_eq!(directive, Directive::Unchanged);
        assert_eq!(state.score(), 0.0);
        assert_eq!(state.phase(), Phase::Resolved);
    }

    #[test]
    fn test_guess_without_target_is_ignored() {
        let (state, directive) = guess(RoundState::new(), "France");
        assert_eq!(directive, Directive::Unchanged);
        assert_eq!(state, RoundState::new());
    }

    #[test]
    fn test_new_target_resets_phase_and_keeps_score() {
        let (state, _) = guess(round_for(france()), "france");
        let japan = CountryRecord::new("Japan", &["Asia"], "");
        let (state, directive) = state.transition(RoundEvent::NewTarget(japan.clone()));
        assert_eq!(directive, Directive::ClearMessage);
        assert_eq!(state.phase(), Phase::AwaitingFirstGuess);
        assert_eq!(state.target(), Some(&japan));
        assert_eq!(state.score(), 1.0);
    }

    #[test]
    fn test_restart_clears_everything() {
        let (state, _) = guess(round_for(france()), "france");
        let (state, directive) = state.transition(RoundEvent::Restart);
        assert_eq!(directive, Directive::ClearMessage);
        assert_eq!(state, RoundState::new());
    }

    #[test]
    fn test_score_only_grows_by_whole_or_half_points() {
        let script = [
            ("france", "x"),
            ("spain", "france"),
            ("spain", "italy"),
            ("france", "france"),
        ];
        let mut state = RoundState::new();
        for (first, second) in script {
            state = state.transition(RoundEvent::NewTarget(france())).0;
            let before = state.score();
            state = guess(state, first).0;
            state = guess(state, second).0;
            let delta = state.score() - before;
            assert!(delta == 0.0 || delta == 0.5 || delta == 1.0, "delta {delta}");
        }
        assert_eq!(state.score(), 2.5);
    }

    #[test]
    fn test_score_saturates_instead_of_overflowing() {
        let mut state = round_for(france());
        state.half_points = u32::MAX - 1;
        let (state, _) = guess(state, "france");
        assert_eq!(state.half_points, u32::MAX);
        let (state, _) = guess(state.transition(RoundEvent::NewTarget(france())).0, "spain");
        let (state, _) = guess(state, "france");
        assert_eq!(state.half_points, u32::MAX);
    }

    #[test]
    fn test_message_text_and_severity() {
        let correct = Message::Correct {
            answer: "France".to_string(),
        };
        assert_eq!(correct.to_string(), "✅ Correct! It's France.");
        assert_eq!(correct.severity(), Severity::Success);
        assert_eq!(Message::TryAgain.severity(), Severity::Warning);
        let missed = Message::Incorrect {
            answer: "France".to_string(),
        };
        assert_eq!(missed.to_string(), "❌ Incorrect. The correct answer was France.");
        assert_eq!(missed.severity(), Severity::Error);
    }

    #[test]
    fn test_hint_for_multiple_words() {
        let korea = CountryRecord::new("South Korea", &["Asia"], "");
        assert_eq!(hint(&korea, Difficulty::MultipleWords), Some("S K".to_string()));
        let png = CountryRecord::new("papua new guinea", &["Oceania"], "");
        assert_eq!(hint(&png, Difficulty::MultipleWords), Some("P N G".to_string()));
    }

    #[test]
    fn test_no_hint_for_single_word() {
        assert_eq!(hint(&france(), Difficulty::OneWord), None);
        let korea = CountryRecord::new("South Korea", &["Asia"], "");
        assert_eq!(hint(&korea, Difficulty::OneWord), None);
    }
}
