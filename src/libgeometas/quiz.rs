use crate::libgeometas::dataset::{Dataset, Meta};
use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;
use thiserror::Error;

/// The "nothing chosen yet" entry at the top of the guess list. Never counts as a guess.
pub const PLACEHOLDER: &str = "Select a country...";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("no metas with images to quiz on")]
    EmptyDataset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub country: String,
    pub meta: Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoQuestion,
    AwaitingGuess,
    Revealed,
}

/// The answer shown after a guess, right or wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub correct: bool,
    pub country: String,
    pub caption: String,
}

/// One quiz run over a fixed dataset. Score and attempts live as long as the session.
#[derive(Debug)]
pub struct QuizSession {
    dataset: Dataset,
    countries: Vec<String>,
    score: u32,
    attempts: u32,
    current: Option<QuizQuestion>,
    revealed: bool,
}

impl QuizSession {
    /// Guess options are the dataset's own countries.
    #[cfg(test)]
    pub fn new(dataset: Dataset) -> Self {
        let countries = dataset.countries().map(str::to_string).collect();
        Self::with_countries(dataset, countries)
    }

    /// Guess options come from `countries`, in that order.
    pub fn with_countries(dataset: Dataset, countries: Vec<String>) -> Self {
        Self {
            dataset,
            countries,
            score: 0,
            attempts: 0,
            current: None,
            revealed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.current, self.revealed) {
            (None, _) => Phase::NoQuestion,
            (Some(_), false) => Phase::AwaitingGuess,
            (Some(_), true) => Phase::Revealed,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(test)]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.current.as_ref()
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// [`PLACEHOLDER`] followed by every country.
    pub fn guess_options(&self) -> Vec<&str> {
        std::iter::once(PLACEHOLDER)
            .chain(self.countries.iter().map(String::as_str))
            .collect()
    }

    /// Returns the pending question, picking a new one first if there is none.
    pub fn next_question<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&QuizQuestion, QuizError> {
        let question = match self.current.take() {
            Some(question) => question,
            None => {
                let question = pick_question(&self.dataset, rng)?;
                debug!("[Quiz] New question from {}", question.country);
                self.revealed = false;
                question
            }
        };
        Ok(&*self.current.insert(question))
    }

    /// Scores `guess` against the pending question. Ignored (`None`) unless a question is
    /// awaiting a guess and `guess` is not the placeholder.
    pub fn submit_guess(&mut self, guess: &str) -> Option<Reveal> {
        if self.phase() != Phase::AwaitingGuess || guess == PLACEHOLDER {
            return None;
        }
        let question = self.current.as_ref()?;
        let correct = guess == question.country;

        self.attempts += 1;
        if correct {
            self.score += 1;
        }
        self.revealed = true;
        info!(
            "[Quiz] Guessed {:?} for {:?}: {} ({}/{})",
            guess,
            question.country,
            if correct { "correct" } else { "wrong" },
            self.score,
            self.attempts
        );

        Some(Reveal {
            correct,
            country: question.country.clone(),
            caption: question.meta.caption.clone(),
        })
    }

    /// Drops the revealed question, keeping the score. Returns false if nothing was revealed.
    pub fn advance(&mut self) -> bool {
        if self.phase() != Phase::Revealed {
            return false;
        }
        self.current = None;
        self.revealed = false;
        true
    }
}

/// Uniform over countries that have an image, then uniform over that country's image metas.
fn pick_question<R: Rng + ?Sized>(dataset: &Dataset, rng: &mut R) -> Result<QuizQuestion, QuizError> {
    let eligible = dataset.eligible_countries();
    let country = *eligible.choose(rng).ok_or(QuizError::EmptyDataset)?;
    let metas: Vec<&Meta> = dataset
        .get(country)
        .unwrap_or_default()
        .iter()
        .filter(|meta| meta.has_image())
        .collect();
    let meta = *metas.choose(rng).ok_or(QuizError::EmptyDataset)?;

    Ok(QuizQuestion {
        country: country.to_string(),
        meta: meta.clone(),
    })
}
