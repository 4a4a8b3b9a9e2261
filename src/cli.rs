use crate::libgeometas::progress::{fraction, Progress};
use crate::libgeometas::quiz::{QuizError, QuizSession, PLACEHOLDER};
use colored::Colorize;
use log::debug;
use rand::rng;
use std::io::{self, BufRead, Write};

#[derive(Debug, PartialEq)]
pub enum Choice {
    Guess(String),
    List(String),
    Unknown(String),
    Quit,
}

impl Choice {
    /// Country names match case-insensitively and resolve to their listed spelling.
    pub fn from_str(countries: &[String], input: &str) -> Choice {
        let input = input.trim();
        match input {
            "q" => Choice::Quit,
            _ if input.starts_with('?') => Choice::List(input[1..].trim().to_string()),
            _ => match countries.iter().find(|c| c.eq_ignore_ascii_case(input)) {
                Some(country) => Choice::Guess(country.clone()),
                None => {
                    let lower = input.to_lowercase();
                    match countries.iter().find(|c| c.to_lowercase() == lower) {
                        Some(country) => Choice::Guess(country.clone()),
                        None => Choice::Unknown(input.to_string()),
                    }
                }
            },
        }
    }
}

/// One line without its line ending. `None` once input is exhausted.
fn read_input<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn prompt(text: &str) -> Option<String> {
    print!("{} ", text.cyan());
    io::stdout().flush().ok();
    read_input(&mut io::stdin().lock())
}

/// Guess options starting with `prefix`, without the placeholder.
fn matching_options<'a>(options: &[&'a str], prefix: &str) -> Vec<&'a str> {
    let prefix = prefix.to_lowercase();
    options
        .iter()
        .copied()
        .filter(|option| *option != PLACEHOLDER && option.to_lowercase().starts_with(&prefix))
        .collect()
}

fn print_matches(options: &[&str], prefix: &str) {
    let matches = matching_options(options, prefix);
    if matches.is_empty() {
        println!("{}", "No country starts with that.".yellow());
    } else {
        println!("{}", matches.join(", "));
    }
}

/// Runs questions until the player quits. Only an empty dataset ends it with an error.
pub fn cli_loop(session: &mut QuizSession) -> Result<(), QuizError> {
    let mut rng = rng();
    println!("{}", "==========> Geometas Country Quiz <==========".cyan());

    loop {
        let question = session.next_question(&mut rng)?.clone();
        let leading = format!("{}. ", session.attempts() + 1);
        println!(
            "\n{}{}",
            leading.cyan(),
            question.meta.image_reference.black().bold().on_white()
        );

        let reveal = loop {
            let choice = match prompt("Guess the country (?prefix to search, q to quit):") {
                Some(input) => Choice::from_str(session.countries(), &input),
                None => Choice::Quit,
            };
            debug!("choice: {:?}", choice);
            match choice {
                Choice::Quit => {
                    println!("{}", "Quitting Early!".cyan());
                    return Ok(());
                }
                Choice::List(prefix) => print_matches(&session.guess_options(), &prefix),
                Choice::Unknown(name) => {
                    println!("{}", format!("{:?} is not in the country list.", name).yellow())
                }
                Choice::Guess(country) => {
                    if let Some(reveal) = session.submit_guess(&country) {
                        break reveal;
                    }
                }
            }
        };

        if reveal.correct {
            println!("{}", "Correct! 🎉".bright_green());
        } else {
            println!(
                "{}",
                format!("Wrong – it was {}.", reveal.country.bold()).bright_red()
            );
        }
        println!("{} {}", "Meta:".bold(), reveal.caption);
        println!(
            "{}",
            format!("Score: {}/{}", session.score(), session.attempts()).cyan()
        );

        match prompt("Enter for the next question, q to quit:") {
            Some(input) if input.trim() != "q" => {}
            _ => return Ok(()),
        }
        session.advance();
    }
}

/// Draws the scrape progress as a single updating line.
#[derive(Default)]
pub struct CliProgress {
    width: usize,
}

impl Progress for CliProgress {
    fn begin(&mut self, total: usize) {
        self.width = 30;
        println!(
            "{}",
            format!("🔄 Scraping Geometas ({} countries)… please wait 1-2 minutes.", total).blue()
        );
    }

    fn item_done(&mut self, done: usize, total: usize) {
        let frac = fraction(done, total);
        let filled = (frac * self.width as f32).round() as usize;
        print!(
            "\r[{}{}] {:>3}%",
            "#".repeat(filled),
            " ".repeat(self.width.saturating_sub(filled)),
            (frac * 100.0).round() as u32
        );
        io::stdout().flush().ok();
    }

    fn warn(&mut self, msg: &str) {
        println!("\n{}", format!("⚠️ {}", msg).yellow());
    }

    fn finish(&mut self) {
        println!("\n{}", "✅ Scrape complete – data saved.".green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> Vec<String> {
        ["Chile", "Côte d'Ivoire", "Peru"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn quit_and_list_commands() {
        assert_eq!(Choice::from_str(&countries(), "q"), Choice::Quit);
        assert_eq!(
            Choice::from_str(&countries(), "? ch"),
            Choice::List("ch".to_string())
        );
    }

    #[test]
    fn guesses_resolve_to_listed_spelling() {
        assert_eq!(
            Choice::from_str(&countries(), "  chile "),
            Choice::Guess("Chile".to_string())
        );
        assert_eq!(
            Choice::from_str(&countries(), "CÔTE D'IVOIRE"),
            Choice::Guess("Côte d'Ivoire".to_string())
        );
    }

    #[test]
    fn input_ends_at_eof() {
        let mut input = io::Cursor::new("Chile\r\n\n");
        assert_eq!(read_input(&mut input).as_deref(), Some("Chile"));
        assert_eq!(read_input(&mut input).as_deref(), Some(""));
        assert_eq!(read_input(&mut input), None);
        assert_eq!(read_input(&mut io::Cursor::new("")), None);
    }

    #[test]
    fn listing_skips_placeholder() {
        let options = [PLACEHOLDER, "Chile", "China", "Peru"];
        assert_eq!(matching_options(&options, "ch"), vec!["Chile", "China"]);
        assert_eq!(matching_options(&options, ""), vec!["Chile", "China", "Peru"]);
    }

    #[test]
    fn unknown_names_are_not_guesses() {
        assert_eq!(
            Choice::from_str(&countries(), "Atlantis"),
            Choice::Unknown("Atlantis".to_string())
        );
    }
}
