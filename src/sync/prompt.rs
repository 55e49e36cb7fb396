//! Operator interaction: SQL confirmation and default-language selection.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::error::Result;
use crate::i18n::{LanguageSet, LanguageSettings};

/// Source of operator answers.
pub trait Prompter {
    /// Show `prompt` and return the answer without its line terminator.
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Reads answers from standard input, writing prompts to standard output.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no answer on stdin").into());
        }
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Replays a fixed list of answers and records every prompt shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Prompts shown so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left").into()
        })
    }
}

const CONFIRM_PROMPT: &str = "\nAre you sure that you want to execute the previous SQL: (y/n) [n]: ";

/// Echo the plan and ask whether to run it. An empty answer means no.
pub fn ask_for_confirmation(
    statements: &[&str],
    model_full_name: &str,
    assume_yes: bool,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<bool> {
    writeln!(out, "\nSQL to synchronize \"{}\" schema:", model_full_name)?;
    for statement in statements {
        writeln!(out, "   {}", statement)?;
    }

    if assume_yes {
        writeln!(out, "{}YES", CONFIRM_PROMPT)?;
        return Ok(true);
    }

    loop {
        out.flush()?;
        let answer = prompter.ask(CONFIRM_PROMPT)?;
        match answer.trim().to_lowercase().as_str() {
            "" | "n" | "no" => return Ok(false),
            "y" | "yes" => return Ok(true),
            _ => writeln!(out, "Please answer yes or no")?,
        }
    }
}

/// Decide the language that holds existing untranslated data.
///
/// An explicit code is used when configured. Unattended runs fall back to the
/// configured default, else the first configured language. Otherwise the
/// operator picks from a menu.
pub fn resolve_default_language(
    settings: &LanguageSettings,
    requested: Option<&str>,
    assume_yes: bool,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<String> {
    let languages = &settings.languages;

    let requested = match requested {
        Some(code) if !languages.contains(code) => {
            writeln!(
                out,
                "Default language code provided \"{}\" is not defined in the language settings",
                code
            )?;
            None
        }
        other => other,
    };

    if let Some(code) = requested {
        writeln!(out, "Default language code provided. Using {}", code)?;
        return Ok(code.to_string());
    }

    if assume_yes {
        let fallback = settings.fallback_language();
        let code = if languages.contains(fallback) {
            fallback
        } else {
            languages.first().code.as_str()
        };
        writeln!(out, "Default language code not provided. Using {}", code)?;
        return Ok(code.to_string());
    }

    choose_default_language(languages, prompter, out)
}

/// Numbered menu of the configured languages; re-asks until a valid choice.
pub fn choose_default_language(
    languages: &LanguageSet,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<String> {
    writeln!(out, "Available languages:")?;
    for (i, entry) in languages.entries().iter().enumerate() {
        writeln!(out, "\t{}. {}", i + 1, entry.name)?;
    }
    writeln!(
        out,
        "Choose a default language. If the project is not translated yet, choose the language of the current untranslated data"
    )?;

    let prompt = format!("What's the default language of data? (1-{}) ", languages.len());
    loop {
        out.flush()?;
        let answer = prompter.ask(&prompt)?;
        let answer = answer.trim();
        if answer.is_empty() {
            continue;
        }

        match answer.parse::<usize>() {
            Ok(n) if (1..=languages.len()).contains(&n) => {
                let code = languages.entries()[n - 1].code.clone();
                debug!(code = %code, "Default language chosen");
                return Ok(code);
            }
            Ok(_) => writeln!(out, "That's not a valid number")?,
            Err(_) => writeln!(out, "Please write a number")?,
        }
    }
}
