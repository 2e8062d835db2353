//! Line-based terminal prompts.
//!
//! [`TerminalPrompt`] answers the engine's [`DecisionProvider`] questions by
//! asking on any writer and reading replies from any buffered reader, so the
//! binary hands it stdin/stderr and tests hand it in-memory buffers.

use crate::config::{ExportKind, IndexerConfig};
use crate::engine::{DecisionProvider, ExportQuestion, ManualChoice};
use crate::error::{IndexerError, Result};
use std::io::{BufRead, Write};

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| IndexerError::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(IndexerError::Prompt("input closed".to_string()));
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{}", text)
            .and_then(|_| self.output.flush())
            .map_err(|e| IndexerError::Prompt(e.to_string()))
    }

    /// Free-form answer; an empty reply takes `default`
    pub fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        if default.is_empty() {
            self.say(&format!("? {} ", question))?;
        } else {
            self.say(&format!("? {} ({}) ", question, default))?;
        }
        let answer = self.read_line()?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            self.say(&format!("? {} [{}] ", question, hint))?;
            match self.read_line()?.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("  please answer y or n\n")?,
            }
        }
    }

    /// Pick one of `choices` by its 1-based number
    pub fn select<T: Copy>(&mut self, question: &str, choices: &[(String, T)]) -> Result<T> {
        self.say(&format!("? {}\n", question))?;
        for (i, (label, _)) in choices.iter().enumerate() {
            self.say(&format!("  {}) {}\n", i + 1, label))?;
        }
        loop {
            self.say("  > ")?;
            let answer = self.read_line()?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => return Ok(choices[n - 1].1),
                _ => self.say(&format!("  enter a number from 1 to {}\n", choices.len()))?,
            }
        }
    }

    /// Pick any of `options`; numbers separated by commas or spaces, empty for all
    pub fn multiselect(&mut self, question: &str, options: &[String]) -> Result<Vec<String>> {
        self.say(&format!("? {}\n", question))?;
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}) {}\n", i + 1, option))?;
        }
        'ask: loop {
            self.say("  > ")?;
            let answer = self.read_line()?;
            if answer.is_empty() {
                return Ok(options.to_vec());
            }
            let mut picked = Vec::new();
            for part in answer.split([',', ' ']).filter(|p| !p.is_empty()) {
                match part.parse::<usize>() {
                    Ok(n) if (1..=options.len()).contains(&n) => {
                        if !picked.contains(&options[n - 1]) {
                            picked.push(options[n - 1].clone());
                        }
                    }
                    _ => {
                        self.say(&format!("  '{}' is not one of the listed numbers\n", part))?;
                        continue 'ask;
                    }
                }
            }
            return Ok(picked);
        }
    }
}

impl<R: BufRead, W: Write> DecisionProvider for TerminalPrompt<R, W> {
    fn complete_config(&mut self) -> Result<Option<IndexerConfig>> {
        self.say("No configuration found, describe the index to generate.\n")?;
        let source = self.ask("Source glob pattern:", "src/**/*.ts")?;
        let output = self.ask("Output file:", "src/index.ts")?;
        let choices: Vec<(String, ExportKind)> = [
            ExportKind::Wildcard,
            ExportKind::Default,
            ExportKind::Group,
            ExportKind::Slug,
        ]
        .into_iter()
        .map(|kind| (kind.to_string(), kind))
        .collect();
        let kind = self.select("Export type:", &choices)?;

        Ok(Some(IndexerConfig::new(source.as_str(), output).with_kind(kind)))
    }

    fn select_indexes(&mut self, path: &str, options: &[String]) -> Result<Vec<String>> {
        self.multiselect(&format!("Select the indexes that will include {}:", path), options)
    }

    fn choose_export(&mut self, question: &ExportQuestion<'_>) -> Result<ManualChoice> {
        let mut choices = vec![
            (
                format!("Default export \"export {{default as {}}}\"", question.name),
                ManualChoice::Export(ExportKind::Default),
            ),
            (
                format!("Grouped export \"export * as {}\"", question.name),
                ManualChoice::Export(ExportKind::Group),
            ),
            (
                format!("Grouped slug export \"export * as {}\"", question.slug),
                ManualChoice::Export(ExportKind::Slug),
            ),
            (
                "All exports individually \"export *\"".to_string(),
                ManualChoice::Export(ExportKind::Individual),
            ),
            (
                "Don't include in index".to_string(),
                ManualChoice::Export(ExportKind::Skip),
            ),
        ];
        if question.allow_skip_index {
            choices.push(("Skip index".to_string(), ManualChoice::SkipIndex));
        }

        self.select(
            &format!(
                "What should be exported from \"{}\" in index \"{}\"",
                question.path, question.index
            ),
            &choices,
        )
    }

    fn apply_to_directory(&mut self, dir: &str) -> Result<bool> {
        self.confirm(&format!("Apply these settings to all files in {}?", dir), false)
    }
}
