use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{RepoError, Result};
use crate::models::{RepositoryIdentity, ResultRecord};
use crate::pipeline::{ProgressSink, RunReport, Stage};

/// Prints stage lines and keeps a spinner on the stage in progress
pub struct ConsoleProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn create_spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Clears the spinner, e.g. before printing an error
    pub fn clear(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn stage(&self, stage: Stage) {
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        if let Some(pb) = slot.take() {
            pb.finish_and_clear();
        }

        let line = stage.to_string();
        if stage == Stage::Done {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line.cyan());
            *slot = Some(Self::create_spinner(stage.label()));
        }
    }
}

/// Asks for an `owner/repo` until the answer parses
pub fn prompt_repository() -> Result<RepositoryIdentity> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter GitHub repository (owner/repo):")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            input.parse::<RepositoryIdentity>().map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    answer.parse()
}

pub fn print_report(report: &RunReport) {
    println!();
    println!("{} {}", "Repository:".bold(), report.identity.to_string().green());
    println!(
        "{} {}",
        "Language:".bold(),
        report.language.as_deref().unwrap_or("Unknown")
    );
    println!("{} {} characters", "Content:".bold(), report.content_chars);
    println!();
    println!("{}", "Summary".bold().underline());
    println!("{}", report.summary);
    print_similar(&report.similar_repos);
    println!();
    println!("{}", format!("Saved as record {}", report.record_id).dimmed());
}

pub fn print_record(record: &ResultRecord) {
    println!("{} {}", "Repository:".bold(), record.repo.green());
    println!(
        "{} {}",
        "Language:".bold(),
        record.language.as_deref().unwrap_or("Unknown")
    );
    println!("{} {}", "Recorded:".bold(), record.timestamp.to_rfc3339());
    println!();
    println!("{}", "Summary".bold().underline());
    println!("{}", record.summary);
    print_similar(&record.similar_repos);
}

/// One line per search hit
pub fn print_search_hit(id: u64, record: &ResultRecord) {
    println!(
        "{:>4}  {}  {}",
        id.to_string().dimmed(),
        record.repo.green(),
        record.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
}

fn print_similar(similar: &[String]) {
    println!();
    println!("{}", "Similar repositories".bold().underline());
    if similar.is_empty() {
        println!("{}", "(none found)".dimmed());
    }
    for (i, repo) in similar.iter().enumerate() {
        println!("{}. {}", i + 1, repo);
    }
}

pub fn print_info(message: &str) {
    println!("{}", message.green());
}

pub fn print_warning(message: &str) {
    println!("{}", message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message.red());
}
