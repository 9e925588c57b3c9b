//! Interactive question loop.

use anyhow::{Context, Result};
use colored::Colorize;
use medkg_rag::PipelineError;
use std::io::{BufRead, Write};

use super::render::{follow, print_answer};
use crate::config::Config;

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "退出"];

pub fn is_exit(line: &str) -> bool {
    let line = line.trim();
    EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w))
}

pub fn run(config: &Config, show_context: bool) -> Result<()> {
    let pipeline = super::connect(config)?;

    println!(
        "{} Ask a medical question ({} to leave)",
        "→".blue(),
        EXIT_WORDS.join(" / ").cyan()
    );

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "问题>".green().bold());
        std::io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read question")?;
        if is_exit(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match follow(pipeline.spawn(line), pipeline.options())? {
            Ok(outcome) => print_answer(&outcome, show_context),
            Err(PipelineError::EmptyQuestion) => continue,
            Err(e) => println!("{} {}", "✗".red(), e),
        }
    }

    println!("{} Bye", "✓".green());
    Ok(())
}
