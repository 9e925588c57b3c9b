//! Answer a single question.

use anyhow::Result;
use colored::Colorize;
use medkg_rag::PipelineError;

use super::render::{follow, print_answer};
use crate::config::Config;

pub fn run(config: &Config, question: &str, show_context: bool) -> Result<()> {
    let pipeline = super::connect(config)?;

    match follow(pipeline.spawn(question), pipeline.options())? {
        Ok(outcome) => print_answer(&outcome, show_context),
        Err(PipelineError::EmptyQuestion) => {
            println!("{} Please enter a question.", "•".yellow());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
