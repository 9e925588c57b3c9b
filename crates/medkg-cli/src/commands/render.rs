//! Console rendering of progress and answers.

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use medkg_rag::{PipelineEvent, PipelineHandle, PipelineResult, QaOutcome, RetrievalOptions};

/// Show a progress bar while the worker runs, then return its result.
pub fn follow(
    handle: PipelineHandle,
    options: &RetrievalOptions,
) -> Result<PipelineResult<QaOutcome>> {
    // Extraction, each traversal phase, the answer.
    let phases = if options.enable_multi_hop { 4 } else { 3 };
    let pb = ProgressBar::new(phases + 2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    for event in handle.events().iter() {
        match event {
            PipelineEvent::Started { .. } => pb.set_message("extracting entities"),
            PipelineEvent::Extracted { entities, relations } => {
                pb.inc(1);
                pb.set_message(format!("{} entities, {} relations", entities, relations));
            }
            PipelineEvent::PhaseCompleted {
                phase,
                entity_properties,
                triples,
            } => {
                pb.inc(1);
                pb.set_message(format!(
                    "{}: {} entities, {} triples",
                    phase.as_str(),
                    entity_properties,
                    triples
                ));
            }
            PipelineEvent::Answer { .. } => pb.inc(1),
            PipelineEvent::Failed { reason } => pb.set_message(reason),
            PipelineEvent::Finished => break,
        }
    }
    pb.finish_and_clear();

    Ok(handle.wait())
}

pub fn print_answer(outcome: &QaOutcome, show_context: bool) {
    if show_context {
        print_context(outcome);
    }
    println!("{} {}", "→".blue(), outcome.question.cyan().bold());
    println!();
    println!("{}", outcome.answer);
    println!();
}

fn print_context(outcome: &QaOutcome) {
    let retrieval = &outcome.retrieval;

    println!(
        "{} Extracted {} entities, {} relations",
        "•".yellow(),
        outcome.extraction.entities.len(),
        outcome.extraction.relations.len()
    );
    for entity in &outcome.extraction.entities {
        println!(
            "    {} {}",
            entity.name.white().bold(),
            format!("({})", entity.entity_type).dimmed()
        );
    }

    println!(
        "{} {} entity records",
        "•".yellow(),
        retrieval.entity_properties.len().to_string().cyan()
    );
    for entity in &retrieval.entity_properties {
        println!(
            "    {} {}",
            entity.name.white().bold(),
            format!("({})", entity.entity_type).dimmed()
        );
    }

    println!(
        "{} {} triples ({} from the second hop)",
        "•".yellow(),
        retrieval.related_triples.len().to_string().cyan(),
        retrieval.second_hop_count()
    );
    for (i, triple) in retrieval.related_triples.iter().enumerate() {
        let rank = format!("{}.", i + 1);
        let hop = if triple.is_second_hop() { " 2-hop" } else { "" };
        println!(
            "    {} {} -{}-> {} {}",
            rank.blue(),
            triple.source_name(),
            triple.relation.green(),
            triple.target_name(),
            format!("({:.3}{})", triple.similarity, hop).dimmed()
        );
    }
    println!();
}
