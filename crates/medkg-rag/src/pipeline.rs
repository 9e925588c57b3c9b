//! The question answering entry point.
//!
//! [`QaPipeline::answer`] runs extraction, retrieval and synthesis on the
//! calling thread. [`QaPipeline::spawn`] runs the same sequence on a dedicated
//! worker thread and streams [`PipelineEvent`]s back over a channel so the
//! caller can keep accepting questions.

use medkg_core::{Extraction, RetrievalResult};
use medkg_embeddings::Embedder;
use medkg_graph::GraphStore;
use medkg_llm::LlmBackend;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

use crate::engine::{GraphQueryEngine, RetrievalOptions};
use crate::error::{PipelineError, PipelineResult};
use crate::events::{PipelineEvent, ProgressSink};
use crate::extract::EntityExtractor;
use crate::synthesize::AnswerSynthesizer;

/// Everything produced for one question.
#[derive(Debug, Clone)]
pub struct QaOutcome {
    pub question: String,
    pub extraction: Extraction,
    pub retrieval: RetrievalResult,
    pub answer: String,
}

/// Extraction, retrieval and synthesis wired together.
///
/// Holds no per-question state; share it behind an [`Arc`] to serve
/// concurrent questions.
pub struct QaPipeline {
    extractor: EntityExtractor,
    engine: GraphQueryEngine,
    synthesizer: AnswerSynthesizer,
    options: RetrievalOptions,
}

impl QaPipeline {
    /// One completion backend serves both extraction and answering.
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        store: Arc<dyn GraphStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            extractor: EntityExtractor::new(llm.clone()),
            engine: GraphQueryEngine::new(store, embedder),
            synthesizer: AnswerSynthesizer::new(llm),
            options: RetrievalOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the extraction and answer temperatures.
    pub fn with_temperatures(mut self, extraction: f32, answer: f32) -> Self {
        self.extractor = self.extractor.with_temperature(extraction);
        self.synthesizer = self.synthesizer.with_temperature(answer);
        self
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.options
    }

    pub fn engine(&self) -> &GraphQueryEngine {
        &self.engine
    }

    /// Answer a question. Fails only for an empty question.
    pub fn answer(&self, question: &str) -> PipelineResult<String> {
        self.run(question, &()).map(|outcome| outcome.answer)
    }

    /// Answer a question, reporting progress and returning the intermediate results.
    pub fn run(&self, question: &str, progress: &dyn ProgressSink) -> PipelineResult<QaOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        progress.emit(PipelineEvent::Started {
            question: question.to_string(),
        });

        let extraction = self.extractor.extract(question);
        progress.emit(PipelineEvent::Extracted {
            entities: extraction.entities.len(),
            relations: extraction.relations.len(),
        });

        let retrieval = self.engine.retrieve_with_progress(
            &extraction.entities,
            &extraction.relations,
            &self.options,
            progress,
        );

        let answer = self.synthesizer.synthesize(question, &retrieval);
        progress.emit(PipelineEvent::Answer {
            text: answer.clone(),
        });

        info!(
            entities = extraction.entities.len(),
            relations = extraction.relations.len(),
            triples = retrieval.related_triples.len(),
            "Question answered"
        );

        Ok(QaOutcome {
            question: question.to_string(),
            extraction,
            retrieval,
            answer,
        })
    }

    /// Run the pipeline on a worker thread.
    ///
    /// The returned handle's channel yields progress events and ends with
    /// exactly one [`PipelineEvent::Finished`], also when the worker panics.
    pub fn spawn(self: &Arc<Self>, question: impl Into<String>) -> PipelineHandle {
        let (tx, rx) = mpsc::channel();
        let pipeline = Arc::clone(self);
        let question = question.into();

        let handle = thread::spawn(move || {
            let guard = FinishGuard(tx);
            let result = pipeline.run(&question, &guard.0);
            if let Err(e) = &result {
                warn!("Pipeline failed: {}", e);
                guard.0.emit(PipelineEvent::Failed {
                    reason: e.to_string(),
                });
            }
            result
        });

        PipelineHandle { events: rx, handle }
    }
}

/// Sends the terminal event when the worker ends, however it ends.
struct FinishGuard(Sender<PipelineEvent>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.emit(PipelineEvent::Finished);
    }
}

/// A question running on a worker thread.
pub struct PipelineHandle {
    events: Receiver<PipelineEvent>,
    handle: JoinHandle<PipelineResult<QaOutcome>>,
}

impl PipelineHandle {
    pub fn events(&self) -> &Receiver<PipelineEvent> {
        &self.events
    }

    /// Block until the worker finishes.
    pub fn wait(self) -> PipelineResult<QaOutcome> {
        self.handle
            .join()
            .unwrap_or(Err(PipelineError::WorkerPanicked))
    }

    /// Collect every event up to and including `Finished`, then wait.
    pub fn drain(self) -> (Vec<PipelineEvent>, PipelineResult<QaOutcome>) {
        let mut events = Vec::new();
        for event in self.events.iter() {
            let done = event.is_terminal();
            events.push(event);
            if done {
                break;
            }
        }
        let result = self
            .handle
            .join()
            .unwrap_or(Err(PipelineError::WorkerPanicked));
        (events, result)
    }
}
