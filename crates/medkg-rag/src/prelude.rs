//! Prelude: import the pipeline and its collaborators.

pub use crate::{
    AnswerSynthesizer, EntityExtractor, GraphQueryEngine, PipelineError, PipelineEvent,
    ProgressSink, QaOutcome, QaPipeline, RetrievalOptions,
};
pub use medkg_core::prelude::*;
