//! Two-stage reasoning chain.
//!
//! The chain is a linear state machine:
//!
//! ```text
//! Start -> Analyzing -> Synthesizing -> Done
//!              \             \
//!               +-------------+--> Failed
//! ```
//!
//! Analysis runs a correction/analysis prompt over the intermediate text.
//! Synthesis combines the raw text, the analysis, and the intent's
//! instruction into the final answer. Synthesis never starts unless
//! analysis succeeded, and a failure at either stage yields no output.

use serde_json::Value;
use std::sync::Arc;

use intentlens_core::{
    traits::{Generation, InferenceClient},
    types::{Intent, Modality, ReasoningStage},
    Error,
};
use intentlens_governance::track_inference;

/// What the chain reasons over.
#[derive(Debug, Clone, Copy)]
pub struct ReasoningInput<'a> {
    pub modality: Modality,
    pub intermediate_text: &'a str,
    pub intent: &'a Intent,
}

/// Successful chain result.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    /// Analysis-stage text.
    pub analysis: String,
    /// Synthesis-stage generation, including any usage metadata.
    pub answer: Generation,
}

/// Typed failure of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: ReasoningStage,
    pub cause: String,
    pub details: Option<Value>,
}

impl StageFailure {
    fn new(stage: ReasoningStage, source: Error) -> Self {
        Self {
            stage,
            details: source.details().cloned(),
            cause: source.to_string(),
        }
    }
}

impl From<StageFailure> for Error {
    fn from(f: StageFailure) -> Self {
        Error::ReasoningFailed {
            stage: f.stage,
            cause: f.cause,
            details: f.details,
        }
    }
}

enum ChainState {
    Start,
    Analyzing,
    Synthesizing { analysis: String },
    Done(ChainOutput),
    Failed(StageFailure),
}

/// Runs the analysis and synthesis calls against the inference service.
#[derive(Clone)]
pub struct ReasoningChain {
    llm: Arc<dyn InferenceClient>,
}

impl ReasoningChain {
    pub fn new(llm: Arc<dyn InferenceClient>) -> Self {
        Self { llm }
    }

    /// Drive the chain to `Done` or `Failed`.
    pub async fn run(&self, input: ReasoningInput<'_>) -> Result<ChainOutput, StageFailure> {
        let mut state = ChainState::Start;
        loop {
            state = match state {
                ChainState::Start => ChainState::Analyzing,
                ChainState::Analyzing => {
                    let prompt = analysis_prompt(&input);
                    match self.call(ReasoningStage::Analysis, &prompt).await {
                        Ok(generation) => ChainState::Synthesizing {
                            analysis: generation.text,
                        },
                        Err(failure) => ChainState::Failed(failure),
                    }
                }
                ChainState::Synthesizing { analysis } => {
                    let prompt = synthesis_prompt(&input, &analysis);
                    match self.call(ReasoningStage::Synthesis, &prompt).await {
                        Ok(answer) => ChainState::Done(ChainOutput { analysis, answer }),
                        Err(failure) => ChainState::Failed(failure),
                    }
                }
                ChainState::Done(output) => return Ok(output),
                ChainState::Failed(failure) => {
                    tracing::warn!(
                        stage = %failure.stage,
                        cause = %failure.cause,
                        "Reasoning chain failed"
                    );
                    return Err(failure);
                }
            };
        }
    }

    async fn call(&self, stage: ReasoningStage, prompt: &str) -> Result<Generation, StageFailure> {
        tracing::debug!(stage = %stage, prompt_len = prompt.len(), "Reasoning stage started");
        let outcome = self.llm.generate(prompt).await;
        track_inference(stage.as_str(), outcome.is_ok());
        outcome.map_err(|e| StageFailure::new(stage, e))
    }
}

/// Prompt for the analysis stage.
pub fn analysis_prompt(input: &ReasoningInput<'_>) -> String {
    format!(
        "As an AI assistant, analyze the following raw output from a {modality}-to-text model:\n\
         \"{text}\"\n\
         \n\
         Tasks:\n\
         1. Correct potential errors.\n\
         2. Provide a detailed explanation.\n\
         3. Identify key entities.\n\
         \n\
         Output Format:\n\
         Validation: [Corrected text]\n\
         Detailed Analysis: [Analysis]\n\
         Key Elements: [List]\n",
        modality = input.modality,
        text = input.intermediate_text,
    )
}

/// Prompt for the synthesis stage.
pub fn synthesis_prompt(input: &ReasoningInput<'_>, analysis: &str) -> String {
    format!(
        "Role: Intelligent Assistant.\n\
         Context: Analyzed {modality} input.\n\
         \n\
         Raw Input: \"{text}\"\n\
         Analysis: {analysis}\n\
         \n\
         User Intent: {intent}\n\
         Instruction: {instruction}\n\
         \n\
         Task: Generate the final response for the user based strictly on the User Intent.\n",
        modality = input.modality,
        text = input.intermediate_text,
        analysis = analysis,
        intent = input.intent,
        instruction = input.intent.instruction(),
    )
}
