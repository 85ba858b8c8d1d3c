//! Structured content carried by assistant replies

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

/// AWS service summary attached to an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub description: String,
    /// Console walkthrough (e.g. "S3 Dashboard -> Create Bucket -> ...")
    pub console: Option<String>,
    /// Example CLI invocation
    pub cli: Option<String>,
    /// Example SDK call
    pub sdk: Option<String>,
    pub subtopics: Vec<String>,
    /// Service-specific checklist, in the order to try it.
    pub troubleshoot: Vec<String>,
}

/// Code samples, either as a plain ordered list or keyed by language label.
///
/// The shape is resolved once when the reply is parsed so rendering never
/// has to inspect JSON again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeExamples {
    Sequence(Vec<String>),
    /// Label -> code, ordered by label.
    Labeled(BTreeMap<String, String>),
}

impl CodeExamples {
    pub fn len(&self) -> usize {
        match self {
            CodeExamples::Sequence(blocks) => blocks.len(),
            CodeExamples::Labeled(blocks) => blocks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Code blocks in display order, with their label when one exists.
    pub fn blocks(&self) -> Vec<(Option<&str>, &str)> {
        match self {
            CodeExamples::Sequence(blocks) => {
                blocks.iter().map(|code| (None, code.as_str())).collect()
            }
            CodeExamples::Labeled(blocks) => blocks
                .iter()
                .map(|(label, code)| (Some(label.as_str()), code.as_str()))
                .collect(),
        }
    }
}

/// Reasons a received practice question cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    #[error("practice question needs at least 2 options, got {0}")]
    TooFewOptions(usize),
    #[error("correct answer index {correct} is outside 0..{len}")]
    CorrectOutOfRange { correct: i64, len: usize },
}

/// A single multiple-choice item. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeQuestion {
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: String,
}

impl PracticeQuestion {
    /// Build a question, checking the option count and the correct index.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: i64,
        explanation: impl Into<String>,
    ) -> Result<Self, InvalidQuestion> {
        if options.len() < 2 {
            return Err(InvalidQuestion::TooFewOptions(options.len()));
        }
        let correct_index = usize::try_from(correct)
            .ok()
            .filter(|&i| i < options.len())
            .ok_or(InvalidQuestion::CorrectOutOfRange {
                correct,
                len: options.len(),
            })?;

        Ok(Self {
            prompt: prompt.into(),
            options,
            correct_index,
            explanation: explanation.into(),
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

/// Optional structured sections of an assistant message. Each one is
/// independently present or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantPayload {
    pub service_info: Option<ServiceInfo>,
    pub code_examples: Option<CodeExamples>,
    pub troubleshooting: Option<Vec<String>>,
    /// Shared with the quiz while the question is active.
    pub practice_question: Option<Arc<PracticeQuestion>>,
    pub follow_up_suggestions: Vec<String>,
}

impl AssistantPayload {
    /// True when no section is present.
    pub fn is_empty(&self) -> bool {
        self.service_info.is_none()
            && self.code_examples.is_none()
            && self.troubleshooting.is_none()
            && self.practice_question.is_none()
            && self.follow_up_suggestions.is_empty()
    }
}

/// A parsed assistant answer, ready to be appended to the timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub payload: Option<AssistantPayload>,
    /// Conversation id assigned by the backend.
    pub session_id: Option<String>,
}
