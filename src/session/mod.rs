//! Session state engine.
//!
//! `Session` owns everything that changes during a conversation: the message
//! timeline, the pending (draft) request and the practice quiz. UI code drives
//! it through command methods and renders from its read accessors.
//!
//! Sending is single-flight. `begin_send` stages the user message and marks a
//! request in flight, the caller performs the network call however it likes,
//! and `complete_send` records the outcome. While a request is in flight the
//! draft and the staged attachment can still be edited, but no second send
//! can start.

pub mod attachment;
mod error;
pub mod quiz;
pub mod timeline;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use crate::models::{AssistantReply, PracticeQuestion};

pub use attachment::{capture, EncodedImage, RawFile};
pub use error::{AnswerRejected, SendRejected};
pub use quiz::{AnswerOutcome, QuizPhase, QuizState, Score};
pub use timeline::{Message, MessageId, Origin, Timeline};

/// Text shown in place of an answer when the assistant could not be reached.
pub const FALLBACK_TEXT: &str =
    "Sorry, I can't reach the assistant right now. Please check the backend and try again.";

/// What goes over the wire for one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub message: String,
    /// Encoded image (`data:` URI)
    pub image: Option<String>,
    /// Conversation id from the previous reply, if any.
    pub session_id: Option<String>,
}

/// Anything that can answer an outgoing request.
///
/// Errors of any kind (transport, status, parse) are reported as `Err` and
/// become the fallback message.
pub trait Assistant {
    fn ask(
        &self,
        request: &OutgoingRequest,
    ) -> impl Future<Output = Result<AssistantReply>> + Send;
}

/// Draft state of the next send.
#[derive(Debug, Default)]
struct PendingRequest {
    draft: String,
    attachment: Option<EncodedImage>,
    in_flight: bool,
}

/// Explicit container for all per-session state.
#[derive(Debug, Default)]
pub struct Session {
    timeline: Timeline,
    pending: PendingRequest,
    quiz: QuizState,
    /// Backend conversation id, echoed back so follow-ups keep context.
    conversation_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn quiz(&self) -> &QuizState {
        &self.quiz
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    // -- Pending request --

    pub fn draft(&self) -> &str {
        &self.pending.draft
    }

    /// Draft text for editing. Always allowed, even while a request is in flight.
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.pending.draft
    }

    pub fn staged_attachment(&self) -> Option<&EncodedImage> {
        self.pending.attachment.as_ref()
    }

    /// Run a picked file through the codec and stage it.
    ///
    /// A non-image file is dropped silently and the previous attachment stays.
    /// Returns whether the file was accepted.
    pub fn stage_attachment(&mut self, file: RawFile) -> bool {
        match capture(file) {
            Some(image) => {
                tracing::debug!("Staged attachment {} ({} bytes)", image.name(), image.size());
                self.pending.attachment = Some(image);
                true
            }
            None => false,
        }
    }

    /// Remove the staged attachment, returning it.
    pub fn clear_attachment(&mut self) -> Option<EncodedImage> {
        self.pending.attachment.take()
    }

    pub fn is_in_flight(&self) -> bool {
        self.pending.in_flight
    }

    /// Whether the send control should be enabled.
    pub fn can_send(&self) -> bool {
        self.check_send().is_ok()
    }

    fn check_send(&self) -> Result<(), SendRejected> {
        if self.pending.in_flight {
            return Err(SendRejected::InFlight);
        }
        if self.pending.draft.trim().is_empty() && self.pending.attachment.is_none() {
            return Err(SendRejected::Empty);
        }
        Ok(())
    }

    // -- Request lifecycle --

    /// Start a send: append the user message, clear the draft and the staged
    /// attachment, and mark the request in flight.
    ///
    /// On rejection nothing changes.
    pub fn begin_send(&mut self) -> Result<OutgoingRequest, SendRejected> {
        self.check_send()?;

        let text = self.pending.draft.trim().to_string();
        let attachment = self.pending.attachment.take();
        self.pending.draft.clear();

        let request = OutgoingRequest {
            message: text.clone(),
            image: attachment.as_ref().map(|a| a.data_uri().to_string()),
            session_id: self.conversation_id.clone(),
        };

        let id = self.timeline.push_user(text, attachment);
        self.pending.in_flight = true;
        tracing::debug!("Send {} started (image: {})", id, request.image.is_some());

        Ok(request)
    }

    /// Record the outcome of the in-flight request and release the send lock.
    ///
    /// A successful reply is appended (activating its practice question, if
    /// any); a failure appends the fixed fallback message. Returns the id of
    /// the appended message, or `None` if no request was in flight.
    pub fn complete_send(&mut self, outcome: Result<AssistantReply>) -> Option<MessageId> {
        if !self.pending.in_flight {
            tracing::warn!("Ignoring assistant reply with no request in flight");
            return None;
        }

        let id = match outcome {
            Ok(reply) => {
                if let Some(session_id) = reply.session_id {
                    self.conversation_id = Some(session_id);
                }
                let question = reply
                    .payload
                    .as_ref()
                    .and_then(|p| p.practice_question.clone());
                let id = self.timeline.push_assistant(reply.text, reply.payload);
                if let Some(question) = question {
                    self.quiz.present(question);
                }
                id
            }
            Err(e) => {
                tracing::warn!("Assistant request failed: {:#}", e);
                self.timeline.push_assistant(FALLBACK_TEXT.to_string(), None)
            }
        };

        self.pending.in_flight = false;
        Some(id)
    }

    /// Begin, ask and complete in one go.
    ///
    /// Returns the id of the assistant (or fallback) message.
    pub async fn send<A: Assistant>(&mut self, assistant: &A) -> Result<MessageId, SendRejected> {
        let request = self.begin_send()?;
        let outcome = assistant.ask(&request).await;
        self.complete_send(outcome).ok_or(SendRejected::InFlight)
    }

    // -- Quiz --

    pub fn select_answer(&mut self, index: usize) -> Result<AnswerOutcome, AnswerRejected> {
        self.quiz.select_answer(index)
    }

    /// Show a question that did not arrive with a chat reply (e.g. one
    /// fetched on demand). Same rules as a reply-carried question.
    pub fn present_question(&mut self, question: Arc<PracticeQuestion>) {
        self.quiz.present(question);
    }

    pub fn dismiss_quiz(&mut self) -> bool {
        self.quiz.dismiss()
    }
}
