//! Rejection reasons for session commands.
//!
//! None of these are fatal: a rejected command leaves the session unchanged.

use thiserror::Error;

/// Why a send was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("nothing to send: the message is empty and no image is attached")]
    Empty,
    #[error("a request is already in flight")]
    InFlight,
}

/// Why an answer selection was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnswerRejected {
    #[error("no practice question is active")]
    NoActiveQuestion,
    #[error("the answer for this question is already locked in")]
    AlreadyRevealed,
    #[error("option {index} does not exist (question has {len} options)")]
    OutOfRange { index: usize, len: usize },
}
