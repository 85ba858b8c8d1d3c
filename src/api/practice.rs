//! On-demand practice questions (`POST /api/practice`)

use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;

use super::chat::{answer_from_stdin, WireQuestion};
use super::client::TutorClient;
use crate::models::PracticeQuestion;
use crate::session::Session;

const PRACTICE_PATH: &str = "/api/practice";

/// Question difficulty accepted by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Next level up, wrapping back to beginner.
    pub fn next(self) -> Self {
        match self {
            Difficulty::Beginner => Difficulty::Intermediate,
            Difficulty::Intermediate => Difficulty::Advanced,
            Difficulty::Advanced => Difficulty::Beginner,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        })
    }
}

/// What to ask for. Without a service the backend picks one at random.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PracticeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Parse a practice response body into a validated question.
pub fn parse_question(body: &str) -> Result<PracticeQuestion> {
    let wire: WireQuestion =
        serde_json::from_str(body).context("Failed to parse practice response")?;
    wire.into_question()
        .context("Invalid practice question in practice response")
}

/// Fetch one practice question.
pub async fn practice_data(client: &TutorClient, request: &PracticeRequest) -> Result<PracticeQuestion> {
    let resp = client.post(PRACTICE_PATH, request).await?;
    let body = resp
        .text()
        .await
        .context("Failed to read practice response body")?;
    parse_question(&body)
}

/// Fetch a question, print it and take an answer on stdin.
pub async fn practice(client: &TutorClient, request: &PracticeRequest) -> Result<()> {
    let question = practice_data(client, request).await?;

    println!("[{}] {}", request.difficulty, question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }

    let mut session = Session::new();
    session.present_question(question.into());
    answer_from_stdin(&mut session).await
}
