//! Chat endpoint (`POST /api/chat`)
//!
//! Converts between the backend's JSON shapes and the session's domain types.
//! Anything that does not fit the expected shape is a parse error, which the
//! session turns into its fallback message.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::client::TutorClient;
use crate::models::{
    AssistantPayload, AssistantReply, CodeExamples, InvalidQuestion, PracticeQuestion, ServiceInfo,
};
use crate::session::{Assistant, Message, OutgoingRequest, RawFile, SendRejected, Session};

const CHAT_PATH: &str = "/api/chat";

// -- Wire types --

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Usually a string; anything else is pretty-printed.
    message: Value,
    #[serde(default)]
    service_info: Option<WireServiceInfo>,
    #[serde(default)]
    code_examples: Option<WireCodeExamples>,
    #[serde(default)]
    troubleshooting: Option<Vec<String>>,
    #[serde(default)]
    practice_question: Option<WireQuestion>,
    #[serde(default)]
    follow_up_suggestions: Option<Vec<String>>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireServiceInfo {
    name: String,
    description: String,
    console: Option<String>,
    cli: Option<String>,
    sdk: Option<String>,
    #[serde(default)]
    subtopics: Option<Vec<String>>,
    #[serde(default)]
    troubleshoot: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireCodeExamples {
    Sequence(Vec<String>),
    Labeled(BTreeMap<String, String>),
}

/// Question object shared by `/api/chat` and `/api/practice`. Extra keys
/// (`service`, `difficulty`, `topic`) are ignored.
#[derive(Debug, Deserialize)]
pub(super) struct WireQuestion {
    question: String,
    options: Vec<String>,
    correct: i64,
    #[serde(default)]
    explanation: String,
}

impl WireQuestion {
    pub(super) fn into_question(self) -> Result<PracticeQuestion, InvalidQuestion> {
        PracticeQuestion::new(self.question, self.options, self.correct, self.explanation)
    }
}

/// Text for the timeline: strings verbatim, null as empty, and any other
/// value pretty-printed (serde_json maps keep keys sorted).
fn message_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

impl ChatResponse {
    fn into_reply(self) -> Result<AssistantReply> {
        let practice_question = match self.practice_question {
            Some(q) => Some(Arc::new(
                q.into_question()
                    .context("Invalid practice question in chat response")?,
            )),
            None => None,
        };

        let payload = AssistantPayload {
            service_info: self.service_info.map(|s| ServiceInfo {
                name: s.name,
                description: s.description,
                console: s.console,
                cli: s.cli,
                sdk: s.sdk,
                subtopics: s.subtopics.unwrap_or_default(),
                troubleshoot: s.troubleshoot.unwrap_or_default(),
            }),
            code_examples: self.code_examples.map(|c| match c {
                WireCodeExamples::Sequence(blocks) => CodeExamples::Sequence(blocks),
                WireCodeExamples::Labeled(blocks) => CodeExamples::Labeled(blocks),
            }),
            troubleshooting: self.troubleshooting,
            practice_question,
            follow_up_suggestions: self.follow_up_suggestions.unwrap_or_default(),
        };

        Ok(AssistantReply {
            text: message_text(self.message),
            payload: (!payload.is_empty()).then_some(payload),
            session_id: self.session_id,
        })
    }
}

/// Parse a chat response body into a reply.
pub fn parse_reply(body: &str) -> Result<AssistantReply> {
    let response: ChatResponse =
        serde_json::from_str(body).context("Failed to parse chat response")?;
    response.into_reply()
}

impl Assistant for TutorClient {
    async fn ask(&self, request: &OutgoingRequest) -> Result<AssistantReply> {
        let body = ChatRequest {
            message: &request.message,
            image: request.image.as_deref(),
            session_id: request.session_id.as_deref(),
        };

        let resp = self.post(CHAT_PATH, &body).await?;
        let text = resp
            .text()
            .await
            .context("Failed to read chat response body")?;
        parse_reply(&text)
    }
}

// ---------------------------------------------------------------------------
// One-shot CLI
// ---------------------------------------------------------------------------

/// Send a single message (optionally with a screenshot) and print the answer.
///
/// If the answer carries a practice question, the user is prompted for an
/// option number on stdin.
pub async fn ask(client: &TutorClient, message: &str, image: Option<&Path>) -> Result<()> {
    let mut session = Session::new();
    session.draft_mut().push_str(message);

    if let Some(path) = image {
        let file = RawFile::from_path(path)?;
        if !session.stage_attachment(file) {
            tracing::warn!("{} is not an image; sending without it", path.display());
        }
    }

    match session.send(client).await {
        Ok(_) => {}
        Err(SendRejected::Empty) => bail!("Nothing to send: give a message or an image"),
        Err(e) => bail!("{}", e),
    }

    if let Some(reply) = session.timeline().last() {
        println!("{}", format_plain(reply));
    }

    if session.quiz().active_question().is_some() {
        answer_from_stdin(&mut session).await?;
    }

    Ok(())
}

/// Prompt on stdin for an answer to the active question and print the verdict.
pub(super) async fn answer_from_stdin(session: &mut Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("Your answer (number, empty to skip): ");
        let Some(line) = lines.next_line().await.context("Failed to read answer")? else {
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let Some(index) = line.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
            println!("Enter the option number.");
            continue;
        };

        match session.select_answer(index) {
            Ok(outcome) => {
                if outcome.is_correct {
                    println!("Correct!");
                } else {
                    println!("Not quite. The answer is {}.", outcome.correct_index + 1);
                }
                if let Some(q) = session.quiz().active_question() {
                    println!("{}", q.explanation());
                }
                println!("Score: {}", outcome.score);
                return Ok(());
            }
            Err(e) => println!("{}", e),
        }
    }
}

/// Render a message as plain text for terminal output.
pub fn format_plain(msg: &Message) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "[{}] {}:\n",
        msg.created_at().format("%H:%M"),
        msg.origin().as_str()
    ));
    if let Some(image) = msg.attachment() {
        out.push_str(&format!("[image] {}\n", image.name()));
    }
    if !msg.text().is_empty() {
        out.push_str(msg.text());
        out.push('\n');
    }

    let Some(payload) = msg.payload() else {
        return out;
    };

    if let Some(ref info) = payload.service_info {
        out.push_str(&format!("\n== {} ==\n{}\n", info.name, info.description));
        for (label, value) in [("Console", &info.console), ("CLI", &info.cli), ("SDK", &info.sdk)] {
            if let Some(value) = value {
                out.push_str(&format!("  {}: {}\n", label, value));
            }
        }
        if !info.subtopics.is_empty() {
            out.push_str(&format!("  Topics: {}\n", info.subtopics.join(", ")));
        }
        if !info.troubleshoot.is_empty() {
            out.push_str("  If it goes wrong:\n");
            for (i, step) in info.troubleshoot.iter().enumerate() {
                out.push_str(&format!("    {}. {}\n", i + 1, step));
            }
        }
    }

    if let Some(ref examples) = payload.code_examples {
        out.push_str("\n== Code ==\n");
        for (label, code) in examples.blocks() {
            if let Some(label) = label {
                out.push_str(&format!("-- {} --\n", label));
            }
            out.push_str(code);
            out.push('\n');
        }
    }

    if let Some(ref steps) = payload.troubleshooting {
        out.push_str("\n== Troubleshooting ==\n");
        for (i, step) in steps.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, step));
        }
    }

    if let Some(ref question) = payload.practice_question {
        out.push_str(&format!("\n== Practice ==\n{}\n", question.prompt()));
        for (i, option) in question.options().iter().enumerate() {
            out.push_str(&format!("  {}) {}\n", i + 1, option));
        }
    }

    if !payload.follow_up_suggestions.is_empty() {
        out.push_str("\nTry asking:\n");
        for suggestion in &payload.follow_up_suggestions {
            out.push_str(&format!("  - {}\n", suggestion));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Timeline;

    #[test]
    fn test_request_omits_absent_fields() {
        let body = ChatRequest {
            message: "hi",
            image: None,
            session_id: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"message":"hi"}"#);

        let body = ChatRequest {
            message: "",
            image: Some("data:image/png;base64,AA=="),
            session_id: Some("abc"),
        };
        let json: Value = serde_json::to_value(&body).unwrap();
        assert_eq!(json["image"], "data:image/png;base64,AA==");
        assert_eq!(json["session_id"], "abc");
    }

    #[test]
    fn test_parse_plain_message() {
        let reply = parse_reply(r#"{"message": "Namaste!", "service_info": null,
            "code_examples": null, "troubleshooting": null, "practice_question": null,
            "session_id": "1f2e3d4c", "follow_up_suggestions": []}"#)
        .unwrap();

        assert_eq!(reply.text, "Namaste!");
        assert!(reply.payload.is_none());
        assert_eq!(reply.session_id.as_deref(), Some("1f2e3d4c"));
    }

    #[test]
    fn test_parse_full_payload() {
        let reply = parse_reply(
            r#"{
                "message": "S3 basics",
                "service_info": {
                    "name": "Amazon S3",
                    "description": "Object storage service",
                    "console": "S3 Dashboard -> Create Bucket",
                    "cli": "aws s3 mb s3://bucket-name",
                    "troubleshoot": ["Check bucket policy"],
                    "subtopics": ["buckets", "versioning"]
                },
                "code_examples": ["aws s3 ls", "aws s3 cp a s3://b/"],
                "troubleshooting": ["Check IAM permissions", "Verify region"],
                "follow_up_suggestions": ["S3 versioning ke baare mein batao"]
            }"#,
        )
        .unwrap();

        let payload = reply.payload.unwrap();
        let info = payload.service_info.unwrap();
        assert_eq!(info.name, "Amazon S3");
        assert_eq!(info.cli.as_deref(), Some("aws s3 mb s3://bucket-name"));
        assert!(info.sdk.is_none());
        assert_eq!(info.subtopics, vec!["buckets", "versioning"]);
        assert_eq!(info.troubleshoot, vec!["Check bucket policy"]);
        assert_eq!(
            payload.code_examples,
            Some(CodeExamples::Sequence(vec![
                "aws s3 ls".to_string(),
                "aws s3 cp a s3://b/".to_string()
            ]))
        );
        assert_eq!(payload.troubleshooting.unwrap().len(), 2);
        assert_eq!(payload.follow_up_suggestions.len(), 1);
        assert!(payload.practice_question.is_none());
    }

    #[test]
    fn test_service_troubleshoot_steps_are_printed() {
        let body = r#"{
            "message": "EC2 instance se connect nahi ho raha?",
            "service_info": {
                "name": "Amazon EC2",
                "description": "Virtual servers in the cloud",
                "console": "EC2 Dashboard -> Launch Instance",
                "cli": "aws ec2 run-instances --image-id ami-12345",
                "sdk": "ec2.run_instances(ImageId='ami-12345')",
                "troubleshoot": ["Check IAM permissions", "Verify security groups", "Check instance limits"]
            },
            "code_examples": null,
            "troubleshooting": null,
            "practice_question": null,
            "session_id": "9a8b7c6d",
            "follow_up_suggestions": []
        }"#;

        let reply = parse_reply(body).unwrap();
        let info = reply.payload.as_ref().unwrap().service_info.as_ref().unwrap();
        assert_eq!(info.troubleshoot.len(), 3);
        assert!(info.subtopics.is_empty());

        let mut timeline = Timeline::new();
        let AssistantReply { text, payload, .. } = reply;
        let id = timeline.push_assistant(text, payload);
        let printed = format_plain(timeline.get(id).unwrap());
        assert!(printed.contains("If it goes wrong:"));
        assert!(printed.contains("    2. Verify security groups"));
        assert!(!printed.contains("== Troubleshooting =="));
    }

    #[test]
    fn test_parse_labeled_code_examples() {
        let reply = parse_reply(
            r#"{"message": "", "code_examples": {"python": "import boto3", "cli": "aws ec2 describe-instances"}}"#,
        )
        .unwrap();
        match reply.payload.unwrap().code_examples.unwrap() {
            CodeExamples::Labeled(map) => {
                let labels: Vec<&String> = map.keys().collect();
                assert_eq!(labels, vec!["cli", "python"]);
            }
            other => panic!("expected labeled examples, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_practice_question() {
        let reply = parse_reply(
            r#"{"message": "**S3 Practice Question** (beginner level)",
                "practice_question": {
                    "question": "S3 bucket create karne ke liye minimum kya chahiye?",
                    "options": ["Bucket name aur region", "Only bucket name", "Name, region aur policy", "AWS account only"],
                    "correct": 0,
                    "explanation": "Bucket name unique hona chahiye globally.",
                    "service": "s3",
                    "difficulty": "beginner"
                }}"#,
        )
        .unwrap();

        let question = reply.payload.unwrap().practice_question.unwrap();
        assert_eq!(question.options().len(), 4);
        assert_eq!(question.correct_index(), 0);
        assert!(question.explanation().starts_with("Bucket name"));
    }

    #[test]
    fn test_invalid_question_fails_whole_reply() {
        let err = parse_reply(
            r#"{"message": "quiz", "practice_question": {"question": "?", "options": ["A", "B"], "correct": 5, "explanation": ""}}"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid practice question"));

        assert!(parse_reply(
            r#"{"message": "quiz", "practice_question": {"question": "?", "options": ["A"], "correct": 0}}"#
        )
        .is_err());
    }

    #[test]
    fn test_structured_message_is_pretty_printed() {
        let reply = parse_reply(r#"{"message": {"zeta": 1, "alpha": {"b": true, "a": null}}}"#)
            .unwrap();
        assert_eq!(
            reply.text,
            "{\n  \"alpha\": {\n    \"a\": null,\n    \"b\": true\n  },\n  \"zeta\": 1\n}"
        );

        let reply = parse_reply(r#"{"message": null}"#).unwrap();
        assert_eq!(reply.text, "");
    }

    #[test]
    fn test_unparseable_bodies() {
        assert!(parse_reply("<html>502 Bad Gateway</html>").is_err());
        assert!(parse_reply(r#"{"error": "Server mein problem hai yaar!"}"#).is_err());
        assert!(parse_reply(r#"{"message": "x", "troubleshooting": "not a list"}"#).is_err());
        assert!(parse_reply(r#"{"message": "x", "code_examples": 42}"#).is_err());
    }

    #[test]
    fn test_format_plain_sections() {
        let reply = parse_reply(
            r#"{"message": "Try these",
                "code_examples": {"cli": "aws s3 ls"},
                "troubleshooting": ["Check IAM permissions"],
                "practice_question": {"question": "Pick", "options": ["A", "B"], "correct": 1, "explanation": "B"}}"#,
        )
        .unwrap();
        let mut timeline = Timeline::new();
        let id = timeline.push_assistant(reply.text, reply.payload);

        let text = format_plain(timeline.get(id).unwrap());
        assert!(text.contains("Assistant:"));
        assert!(text.contains("-- cli --\naws s3 ls"));
        assert!(text.contains("  1. Check IAM permissions"));
        assert!(text.contains("  2) B"));
    }
}
