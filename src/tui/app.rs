//! TUI application state and main event loop

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use ratatui::DefaultTerminal;

use super::backend::{Backend, BackendCommand, BackendResponse};
use super::compose::ComposeState;
use super::log_pane::{LogBuffer, LogPane};
use super::messages::MessagesState;
use super::quiz::QuizCursor;
use super::ui;
use crate::api::client::TutorClient;
use crate::api::practice::{Difficulty, PracticeRequest};
use crate::config::Config;
use crate::session::{RawFile, Session};

/// Redraw / spinner interval.
const TICK_MS: u64 = 120;
/// Lines moved per PgUp/PgDn.
const PAGE_LINES: usize = 10;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Focused pane
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pane {
    Messages,
    Quiz,
    #[default]
    Compose,
}

impl Pane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pane::Messages => "conversation",
            Pane::Quiz => "practice",
            Pane::Compose => "compose",
        }
    }
}

/// What we last heard from the backend.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Connection {
    #[default]
    Unknown,
    Online,
    Offline,
}

/// Application state
pub struct App {
    pub session: Session,
    pub compose: ComposeState,
    /// Path being typed while the attach prompt is open.
    pub attach_prompt: Option<String>,
    pub messages: MessagesState,
    pub quiz_cursor: QuizCursor,
    /// Level used for on-demand practice questions.
    pub difficulty: Difficulty,
    pub practice_pending: bool,
    pub active_pane: Pane,
    pub show_help: bool,
    pub log_pane: LogPane,
    pub status_message: Option<String>,
    pub status_is_error: bool,
    pub connection: Connection,
    pub spinner_frame: usize,
    pub api_url: String,
    pub should_exit: bool,
}

impl App {
    pub fn new(api_url: String, log_pane: LogPane) -> Self {
        Self {
            session: Session::new(),
            compose: ComposeState::default(),
            attach_prompt: None,
            messages: MessagesState::default(),
            quiz_cursor: QuizCursor::default(),
            difficulty: Difficulty::default(),
            practice_pending: false,
            active_pane: Pane::default(),
            show_help: false,
            log_pane,
            status_message: None,
            status_is_error: false,
            connection: Connection::default(),
            spinner_frame: 0,
            api_url,
            should_exit: false,
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    fn set_status(&mut self, msg: impl Into<String>, is_error: bool) {
        self.status_message = Some(msg.into());
        self.status_is_error = is_error;
    }

    fn cycle_focus(&mut self) {
        let quiz_active = self.session.quiz().active_question().is_some();
        self.active_pane = match self.active_pane {
            Pane::Compose => Pane::Messages,
            Pane::Messages if quiz_active => Pane::Quiz,
            Pane::Messages | Pane::Quiz => Pane::Compose,
        };
    }

    /// Handle one key press. Returns a command for the backend, if the key
    /// started one.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<BackendCommand> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_exit = true;
            return None;
        }

        if self.show_help {
            self.show_help = false;
            return None;
        }

        if self.attach_prompt.is_some() {
            self.handle_attach_key(key);
            return None;
        }

        self.status_message = None;

        match key.code {
            KeyCode::F(2) => {
                self.log_pane.toggle();
                return None;
            }
            KeyCode::Tab => {
                self.cycle_focus();
                return None;
            }
            KeyCode::PageUp => {
                self.messages.scroll_up(PAGE_LINES);
                return None;
            }
            KeyCode::PageDown => {
                self.messages.scroll_down(PAGE_LINES);
                return None;
            }
            _ => {}
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('o') => self.attach_prompt = Some(String::new()),
                KeyCode::Char('x') => {
                    if let Some(image) = self.session.clear_attachment() {
                        self.set_status(format!("Removed {}", image.name()), false);
                    }
                }
                KeyCode::Char('u') => self.compose.clear(self.session.draft_mut()),
                KeyCode::Char('p') => return self.request_practice(),
                KeyCode::Char('l') => {
                    self.difficulty = self.difficulty.next();
                    self.set_status(format!("Practice level: {}", self.difficulty), false);
                }
                _ => {}
            }
            return None;
        }

        match self.active_pane {
            Pane::Compose => self.handle_compose_key(key),
            Pane::Messages => {
                self.handle_messages_key(key);
                None
            }
            Pane::Quiz => {
                self.handle_quiz_key(key);
                None
            }
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) -> Option<BackendCommand> {
        match key.code {
            KeyCode::Enter
                if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
            {
                self.compose.insert_newline(self.session.draft_mut());
            }
            KeyCode::Enter => return self.start_send(),
            KeyCode::Char(c) => self.compose.insert_char(self.session.draft_mut(), c),
            KeyCode::Backspace => self.compose.backspace(self.session.draft_mut()),
            KeyCode::Delete => self.compose.delete(self.session.draft_mut()),
            KeyCode::Left => self.compose.move_left(self.session.draft()),
            KeyCode::Right => self.compose.move_right(self.session.draft()),
            KeyCode::Home => self.compose.move_home(),
            KeyCode::End => self.compose.move_end(self.session.draft()),
            KeyCode::Esc => self.active_pane = Pane::Messages,
            _ => {}
        }
        None
    }

    fn start_send(&mut self) -> Option<BackendCommand> {
        match self.session.begin_send() {
            Ok(request) => {
                self.compose.move_home();
                self.messages.follow_latest();
                Some(BackendCommand::Ask(request))
            }
            Err(reason) => {
                tracing::debug!("Send ignored: {}", reason);
                None
            }
        }
    }

    fn request_practice(&mut self) -> Option<BackendCommand> {
        if self.practice_pending {
            return None;
        }
        self.practice_pending = true;
        self.set_status(format!("Fetching a {} question...", self.difficulty), false);
        Some(BackendCommand::Practice(PracticeRequest {
            difficulty: self.difficulty,
            ..PracticeRequest::default()
        }))
    }

    fn focus_new_question(&mut self) {
        self.quiz_cursor.reset();
        self.active_pane = Pane::Quiz;
    }

    fn handle_messages_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.messages.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.messages.scroll_down(1),
            KeyCode::Home | KeyCode::Char('g') => self.messages.scroll_to_top(),
            KeyCode::End | KeyCode::Char('G') => self.messages.follow_latest(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('d') => self.dismiss_quiz(),
            KeyCode::Esc => self.active_pane = Pane::Compose,
            _ => {}
        }
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) {
        let option_count = self
            .session
            .quiz()
            .active_question()
            .map(|q| q.options().len())
            .unwrap_or(0);

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.quiz_cursor.up(),
            KeyCode::Down | KeyCode::Char('j') => self.quiz_cursor.down(option_count),
            KeyCode::Enter => self.answer(self.quiz_cursor.index),
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as u8 - b'1') as usize;
                self.answer(index);
            }
            KeyCode::Char('d') => self.dismiss_quiz(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Esc => self.active_pane = Pane::Compose,
            _ => {}
        }
    }

    fn answer(&mut self, index: usize) {
        match self.session.select_answer(index) {
            Ok(outcome) => {
                let verdict = if outcome.is_correct {
                    "Correct!"
                } else {
                    "Not quite."
                };
                self.set_status(format!("{} Score {}", verdict, outcome.score), false);
            }
            Err(reason) => tracing::debug!("Answer ignored: {}", reason),
        }
    }

    fn dismiss_quiz(&mut self) {
        if self.session.dismiss_quiz() {
            self.quiz_cursor.reset();
            if self.active_pane == Pane::Quiz {
                self.active_pane = Pane::Compose;
            }
        }
    }

    fn handle_attach_key(&mut self, key: KeyEvent) {
        let Some(path) = self.attach_prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.attach_prompt = None,
            KeyCode::Backspace => {
                path.pop();
            }
            KeyCode::Char(c) => path.push(c),
            KeyCode::Enter => {
                let path = path.trim().to_string();
                self.attach_prompt = None;
                if !path.is_empty() {
                    self.attach_file(Path::new(&path));
                }
            }
            _ => {}
        }
    }

    fn attach_file(&mut self, path: &Path) {
        match RawFile::from_path(path) {
            Ok(file) => {
                // Non-image files are dropped without a message.
                if self.session.stage_attachment(file) {
                    if let Some(image) = self.session.staged_attachment() {
                        let msg = format!("Attached {}", image.name());
                        self.set_status(msg, false);
                    }
                    self.active_pane = Pane::Compose;
                }
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                self.set_status(format!("{:#}", e), true);
            }
        }
    }

    /// Apply a backend response to the state.
    pub fn handle_response(&mut self, response: BackendResponse) {
        match response {
            BackendResponse::Reply(outcome) => {
                self.connection = if outcome.is_ok() {
                    Connection::Online
                } else {
                    Connection::Offline
                };

                let before = self.session.quiz().active_question().cloned();
                self.session.complete_send(outcome);
                let replaced = match (before, self.session.quiz().active_question()) {
                    (Some(old), Some(new)) => !Arc::ptr_eq(&old, new),
                    (None, Some(_)) => true,
                    (_, None) => false,
                };

                if replaced {
                    self.focus_new_question();
                }
                self.messages.follow_latest();
            }
            BackendResponse::Practice(Ok(question)) => {
                self.practice_pending = false;
                self.connection = Connection::Online;
                self.session.present_question(Arc::new(question));
                self.focus_new_question();
                self.status_message = None;
            }
            BackendResponse::Practice(Err(e)) => {
                self.practice_pending = false;
                tracing::warn!("Practice request failed: {:#}", e);
                self.set_status(format!("{:#}", e), true);
            }
            BackendResponse::Health(Ok(health)) => {
                tracing::info!("Backend status: {}", health.status);
                self.connection = Connection::Online;
            }
            BackendResponse::Health(Err(e)) => {
                tracing::warn!("Health check failed: {:#}", e);
                self.connection = Connection::Offline;
                self.set_status(format!("Backend unreachable at {}", self.api_url), true);
            }
        }
    }

    pub fn on_tick(&mut self) {
        if self.session.is_in_flight() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
        self.log_pane.refresh();
    }
}

/// Run the TUI with panic-safe terminal restore.
pub async fn run(config: Config, logs: LogBuffer) -> Result<()> {
    let client = TutorClient::new(&config)?;

    let mut terminal = ratatui::init();
    let result = AssertUnwindSafe(run_app(&mut terminal, client, logs))
        .catch_unwind()
        .await;
    ratatui::restore();

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

async fn run_app(terminal: &mut DefaultTerminal, client: TutorClient, logs: LogBuffer) -> Result<()> {
    let mut app = App::new(client.base_url().to_string(), LogPane::new(logs));
    let mut backend = Backend::start(client);
    backend.send(BackendCommand::CheckHealth);

    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(TICK_MS));

    while !app.should_exit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if let Some(cmd) = app.handle_key(key) {
                        backend.send(cmd);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                None => break,
            },
            Some(response) = backend.recv() => app.handle_response(response),
            _ = tick.tick() => app.on_tick(),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssistantPayload, AssistantReply, PracticeQuestion};
    use crate::session::{QuizPhase, FALLBACK_TEXT};
    use anyhow::anyhow;

    fn app() -> App {
        App::new("http://localhost:5000".into(), LogPane::new(LogBuffer::new()))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle_key(press(KeyCode::Char(c))).is_none());
        }
    }

    fn lambda_question() -> PracticeQuestion {
        PracticeQuestion::new(
            "Where do Lambda logs go?",
            vec!["S3".into(), "CloudWatch Logs".into(), "EBS".into()],
            1,
            "Lambda writes to CloudWatch Logs.",
        )
        .unwrap()
    }

    fn reply_carrying(question: Option<Arc<PracticeQuestion>>) -> AssistantReply {
        AssistantReply {
            text: "Here's one to try.".into(),
            payload: Some(AssistantPayload {
                practice_question: question,
                follow_up_suggestions: vec!["Ask about S3".into()],
                ..Default::default()
            }),
            session_id: None,
        }
    }

    fn quiz_reply() -> AssistantReply {
        reply_carrying(Some(Arc::new(lambda_question())))
    }

    #[test]
    fn test_enter_sends_draft_once() {
        let mut app = app();
        assert!(app.handle_key(press(KeyCode::Enter)).is_none());

        type_text(&mut app, "what is s3?");
        let Some(BackendCommand::Ask(request)) = app.handle_key(press(KeyCode::Enter)) else {
            panic!("expected an ask command");
        };
        assert_eq!(request.message, "what is s3?");
        assert_eq!(app.session.draft(), "");
        assert!(app.session.is_in_flight());

        type_text(&mut app, "and glacier?");
        assert!(app.handle_key(press(KeyCode::Enter)).is_none());
        assert_eq!(app.session.draft(), "and glacier?");
        assert_eq!(app.session.timeline().len(), 1);
    }

    #[test]
    fn test_alt_enter_inserts_newline() {
        let mut app = app();
        type_text(&mut app, "a");
        let cmd = app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
        assert!(cmd.is_none());
        type_text(&mut app, "b");
        assert_eq!(app.session.draft(), "a\nb");
    }

    #[test]
    fn test_reply_with_question_focuses_quiz() {
        let mut app = app();
        type_text(&mut app, "quiz me");
        app.handle_key(press(KeyCode::Enter));
        app.handle_response(BackendResponse::Reply(Ok(quiz_reply())));

        assert_eq!(app.connection, Connection::Online);
        assert_eq!(app.active_pane, Pane::Quiz);
        assert_eq!(app.session.quiz().phase(), QuizPhase::Presented);

        app.handle_key(press(KeyCode::Char('2')));
        assert_eq!(app.session.quiz().phase(), QuizPhase::Revealed);
        assert_eq!(app.session.quiz().score().correct, 1);
        assert!(app
            .status_message
            .as_deref()
            .is_some_and(|s| s.starts_with("Correct!")));

        // Revealed: further answers are ignored.
        app.handle_key(press(KeyCode::Char('1')));
        assert_eq!(app.session.quiz().score().total, 1);

        app.handle_key(press(KeyCode::Char('d')));
        assert_eq!(app.session.quiz().phase(), QuizPhase::Inactive);
        assert_eq!(app.active_pane, Pane::Compose);
    }

    #[test]
    fn test_new_question_in_reply_takes_focus_again() {
        let mut app = app();
        type_text(&mut app, "quiz me");
        app.handle_key(press(KeyCode::Enter));
        app.handle_response(BackendResponse::Reply(Ok(quiz_reply())));
        app.handle_key(press(KeyCode::Down));
        assert_eq!(app.quiz_cursor.index, 1);

        // A reply without a question leaves the quiz and focus alone.
        app.handle_key(press(KeyCode::Esc));
        type_text(&mut app, "thanks");
        app.handle_key(press(KeyCode::Enter));
        app.handle_response(BackendResponse::Reply(Ok(reply_carrying(None))));
        assert_eq!(app.active_pane, Pane::Compose);
        assert_eq!(app.session.quiz().phase(), QuizPhase::Presented);

        // A fresh question with identical content still counts as new.
        type_text(&mut app, "another");
        app.handle_key(press(KeyCode::Enter));
        app.handle_response(BackendResponse::Reply(Ok(quiz_reply())));
        assert_eq!(app.active_pane, Pane::Quiz);
        assert_eq!(app.quiz_cursor.index, 0);
    }

    #[test]
    fn test_ctrl_p_fetches_practice_question() {
        let mut app = app();
        app.handle_key(ctrl('l'));
        assert_eq!(app.difficulty, Difficulty::Intermediate);

        let Some(BackendCommand::Practice(request)) = app.handle_key(ctrl('p')) else {
            panic!("expected a practice command");
        };
        assert_eq!(request.difficulty, Difficulty::Intermediate);
        assert!(request.service.is_none());
        // Only one fetch at a time.
        assert!(app.handle_key(ctrl('p')).is_none());

        app.handle_response(BackendResponse::Practice(Ok(lambda_question())));
        assert!(!app.practice_pending);
        assert_eq!(app.session.quiz().phase(), QuizPhase::Presented);
        assert_eq!(app.active_pane, Pane::Quiz);
        assert!(app.session.timeline().is_empty());

        app.handle_key(press(KeyCode::Char('2')));
        assert_eq!(app.session.quiz().score().correct, 1);
    }

    #[test]
    fn test_practice_error_shows_backend_message() {
        let mut app = app();
        app.handle_key(ctrl('p'));
        app.handle_response(BackendResponse::Practice(Err(anyhow!(
            "HTTP 400 for http://localhost:5000/api/practice: Invalid difficulty level yaar!"
        ))));

        assert!(!app.practice_pending);
        assert!(app.status_is_error);
        assert!(app
            .status_message
            .as_deref()
            .is_some_and(|s| s.contains("Invalid difficulty level yaar!")));
        assert_eq!(app.session.quiz().phase(), QuizPhase::Inactive);
        assert_eq!(app.active_pane, Pane::Compose);
    }

    #[test]
    fn test_cursor_answer_with_enter() {
        let mut app = app();
        type_text(&mut app, "quiz");
        app.handle_key(press(KeyCode::Enter));
        app.handle_response(BackendResponse::Reply(Ok(quiz_reply())));

        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.session.quiz().selected_index(), Some(2));
        assert_eq!(app.session.quiz().score().correct, 0);
    }

    #[test]
    fn test_failed_reply_shows_fallback_and_goes_offline() {
        let mut app = app();
        type_text(&mut app, "hello");
        app.handle_key(press(KeyCode::Enter));
        app.handle_response(BackendResponse::Reply(Err(anyhow!("connection refused"))));

        assert_eq!(app.connection, Connection::Offline);
        assert!(!app.session.is_in_flight());
        let last = app.session.timeline().last().unwrap();
        assert_eq!(last.text(), FALLBACK_TEXT);
    }

    #[test]
    fn test_attach_prompt_missing_file_reports_error() {
        let mut app = app();
        app.handle_key(ctrl('o'));
        assert_eq!(app.attach_prompt.as_deref(), Some(""));

        type_text(&mut app, "/nonexistent/shot.png");
        assert_eq!(app.session.draft(), "");
        app.handle_key(press(KeyCode::Enter));

        assert!(app.attach_prompt.is_none());
        assert!(app.session.staged_attachment().is_none());
        assert!(app.status_is_error);
    }

    #[test]
    fn test_attach_prompt_escape_cancels() {
        let mut app = app();
        app.handle_key(ctrl('o'));
        type_text(&mut app, "x");
        app.handle_key(press(KeyCode::Esc));
        assert!(app.attach_prompt.is_none());
        assert!(app.status_message.is_none());
    }

    #[test]
    fn test_focus_cycle_skips_inactive_quiz() {
        let mut app = app();
        assert_eq!(app.active_pane, Pane::Compose);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.active_pane, Pane::Messages);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.active_pane, Pane::Compose);
    }

    #[test]
    fn test_help_toggle_and_quit() {
        let mut app = app();
        app.handle_key(press(KeyCode::Tab));
        app.handle_key(press(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(press(KeyCode::Char('x')));
        assert!(!app.show_help);

        app.handle_key(press(KeyCode::F(2)));
        assert!(app.log_pane.visible);

        app.handle_key(ctrl('c'));
        assert!(app.should_exit);
    }
}
