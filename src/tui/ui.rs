//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::app::{App, Connection, Pane};
use super::compose::{self, ComposeView};
use super::help;
use super::log_pane::{self, LOG_PANE_HEIGHT};
use super::messages::{self, TimelineView};
use super::quiz;

const MIN_TIMELINE_ROWS: u16 = 3;

/// Status indicator symbol and color for the connection state.
fn status_indicator(connection: Connection) -> (&'static str, Color, &'static str) {
    match connection {
        Connection::Online => ("*", Color::Green, "online"),
        Connection::Offline => ("o", Color::Red, "offline"),
        Connection::Unknown => ("?", Color::Gray, "connecting"),
    }
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    let log_height = if app.log_pane.visible {
        LOG_PANE_HEIGHT
    } else {
        0
    };
    // The timeline keeps at least MIN_TIMELINE_ROWS; the quiz gets the rest it needs.
    let quiz_room = main_area
        .height
        .saturating_sub(compose::COMPOSE_HEIGHT + log_height + MIN_TIMELINE_ROWS);
    let quiz_height = quiz::panel_height(app.session.quiz(), main_area.width).min(quiz_room);

    let [messages_area, quiz_area, compose_area, log_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(quiz_height),
        Constraint::Length(compose::COMPOSE_HEIGHT),
        Constraint::Length(log_height),
    ])
    .areas(main_area);

    let session = &app.session;

    messages::render(
        messages_area,
        frame.buffer_mut(),
        &TimelineView {
            timeline: session.timeline(),
            in_flight: session.is_in_flight(),
            spinner: app.spinner(),
        },
        &app.messages,
        app.active_pane == Pane::Messages,
    );

    if quiz_height > 0 {
        quiz::render(
            quiz_area,
            frame.buffer_mut(),
            session.quiz(),
            &app.quiz_cursor,
            app.active_pane == Pane::Quiz,
        );
    }

    compose::render(
        compose_area,
        frame,
        &ComposeView {
            draft: session.draft(),
            cursor_pos: app.compose.cursor_pos,
            attachment: session.staged_attachment(),
            can_send: session.can_send(),
            in_flight: session.is_in_flight(),
            attach_prompt: app.attach_prompt.as_deref(),
        },
        app.active_pane == Pane::Compose,
    );

    if log_height > 0 {
        log_pane::render(log_area, frame.buffer_mut(), &app.log_pane);
    }

    render_status(status_area, frame.buffer_mut(), app);

    if app.show_help {
        help::render_help_popup(frame);
    }
}

fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let title_text = " Cloud Tutor";
    let title = Span::styled(
        title_text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let (symbol, color, label) = status_indicator(app.connection);
    let score = app.session.quiz().score();

    let right = [
        (" [?] Help ".to_string(), Style::default().fg(Color::Gray)),
        (
            format!(" score {} ", score),
            Style::default().fg(Color::Magenta),
        ),
        (format!(" {} {} ", symbol, label), Style::default().fg(color)),
    ];

    let right_width: usize = right.iter().map(|(text, _)| text.len()).sum();
    let padding_width = (area.width as usize).saturating_sub(title_text.len() + right_width);

    let mut spans = vec![title, Span::raw(" ".repeat(padding_width))];
    spans.extend(right.into_iter().map(|(text, style)| Span::styled(text, style)));

    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    if let Some(ref msg) = app.status_message {
        let style = if app.status_is_error {
            Style::default().fg(Color::Red).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green).bg(Color::DarkGray)
        };
        Paragraph::new(Line::from(Span::styled(format!(" {} ", msg), style)))
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
        return;
    }

    let sep_style = Style::default().fg(Color::DarkGray);

    let activity = if app.session.is_in_flight() {
        Span::styled(
            format!(" {} asking ", app.spinner()),
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::styled(" idle ", Style::default().fg(Color::Gray))
    };

    let backend = Span::styled(app.api_url.clone(), Style::default().fg(Color::Cyan));

    let pane = Span::styled(
        format!("Tab: {} ", app.active_pane.as_str()),
        Style::default().fg(Color::Yellow),
    );

    let hints = Span::styled(
        "C-o attach | F2 log | C-c quit",
        Style::default().fg(Color::Gray),
    );

    let status_line = Line::from(vec![
        activity,
        Span::styled(" | ", sep_style),
        backend,
        Span::styled(" | ", sep_style),
        pane,
        Span::styled(" | ", sep_style),
        hints,
    ]);

    Paragraph::new(status_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::log_pane::{LogBuffer, LogPane};
    use crate::models::PracticeQuestion;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_render_empty_session() {
        let app = App::new("http://localhost:5000".into(), LogPane::new(LogBuffer::new()));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Cloud Tutor"));
        assert!(text.contains("score 0/0"));
        assert!(text.contains("connecting"));
        assert!(text.contains("Tab: compose"));
        assert!(!text.contains("Practice"));
    }

    #[test]
    fn test_revealed_quiz_shows_whole_explanation() {
        let mut app = App::new("http://localhost:5000".into(), LogPane::new(LogBuffer::new()));
        app.session.present_question(Arc::new(
            PracticeQuestion::new(
                "Production environment ke liye EC2 instance choose karte time kya consider karna chahiye?",
                vec![
                    "Only price".into(),
                    "CPU aur memory requirements".into(),
                    "All resources aur redundancy".into(),
                    "Storage type only".into(),
                ],
                2,
                "Production mein CPU, memory, storage, network aur high availability sab consider karna padta hai yaar.",
            )
            .unwrap(),
        ));
        app.session.select_answer(2).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Correct!"));
        assert!(text.contains("Production mein CPU"));
        assert!(text.contains("padta hai yaar."));
    }

    #[test]
    fn test_status_message_replaces_hints() {
        let mut app = App::new("http://localhost:5000".into(), LogPane::new(LogBuffer::new()));
        app.status_message = Some("Attached shot.png".into());
        app.log_pane.visible = true;
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Attached shot.png"));
        assert!(!text.contains("C-c quit"));
        assert!(text.contains("Log (F2)"));
    }
}
