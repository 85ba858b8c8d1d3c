//! Timeline pane: renders the conversation with its structured sections.

use std::cell::Cell;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::models::AssistantPayload;
use crate::session::{Message, Origin, Timeline};

/// Scroll state for the timeline pane.
#[derive(Default)]
pub struct MessagesState {
    /// Lines scrolled up from the bottom (0 = follow the latest message).
    scroll_from_bottom: usize,
    /// Largest useful scroll value seen at the last render.
    max_scroll: Cell<usize>,
}

impl MessagesState {
    /// Scroll toward older messages.
    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = self
            .scroll_from_bottom
            .saturating_add(lines)
            .min(self.max_scroll.get());
    }

    /// Scroll toward newer messages.
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_from_bottom = self.max_scroll.get();
    }

    /// Jump back to the newest message.
    pub fn follow_latest(&mut self) {
        self.scroll_from_bottom = 0;
    }

    pub fn is_following(&self) -> bool {
        self.scroll_from_bottom == 0
    }
}

/// What the pane needs from the session.
pub struct TimelineView<'a> {
    pub timeline: &'a Timeline,
    pub in_flight: bool,
    pub spinner: &'a str,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the timeline pane into the given area.
pub fn render(
    area: Rect,
    buf: &mut Buffer,
    view: &TimelineView,
    state: &MessagesState,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let border_type = if focused {
        BorderType::Double
    } else {
        BorderType::Plain
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Span::styled(
            " Conversation ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let lines = build_lines(view, inner.width as usize);
    let total = lines.len();
    let visible = inner.height as usize;

    let max_scroll = total.saturating_sub(visible);
    state.max_scroll.set(max_scroll);
    let scroll = state.scroll_from_bottom.min(max_scroll);
    let start = max_scroll - scroll;

    for (row, line) in lines.into_iter().skip(start).take(visible).enumerate() {
        let line_area = Rect::new(inner.x, inner.y + row as u16, inner.width, 1);
        Paragraph::new(line).render(line_area, buf);
    }

    // Scroll indicators
    let indicator_x = inner.x + inner.width.saturating_sub(1);
    if start > 0 {
        let cell = &mut buf[(indicator_x, inner.y)];
        cell.set_char('^');
        cell.set_style(Style::default().fg(Color::DarkGray));
    }
    if scroll > 0 {
        let cell = &mut buf[(indicator_x, inner.y + inner.height.saturating_sub(1))];
        cell.set_char('v');
        cell.set_style(Style::default().fg(Color::DarkGray));
    }
}

/// Flatten the whole timeline into display lines.
fn build_lines(view: &TimelineView, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    if view.timeline.is_empty() {
        lines.push(Line::from(Span::styled(
            " Ask anything about EC2, S3, Lambda, IAM, VPC, RDS or CloudWatch.",
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(Span::styled(
            " Attach a console screenshot with Ctrl+O, or ask for a practice quiz.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for msg in view.timeline.all() {
        render_message(&mut lines, msg, width);
        lines.push(Line::from(""));
    }

    if view.in_flight {
        lines.push(Line::from(Span::styled(
            format!(" {} Assistant is thinking...", view.spinner),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Render one message: header, attachment, text and payload sections.
fn render_message(lines: &mut Vec<Line<'static>>, msg: &Message, width: usize) {
    let rule_color = match msg.origin() {
        Origin::User => Color::Cyan,
        Origin::Assistant => Color::Green,
    };
    let rule = Style::default().fg(rule_color);
    let content_width = width.saturating_sub(3);

    lines.push(Line::from(vec![
        Span::styled("| ".to_string(), rule),
        Span::styled(
            msg.origin().as_str().to_string(),
            Style::default()
                .fg(rule_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", msg.created_at().format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    if let Some(image) = msg.attachment() {
        push_row(
            lines,
            rule,
            format!("[image] {}", image.name()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM),
        );
    }

    for text_line in wrap_text(msg.text(), content_width) {
        push_row(lines, rule, text_line, Style::default().fg(Color::White));
    }

    if let Some(payload) = msg.payload() {
        render_payload(lines, payload, rule, content_width);
    }
}

fn render_payload(
    lines: &mut Vec<Line<'static>>,
    payload: &AssistantPayload,
    rule: Style,
    width: usize,
) {
    let heading = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    let body = Style::default().fg(Color::Gray);
    let code = Style::default().fg(Color::LightYellow);

    if let Some(ref info) = payload.service_info {
        push_row(lines, rule, String::new(), body);
        push_row(lines, rule, info.name.clone(), heading);
        for l in wrap_text(&info.description, width) {
            push_row(lines, rule, l, body);
        }
        for (label, value) in [("Console", &info.console), ("CLI", &info.cli), ("SDK", &info.sdk)] {
            if let Some(value) = value {
                for l in wrap_text(&format!("{}: {}", label, value), width) {
                    push_row(lines, rule, l, body);
                }
            }
        }
        if !info.subtopics.is_empty() {
            let topics = format!("Topics: {}", info.subtopics.join(", "));
            for l in wrap_text(&topics, width) {
                push_row(lines, rule, l, Style::default().fg(Color::DarkGray));
            }
        }
        if !info.troubleshoot.is_empty() {
            push_row(lines, rule, "If it goes wrong:".to_string(), body);
            for (i, step) in info.troubleshoot.iter().enumerate() {
                for l in wrap_text(&format!("  {}. {}", i + 1, step), width) {
                    push_row(lines, rule, l, body);
                }
            }
        }
    }

    if let Some(ref examples) = payload.code_examples {
        push_row(lines, rule, String::new(), body);
        push_row(lines, rule, "Code examples".to_string(), heading);
        for (label, block) in examples.blocks() {
            if let Some(label) = label {
                push_row(lines, rule, format!("[{}]", label), body);
            }
            for l in hard_wrap(block, width.saturating_sub(2)) {
                push_row(lines, rule, format!("  {}", l), code);
            }
        }
    }

    if let Some(ref steps) = payload.troubleshooting {
        push_row(lines, rule, String::new(), body);
        push_row(lines, rule, "Troubleshooting".to_string(), heading);
        for (i, step) in steps.iter().enumerate() {
            for (j, l) in wrap_text(step, width.saturating_sub(4)).into_iter().enumerate() {
                let prefix = if j == 0 {
                    format!("{:>2}. ", i + 1)
                } else {
                    "    ".to_string()
                };
                push_row(lines, rule, format!("{}{}", prefix, l), body);
            }
        }
    }

    if let Some(ref question) = payload.practice_question {
        push_row(lines, rule, String::new(), body);
        push_row(lines, rule, "Practice question".to_string(), heading);
        for l in wrap_text(question.prompt(), width) {
            push_row(lines, rule, l, body);
        }
        push_row(
            lines,
            rule,
            format!("({} options, answer in the quiz panel)", question.options().len()),
            Style::default().fg(Color::DarkGray),
        );
    }

    if !payload.follow_up_suggestions.is_empty() {
        push_row(lines, rule, String::new(), body);
        for suggestion in &payload.follow_up_suggestions {
            for l in wrap_text(&format!("> {}", suggestion), width) {
                push_row(
                    lines,
                    rule,
                    l,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM),
                );
            }
        }
    }
}

fn push_row(lines: &mut Vec<Line<'static>>, rule: Style, text: String, style: Style) {
    lines.push(Line::from(vec![
        Span::styled("| ".to_string(), rule),
        Span::styled(text, style),
    ]));
}

/// Word-wrap: split by newlines first, then wrap long lines at spaces.
/// Blank lines are kept.
pub(super) fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![];
    }
    let mut result = Vec::new();
    for line in text.lines() {
        if line.chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();
            if current.is_empty() {
                current = word.to_string();
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.extend(hard_wrap(&current, max_width));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            result.extend(hard_wrap(&current, max_width));
        }
    }
    result
}

/// Split every line at exactly `max_width` characters, keeping indentation.
fn hard_wrap(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![];
    }
    let mut result = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            result.push(String::new());
            continue;
        }
        for chunk in chars.chunks(max_width) {
            result.push(chunk.iter().collect());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeExamples, ServiceInfo};

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(
            wrap_text("check the security group rules", 12),
            vec!["check the", "security", "group rules"]
        );
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_hard_wrap_keeps_indentation() {
        assert_eq!(hard_wrap("    x = 1", 6), vec!["    x ", "= 1"]);
    }

    #[test]
    fn test_render_sections() {
        let mut timeline = Timeline::new();
        timeline.push_user("how do I list buckets?".into(), None);
        timeline.push_assistant(
            "Use the CLI.".into(),
            Some(AssistantPayload {
                service_info: Some(ServiceInfo {
                    name: "Amazon S3".into(),
                    description: "Object storage service".into(),
                    troubleshoot: vec!["Verify bucket region".into()],
                    ..Default::default()
                }),
                code_examples: Some(CodeExamples::Sequence(vec!["aws s3 ls".into()])),
                troubleshooting: Some(vec!["Check IAM permissions".into()]),
                ..Default::default()
            }),
        );

        let view = TimelineView {
            timeline: &timeline,
            in_flight: true,
            spinner: "|",
        };
        let state = MessagesState::default();
        let area = Rect::new(0, 0, 60, 30);
        let mut buf = Buffer::empty(area);
        render(area, &mut buf, &view, &state, false);

        let text = buffer_text(&buf);
        assert!(text.contains("how do I list buckets?"));
        assert!(text.contains("Amazon S3"));
        assert!(text.contains("If it goes wrong:"));
        assert!(text.contains("  1. Verify bucket region"));
        assert!(text.contains("aws s3 ls"));
        assert!(text.contains(" 1. Check IAM permissions"));
        assert!(text.contains("Assistant is thinking"));
    }

    #[test]
    fn test_scroll_clamped_to_content() {
        let mut timeline = Timeline::new();
        for i in 0..20 {
            timeline.push_user(format!("message {}", i), None);
        }
        let view = TimelineView {
            timeline: &timeline,
            in_flight: false,
            spinner: "|",
        };
        let mut state = MessagesState::default();
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);

        render(area, &mut buf, &view, &state, true);
        assert!(buffer_text(&buf).contains("message 19"));

        state.scroll_up(1000);
        assert!(!state.is_following());
        let mut buf = Buffer::empty(area);
        render(area, &mut buf, &view, &state, true);
        let text = buffer_text(&buf);
        assert!(text.contains("message 0"));
        assert!(!text.contains("message 19"));

        state.follow_latest();
        assert!(state.is_following());
    }
}
