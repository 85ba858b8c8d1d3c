//! Quiz panel: the active practice question, its options and, once an
//! answer is locked in, the verdict and explanation.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use super::messages::wrap_text;
use crate::session::QuizState;

const ANSWER_HINT: &str = "Enter/1-9 answer  d dismiss";
const DISMISS_HINT: &str = "  d dismiss";

/// Option highlight cursor.
#[derive(Default)]
pub struct QuizCursor {
    pub index: usize,
}

impl QuizCursor {
    pub fn up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn down(&mut self, option_count: usize) {
        if self.index + 1 < option_count {
            self.index += 1;
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Rows needed to show the current question at `width` columns, borders
/// included (0 when inactive).
pub fn panel_height(quiz: &QuizState, width: u16) -> u16 {
    if quiz.active_question().is_none() {
        return 0;
    }
    let inner_width = width.saturating_sub(2) as usize;
    let rows = build_lines(quiz, &QuizCursor::default(), false, inner_width).len() + 2;
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Render the quiz panel into the given area.
pub fn render(area: Rect, buf: &mut Buffer, quiz: &QuizState, cursor: &QuizCursor, focused: bool) {
    if quiz.active_question().is_none() {
        return;
    }

    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Magenta)
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
            format!(" Practice  score {} ", quiz.score()),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    Paragraph::new(build_lines(quiz, cursor, focused, inner.width as usize)).render(inner, buf);
}

/// Panel content, already wrapped to `width`. One `Line` per screen row, so
/// the line count is the height the content needs.
fn build_lines(
    quiz: &QuizState,
    cursor: &QuizCursor,
    focused: bool,
    width: usize,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let Some(question) = quiz.active_question() else {
        return lines;
    };
    if width == 0 {
        return lines;
    }

    let prompt_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    for row in wrap_text(question.prompt(), width) {
        lines.push(Line::from(Span::styled(row, prompt_style)));
    }
    lines.push(Line::from(""));

    let selected = quiz.selected_index();
    for (i, option) in question.options().iter().enumerate() {
        let (marker, style) = match selected {
            Some(_) if question.is_correct(i) => (
                "+",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Some(s) if s == i => (
                "x",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Some(_) => (" ", Style::default().fg(Color::DarkGray)),
            None if focused && cursor.index == i => (
                ">",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            None => (" ", Style::default().fg(Color::Gray)),
        };

        let prefix = format!("{} {}) ", marker, i + 1);
        let indent = prefix.chars().count();
        if width <= indent {
            for row in wrap_text(&format!("{}{}", prefix, option), width) {
                lines.push(Line::from(Span::styled(row, style)));
            }
            continue;
        }
        let mut rows = wrap_text(option, width - indent).into_iter();
        let first = rows.next().unwrap_or_default();
        lines.push(Line::from(Span::styled(format!("{}{}", prefix, first), style)));
        for row in rows {
            lines.push(Line::from(Span::styled(
                format!("{}{}", " ".repeat(indent), row),
                style,
            )));
        }
    }

    let hint_style = Style::default().fg(Color::DarkGray);
    match selected {
        None => {
            for row in wrap_text(ANSWER_HINT, width) {
                lines.push(Line::from(Span::styled(row, hint_style)));
            }
        }
        Some(s) => {
            let (verdict, verdict_style) = if question.is_correct(s) {
                (
                    "Correct!".to_string(),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (
                    format!("Not quite, the answer is {}.", question.correct_index() + 1),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )
            };
            let rows = wrap_text(&verdict, width);
            let last = rows.len().saturating_sub(1);
            let hint_fits = rows
                .last()
                .is_some_and(|r| r.chars().count() + DISMISS_HINT.len() <= width);
            for (n, row) in rows.into_iter().enumerate() {
                let mut spans = vec![Span::styled(row, verdict_style)];
                if n == last && hint_fits {
                    spans.push(Span::styled(DISMISS_HINT, hint_style));
                }
                lines.push(Line::from(spans));
            }
            if !hint_fits {
                for row in wrap_text(DISMISS_HINT.trim_start(), width) {
                    lines.push(Line::from(Span::styled(row, hint_style)));
                }
            }

            if !question.explanation().is_empty() {
                lines.push(Line::from(""));
                let explanation_style = Style::default().fg(Color::Gray);
                for row in wrap_text(question.explanation(), width) {
                    lines.push(Line::from(Span::styled(row, explanation_style)));
                }
            }
        }
    }

    lines
}
