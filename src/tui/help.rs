//! Help popup overlay: shows all keyboard shortcuts organized by category.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const POPUP_WIDTH: u16 = 76;
const POPUP_HEIGHT: u16 = 20;

/// A shortcut entry: key binding and its description.
struct Shortcut {
    key: &'static str,
    desc: &'static str,
}

/// A category of shortcuts with a title.
struct Category {
    title: &'static str,
    shortcuts: &'static [Shortcut],
}

const COMPOSE: Category = Category {
    title: "COMPOSE",
    shortcuts: &[
        Shortcut {
            key: "Enter",
            desc: "Send question",
        },
        Shortcut {
            key: "Alt+Enter",
            desc: "New line",
        },
        Shortcut {
            key: "Ctrl+O",
            desc: "Attach screenshot",
        },
        Shortcut {
            key: "Ctrl+X",
            desc: "Remove attachment",
        },
        Shortcut {
            key: "Ctrl+U",
            desc: "Clear draft",
        },
    ],
};

const CONVERSATION: Category = Category {
    title: "CONVERSATION",
    shortcuts: &[
        Shortcut {
            key: "PgUp/PgDn",
            desc: "Scroll history",
        },
        Shortcut {
            key: "Home/End",
            desc: "Oldest / latest",
        },
        Shortcut {
            key: "Tab",
            desc: "Cycle focus",
        },
    ],
};

const QUIZ: Category = Category {
    title: "PRACTICE",
    shortcuts: &[
        Shortcut {
            key: "Up/Down",
            desc: "Highlight option",
        },
        Shortcut {
            key: "Enter",
            desc: "Lock in answer",
        },
        Shortcut {
            key: "1-9",
            desc: "Answer directly",
        },
        Shortcut {
            key: "d",
            desc: "Dismiss question",
        },
        Shortcut {
            key: "Ctrl+P",
            desc: "New practice question",
        },
        Shortcut {
            key: "Ctrl+L",
            desc: "Cycle practice level",
        },
    ],
};

const MISC: Category = Category {
    title: "MISC",
    shortcuts: &[
        Shortcut {
            key: "F2",
            desc: "Toggle log pane",
        },
        Shortcut {
            key: "?",
            desc: "Help (outside compose)",
        },
        Shortcut {
            key: "Esc",
            desc: "Cancel / close popup",
        },
        Shortcut {
            key: "Ctrl+C",
            desc: "Quit",
        },
    ],
};

/// Render the help popup overlay centered on screen.
pub fn render_help_popup(frame: &mut Frame) {
    let area = frame.area();

    let popup_w = POPUP_WIDTH.min(area.width.saturating_sub(2));
    let popup_h = POPUP_HEIGHT.min(area.height.saturating_sub(2));
    let popup_area = centered_rect(popup_w, popup_h, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(
                " HELP ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("(? to close) ", Style::default().fg(Color::Gray)),
        ]))
        .title_bottom(Line::from(Span::styled(
            " Press any key to close ",
            Style::default().fg(Color::Gray),
        )));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let [left_col, right_col] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(inner);

    frame.render_widget(
        Paragraph::new(build_column_lines(&[&COMPOSE, &CONVERSATION])),
        inset(left_col, 1, 1),
    );
    frame.render_widget(
        Paragraph::new(build_column_lines(&[&QUIZ, &MISC])),
        inset(right_col, 1, 1),
    );
}

fn build_column_lines<'a>(categories: &[&Category]) -> Vec<Line<'a>> {
    let mut lines: Vec<Line<'a>> = Vec::new();

    for (cat_idx, cat) in categories.iter().enumerate() {
        if cat_idx > 0 {
            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled(
            cat.title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            "\u{2500}".repeat(32),
            Style::default().fg(Color::DarkGray),
        )));

        for sc in cat.shortcuts.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<12}", sc.key), Style::default().fg(Color::Yellow)),
                Span::styled(sc.desc, Style::default().fg(Color::Gray)),
            ]));
        }
    }

    lines
}

/// Return a centered sub-rect of the given size within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn inset(area: Rect, h: u16, v: u16) -> Rect {
    Rect::new(
        area.x + h,
        area.y + v,
        area.width.saturating_sub(h * 2),
        area.height.saturating_sub(v * 2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(76, 20, area), Rect::new(12, 10, 76, 20));
        assert_eq!(inset(Rect::new(0, 0, 1, 1), 1, 1).width, 0);
    }

    #[test]
    fn test_column_lists_every_shortcut() {
        let lines = build_column_lines(&[&QUIZ, &MISC]);
        // title + rule per category, one blank between them
        let expected = 2 + QUIZ.shortcuts.len() + 1 + 2 + MISC.shortcuts.len();
        assert_eq!(lines.len(), expected);
    }
}
