//! Compose box: draft input, attachment line and send control.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};

use crate::session::EncodedImage;

/// Cursor over the session's draft text.
///
/// The draft itself lives in the session; this only tracks where the cursor
/// is. Positions are character offsets and are clamped on every edit, since
/// the draft can be cleared underneath us by a send.
#[derive(Default)]
pub struct ComposeState {
    pub cursor_pos: usize,
}

impl ComposeState {
    fn clamp(&mut self, input: &str) -> usize {
        let char_count = input.chars().count();
        self.cursor_pos = self.cursor_pos.min(char_count);
        char_count
    }

    /// Insert a character at the current cursor position.
    pub fn insert_char(&mut self, input: &mut String, c: char) {
        self.clamp(input);
        let byte_pos = char_to_byte(input, self.cursor_pos);
        input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    /// Insert a newline at the current cursor position.
    pub fn insert_newline(&mut self, input: &mut String) {
        self.insert_char(input, '\n');
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self, input: &mut String) {
        self.clamp(input);
        if self.cursor_pos > 0 {
            let byte_pos = char_to_byte(input, self.cursor_pos);
            let prev_byte_pos = char_to_byte(input, self.cursor_pos - 1);
            input.drain(prev_byte_pos..byte_pos);
            self.cursor_pos -= 1;
        }
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete(&mut self, input: &mut String) {
        let char_count = self.clamp(input);
        if self.cursor_pos < char_count {
            let byte_pos = char_to_byte(input, self.cursor_pos);
            let next_byte_pos = char_to_byte(input, self.cursor_pos + 1);
            input.drain(byte_pos..next_byte_pos);
        }
    }

    pub fn move_left(&mut self, input: &str) {
        self.clamp(input);
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_right(&mut self, input: &str) {
        let char_count = self.clamp(input);
        if self.cursor_pos < char_count {
            self.cursor_pos += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self, input: &str) {
        self.cursor_pos = input.chars().count();
    }

    /// Clear all input text (Ctrl+U).
    pub fn clear(&mut self, input: &mut String) {
        input.clear();
        self.cursor_pos = 0;
    }
}

/// Convert a char-based cursor position to a byte offset.
fn char_to_byte(input: &str, char_pos: usize) -> usize {
    input
        .char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(input.len())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Height of the compose box: 1 border + 1 attachment line + 1 input + 1 border.
pub const COMPOSE_HEIGHT: u16 = 4;

/// Everything the compose box shows, borrowed from app state.
pub struct ComposeView<'a> {
    pub draft: &'a str,
    pub cursor_pos: usize,
    pub attachment: Option<&'a EncodedImage>,
    pub can_send: bool,
    pub in_flight: bool,
    /// Path typed so far while the attach prompt is open.
    pub attach_prompt: Option<&'a str>,
}

/// Render the compose box into the given area.
///
/// Uses `Frame` directly so we can both write to the buffer and set cursor.
pub fn render(area: Rect, frame: &mut Frame, view: &ComposeView, focused: bool) {
    let focused = focused || view.attach_prompt.is_some();
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
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let toolbar_area = Rect::new(inner.x, inner.y, inner.width, 1);
    render_toolbar(toolbar_area, frame.buffer_mut(), view);

    if inner.height >= 2 {
        let input_area = Rect::new(inner.x, inner.y + 1, inner.width, 1);

        let cursor = render_input(input_area, frame.buffer_mut(), view);
        if focused {
            frame.set_cursor_position(cursor);
        }
    }
}

/// Attachment status on the left, send control on the right.
fn render_toolbar(area: Rect, buf: &mut Buffer, view: &ComposeView) {
    let w = area.width as usize;

    let left = match view.attachment {
        Some(image) => Span::styled(
            format!(
                " [image] {} ({})  C-x remove",
                image.name(),
                human_size(image.size())
            ),
            Style::default().fg(Color::Cyan),
        ),
        None => Span::styled(
            " C-o attach screenshot",
            Style::default().fg(Color::DarkGray),
        ),
    };

    let (send_label, send_style) = if view.in_flight {
        ("sending...", Style::default().fg(Color::Yellow))
    } else if view.can_send {
        (
            "Enter send >",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("Enter send >", Style::default().fg(Color::DarkGray))
    };

    let left_w = unicode_width::UnicodeWidthStr::width(left.content.as_ref());
    let right_w = send_label.len() + 1;
    let padding = w.saturating_sub(left_w + right_w);

    let line = Line::from(vec![
        left,
        Span::raw(" ".repeat(padding)),
        Span::styled(send_label, send_style),
        Span::raw(" "),
    ]);

    Paragraph::new(line).render(area, buf);
}

/// Render the input line and return where the cursor goes.
fn render_input(area: Rect, buf: &mut Buffer, view: &ComposeView) -> (u16, u16) {
    let w = area.width as usize;

    if let Some(path) = view.attach_prompt {
        let label = " Image path: ";
        let avail = w.saturating_sub(label.len());
        let shown: String = tail_chars(path, avail.saturating_sub(1));
        let cursor_x = area.x + (label.len() + shown.chars().count()) as u16;
        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Yellow)),
            Span::styled(shown, Style::default().fg(Color::White)),
        ]);
        Paragraph::new(line).render(area, buf);
        return (cursor_x.min(area.x + area.width.saturating_sub(1)), area.y);
    }

    if view.draft.is_empty() {
        let placeholder = " Ask about an AWS service, or type \"quiz\" for practice...";
        let truncated: String = placeholder.chars().take(w).collect();
        Paragraph::new(Line::from(Span::styled(
            truncated,
            Style::default().fg(Color::DarkGray),
        )))
        .render(area, buf);
        return (area.x + 1, area.y);
    }

    let display = compose_display_text(view.draft, view.cursor_pos, w);
    Paragraph::new(Line::from(Span::styled(
        format!(" {}", display.visible),
        Style::default().fg(Color::White),
    )))
    .render(area, buf);
    (area.x + 1 + display.cursor_offset as u16, area.y)
}

fn tail_chars(s: &str, max: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(max)).collect()
}

fn human_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

/// Information about what text to display and where the cursor is.
struct DisplayText {
    visible: String,
    /// Cursor column within `visible`.
    cursor_offset: usize,
}

/// Flatten the draft onto one line (newlines shown as " | ") and scroll it
/// horizontally so the cursor stays visible.
fn compose_display_text(input: &str, cursor_pos: usize, width: usize) -> DisplayText {
    let flat: Vec<char> = input.replace('\n', " | ").chars().collect();

    let flat_cursor: usize = input
        .chars()
        .take(cursor_pos)
        .map(|ch| if ch == '\n' { 3 } else { 1 })
        .sum();

    let avail = width.saturating_sub(1);
    if avail == 0 {
        return DisplayText {
            visible: String::new(),
            cursor_offset: 0,
        };
    }

    if flat.len() <= avail {
        return DisplayText {
            visible: flat.into_iter().collect(),
            cursor_offset: flat_cursor,
        };
    }

    let scroll_start = (flat_cursor + 1).saturating_sub(avail);
    let end = (scroll_start + avail).min(flat.len());
    DisplayText {
        visible: flat[scroll_start..end].iter().collect(),
        cursor_offset: flat_cursor - scroll_start,
    }
}
