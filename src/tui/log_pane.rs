//! In-TUI log capture.
//!
//! While the alternate screen is active, tracing output must not reach
//! stderr. `LogBuffer` is a `MakeWriter` that collects formatted lines in a
//! bounded queue; `LogPane` drains it on every tick and renders the tail.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use tracing_subscriber::fmt::MakeWriter;

/// Lines held between two drains.
const PENDING_CAPACITY: usize = 256;
/// Lines the pane keeps for display.
const HISTORY_CAPACITY: usize = 500;
/// Height of the log pane, borders included.
pub const LOG_PANE_HEIGHT: u16 = 8;

/// Shared queue of captured log lines.
#[derive(Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line, dropping the oldest one when full.
    pub fn push(&self, line: String) {
        // A poisoned lock only means a writer panicked mid-push; the queue is still usable.
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() >= PENDING_CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Take everything captured so far, oldest first.
    pub fn drain(&self) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.drain(..).collect()
    }
}

/// Writer handed out per event; splits the formatted output into lines.
pub struct LineWriter {
    target: LogBuffer,
    partial: Vec<u8>,
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            self.target
                .push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            self.target.push(String::from_utf8_lossy(&rest).into_owned());
        }
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            target: self.clone(),
            partial: Vec::new(),
        }
    }
}

/// Toggleable pane showing recent log lines.
pub struct LogPane {
    source: LogBuffer,
    history: VecDeque<String>,
    pub visible: bool,
}

impl LogPane {
    pub fn new(source: LogBuffer) -> Self {
        Self {
            source,
            history: VecDeque::new(),
            visible: false,
        }
    }

    /// Pull newly captured lines into the pane's history.
    pub fn refresh(&mut self) {
        for line in self.source.drain() {
            if self.history.len() >= HISTORY_CAPACITY {
                self.history.pop_front();
            }
            self.history.push_back(line);
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

/// Render the tail of the log history.
pub fn render(area: Rect, buf: &mut Buffer, pane: &LogPane) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Log (F2) ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let skip = pane.history.len().saturating_sub(inner.height as usize);
    let lines: Vec<Line> = pane
        .history
        .iter()
        .skip(skip)
        .map(|line| Line::from(Span::styled(line.clone(), level_style(line))))
        .collect();

    Paragraph::new(lines).render(inner, buf);
}

fn level_style(line: &str) -> Style {
    if line.contains("ERROR") {
        Style::default().fg(Color::Red)
    } else if line.contains(" WARN") {
        Style::default().fg(Color::Yellow)
    } else if line.contains("DEBUG") || line.contains("TRACE") {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Gray)
    }
}
