//! Transient notifications shown over the bottom-right corner.

use pb_protocol::NotificationLevel;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const TOAST_TTL: Duration = Duration::from_secs(5);
const MAX_TOASTS: usize = 3;
const TOAST_WIDTH: u16 = 52;
const TOAST_HEIGHT: u16 = 4;

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: NotificationLevel,
    pub message: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a message. The oldest toast is dropped past the limit.
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>, now: Instant) {
        self.items.push_back(Toast {
            level,
            message: message.into(),
            expires_at: now + TOAST_TTL,
        });
        while self.items.len() > MAX_TOASTS {
            self.items.pop_front();
        }
    }

    /// Remove expired toasts.
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|t| t.expires_at > now);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    /// Stack toasts upward from the bottom-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = TOAST_WIDTH.min(area.width);
        let mut bottom = area.bottom();

        for toast in self.items.iter().rev() {
            if bottom < area.y + TOAST_HEIGHT {
                break;
            }
            let rect = Rect::new(area.right() - width, bottom - TOAST_HEIGHT, width, TOAST_HEIGHT);
            bottom -= TOAST_HEIGHT;

            let (title, color) = match toast.level {
                NotificationLevel::Info => ("Info", Color::Cyan),
                NotificationLevel::Warning => ("Aviso", Color::Yellow),
                NotificationLevel::Error => ("Error", Color::Red),
            };
            let paragraph = Paragraph::new(toast.message.as_str())
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color))
                        .title(title),
                );
            frame.render_widget(Clear, rect);
            frame.render_widget(paragraph, rect);
        }
    }
}
