use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " r:refresh  w:watch  q:quit ";

/// Status bar widget that shows the active pattern, tree counts, watcher
/// state and key hints, or a transient status message.
pub struct StatusBarWidget<'a> {
    pattern: &'a str,
    counts: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    watcher_status: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(pattern: &'a str, counts: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            pattern,
            counts,
            theme,
            status_message: None,
            is_error: false,
            watcher_status: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn watcher_status(mut self, status: &'a str) -> Self {
        self.watcher_status = Some(status);
        self
    }
}

/// Keep at most `n` chars from the start of `s`.
fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Keep at most `n` chars, eliding the front with "...".
fn tail_elided(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if len <= n {
        return s.to_string();
    }
    if n <= 3 {
        return head(s, n);
    }
    let kept: String = s.chars().skip(len - (n - 3)).collect();
    format!("...{kept}")
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };

            let display = format!("{:<width$}", head(msg, width), width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [pattern] [counts] [watcher] [key_hints]
        let hints_len = KEY_HINTS.len();
        let watcher_len = self
            .watcher_status
            .map(|w| w.chars().count() + 1)
            .unwrap_or(0);
        let remaining = width.saturating_sub(hints_len).saturating_sub(watcher_len);

        let counts_len = self.counts.chars().count();
        let pattern_budget = remaining.saturating_sub(counts_len).saturating_sub(1);
        let pattern_display = tail_elided(self.pattern, pattern_budget);
        let pattern_len = pattern_display.chars().count();

        let counts_display = head(self.counts, remaining.saturating_sub(pattern_len));
        let gap = remaining
            .saturating_sub(pattern_len)
            .saturating_sub(counts_display.chars().count());

        let pattern_style = Style::default().fg(self.theme.status_fg);
        let counts_style = Style::default().fg(self.theme.info_fg);
        let hints_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);

        let mut spans = vec![
            Span::styled(pattern_display, pattern_style),
            Span::raw(" ".repeat(gap)),
            Span::styled(counts_display, counts_style),
        ];

        if let Some(watcher_str) = self.watcher_status {
            let watcher_style = Style::default()
                .fg(self.theme.warning_fg)
                .add_modifier(Modifier::BOLD);
            spans.push(Span::raw(" "));
            spans.push(Span::styled(watcher_str.to_string(), watcher_style));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        spans.push(Span::styled(KEY_HINTS, hints_style));

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
