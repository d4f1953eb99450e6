use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::fs::search::FileSearch;
use crate::fs::workspace::Workspace;
use crate::theme::ThemeColors;

/// Render the application UI.
pub fn render<W, S>(app: &mut App<W, S>, frame: &mut Frame, theme: &ThemeColors, use_icons: bool)
where
    W: Workspace + Send + Sync,
    S: FileSearch,
{
    let [tree_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    // Update scroll offset to keep selected item visible
    let visible_height = tree_area.height.saturating_sub(2) as usize; // account for border
    app.update_scroll(visible_height);

    let pattern = app.provider.pattern().include.clone();
    let block = Block::default()
        .title(format!(" {} ", pattern))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_fg));

    let tree_widget = TreeWidget::new(
        &app.flat_items,
        app.selected_index,
        app.scroll_offset,
        theme,
        use_icons,
    )
    .block(block);
    frame.render_widget(tree_widget, tree_area);

    let scope = match &app.provider.pattern().exclude {
        Some(exclude) => format!(" {pattern} !{exclude}"),
        None => format!(" {pattern}"),
    };
    let counts = format!("{} roots · {} files", app.root_count, app.file_count);
    let watcher = if app.watcher_active { "[watching]" } else { "[paused]" };

    let mut status = StatusBarWidget::new(&scope, &counts, theme).watcher_status(watcher);
    if let Some((msg, _, is_error)) = &app.status_message {
        status = status.status_message(msg, *is_error);
    }
    frame.render_widget(status, status_area);
}
