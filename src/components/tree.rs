use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::FlatItem;
use crate::theme::ThemeColors;
use crate::tree::node::NodeKind;

/// Tree widget that renders the grouped file tree with box-drawing characters.
pub struct TreeWidget<'a> {
    items: &'a [FlatItem],
    selected: usize,
    scroll_offset: usize,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(
        items: &'a [FlatItem],
        selected: usize,
        scroll_offset: usize,
        theme: &'a ThemeColors,
        use_icons: bool,
    ) -> Self {
        Self {
            items,
            selected,
            scroll_offset,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the prefix string for tree indentation using box-drawing characters.
    ///
    /// Roots (depth 0) get no prefix. For each ancestor level the nearest
    /// preceding row at that depth tells whether a continuation line is needed.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..item.depth {
            let mut ancestor_is_last = false;
            for j in (0..item_index).rev() {
                if items[j].depth == d {
                    ancestor_is_last = items[j].is_last_sibling;
                    break;
                }
                if items[j].depth < d {
                    break;
                }
            }
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }

        parts.push(if item.is_last_sibling { "└──" } else { "├──" });
        parts.join("")
    }

    /// Get the folder/file indicator.
    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        match (self.use_icons, item.kind, item.is_expanded) {
            (true, NodeKind::Folder, true) => " ",
            (true, NodeKind::Folder, false) => " ",
            (true, NodeKind::File, _) => Self::file_icon_by_ext(&item.label),
            (false, NodeKind::Folder, true) => "[-] ",
            (false, NodeKind::Folder, false) => "[+] ",
            (false, NodeKind::File, _) => "    ",
        }
    }

    /// Get a Nerd Font icon for a file based on its extension.
    fn file_icon_by_ext(name: &str) -> &'static str {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "js" | "jsx" | "mjs" | "cjs" => " ",
            "ts" | "tsx" => " ",
            "vue" => " ",
            "md" | "markdown" => " ",
            "json" => " ",
            "css" | "scss" | "sass" => " ",
            "html" | "htm" => " ",
            "rs" => " ",
            "py" => " ",
            _ => " ",
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.items.is_empty() || visible_height == 0 {
            return;
        }

        let visible_items = self
            .items
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (idx, item)) in visible_items.enumerate() {
            let y = inner_area.y + i as u16;

            let prefix = Self::build_prefix(item, self.items, idx);
            let indicator = self.item_indicator(item);

            let style = if idx == self.selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                match item.kind {
                    NodeKind::Folder => Style::default()
                        .fg(self.theme.tree_dir_fg)
                        .add_modifier(Modifier::BOLD),
                    NodeKind::File => Style::default().fg(self.theme.tree_file_fg),
                }
            };

            let line_content = format!("{}{}{}", prefix, indicator, item.label);
            let line = Line::from(Span::styled(line_content, style));
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
