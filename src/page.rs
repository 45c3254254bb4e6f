//! Grid configuration of the catalog page.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::grid::{ExpandedRow, GridColumn, GridExpander, GridHeader, GridRows, GridTable};
use crate::renderers::{ActionButton, BoldText, ImageRenderer, LinkList, PlainText};
use crate::table::{CellValue, RowId, TableData};
use crate::theme::ThemeChoice;

pub const PAGE_TITLE: &str = "Anime Free Downloader";
pub const SORTABLE_COLUMNS: [&str; 1] = ["Title"];
/// Catalog column holding the id used to look up episodes.
pub const ID_COLUMN: &str = "Actions";

pub fn catalog_header<'a>() -> GridHeader<'a> {
    GridHeader::default().sticky(true)
}

/// Column set of the catalog grid. The expanded row shows its details and the
/// given episode list.
pub fn catalog_rows<'a>(
    expanded: Option<RowId>,
    episodes: Option<&'a TableData>,
    theme: ThemeChoice,
) -> GridRows<'a> {
    GridRows::default()
        .column("Image", GridColumn::new().renderer(ImageRenderer))
        .column("Title", GridColumn::new().renderer(BoldText).sortable(true))
        .column("Synopsis", GridColumn::new().renderer(PlainText))
        .column("Actions", GridColumn::new().renderer(ActionButton))
        .expander(
            GridExpander::default()
                .renderer(move |row: &ExpandedRow<'_>| expanded_panel(row, episodes, theme))
                .row_id(expanded),
        )
}

pub fn episode_rows<'a>() -> GridRows<'a> {
    GridRows::default()
        .column("Episode", GridColumn::new().renderer(BoldText).sortable(true))
        .column("Downloads", GridColumn::new().renderer(LinkList))
}

/// Greedy word wrap on character counts. Words longer than `width` get a line
/// of their own.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn field(lines: &mut Vec<Line<'static>>, label: &str, value: Option<&CellValue>, width: u16) {
    lines.push(Line::from(Span::styled(
        label.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let text = value.map(|v| v.to_string()).unwrap_or_default();
    for line in wrap_words(&text, usize::from(width)) {
        lines.push(Line::from(line));
    }
}

fn expanded_panel(
    row: &ExpandedRow<'_>,
    episodes: Option<&TableData>,
    theme: ThemeChoice,
) -> Text<'static> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Expanded row: {}", row.row_id),
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::default(),
    ];
    field(&mut lines, "Title", row.get("Title"), row.width);
    field(&mut lines, "Synopsis", row.get("Synopsis"), row.width);
    lines.push(Line::default());

    match episodes {
        Some(table) if !table.is_empty() => {
            let header = catalog_header();
            let rows = episode_rows();
            // Episode lists are always striped, in the page's theme.
            let nested_theme = ThemeChoice {
                striped: true,
                ..theme
            }
            .resolve();
            let grid = GridTable::<()>::new(table)
                .header(&header)
                .rows(&rows)
                .theme(&nested_theme)
                .render_to_text(row.width);
            lines.extend(grid.lines);
        }
        _ => lines.push(Line::from(Span::styled(
            "No episodes found",
            Style::default().add_modifier(Modifier::ITALIC),
        ))),
    }
    Text::from(lines)
}
