use std::collections::HashMap;

use derive_setters::Setters;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::StatefulWidget;
use tracing::trace;

use crate::table::{CellValue, RowId, SortDirection, SortState, TableData};
use crate::theme::{BoxSizing, GridTheme, LightTheme, Style, Width};

pub const DEFAULT_MIN_TRACK_WIDTH: u16 = 10;
pub const TRACK_GAP: u16 = 1;

static DEFAULT_THEME: LightTheme = LightTheme { striped: false };
static IDLE_SORT: SortState = SortState {
    column: None,
    direction: SortDirection::Ascending,
};

/// Render scoped information about one body cell.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub row_id: RowId,
    pub column_index: usize,
    pub column_name: &'a str,
    /// Position of the row in the rendered (sorted and filtered) view.
    pub view_position: usize,
    pub value: &'a CellValue,
}

/// Renders the content of a body cell.
///
/// Renderers may assume the value type they were registered for; what happens
/// with other values is up to the renderer.
pub trait CellRenderer {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static>;
}

impl<F> CellRenderer for F
where
    F: Fn(&CellContext<'_>) -> Text<'static>,
{
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        self(ctx)
    }
}

/// The row handed to an expander renderer.
#[derive(Debug, Clone)]
pub struct ExpandedRow<'a> {
    pub row_id: RowId,
    /// Columns available to the panel content.
    pub width: u16,
    pub columns: Vec<&'a str>,
    pub values: Vec<&'a CellValue>,
}

impl<'a> ExpandedRow<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.columns
            .iter()
            .position(|&c| c == column)
            .map(|idx| self.values[idx])
    }
}

pub trait ExpanderRenderer {
    fn render(&self, row: &ExpandedRow<'_>) -> Text<'static>;
}

impl<F> ExpanderRenderer for F
where
    F: Fn(&ExpandedRow<'_>) -> Text<'static>,
{
    fn render(&self, row: &ExpandedRow<'_>) -> Text<'static> {
        self(row)
    }
}

pub type HeaderStyleFn<'a> = Box<dyn Fn(bool) -> Style + 'a>;
pub type CellStyleFn<'a> = Box<dyn Fn(&CellContext<'_>) -> Style + 'a>;
pub type ExpanderStyleFn<'a> = Box<dyn Fn(RowId) -> Style + 'a>;

#[derive(Default, Setters)]
pub struct GridHeader<'a> {
    pub sticky: bool,
    #[setters(skip)]
    pub style: Option<HeaderStyleFn<'a>>,
}

impl<'a> GridHeader<'a> {
    pub fn style(mut self, style: impl Fn(bool) -> Style + 'a) -> Self {
        self.style = Some(Box::new(style));
        self
    }
}

#[derive(Default, Setters)]
pub struct GridColumn<'a> {
    #[setters(skip)]
    pub renderer: Option<Box<dyn CellRenderer + 'a>>,
    pub sortable: bool,
    #[setters(skip)]
    pub style: Option<CellStyleFn<'a>>,
}

impl<'a> GridColumn<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renderer(mut self, renderer: impl CellRenderer + 'a) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn style(mut self, style: impl Fn(&CellContext<'_>) -> Style + 'a) -> Self {
        self.style = Some(Box::new(style));
        self
    }
}

/// Expanded detail panel. Only the row with `row_id` shows it.
#[derive(Default, Setters)]
pub struct GridExpander<'a> {
    #[setters(skip)]
    pub renderer: Option<Box<dyn ExpanderRenderer + 'a>>,
    pub row_id: Option<RowId>,
    #[setters(skip)]
    pub style: Option<ExpanderStyleFn<'a>>,
}

impl<'a> GridExpander<'a> {
    pub fn renderer(mut self, renderer: impl ExpanderRenderer + 'a) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn style(mut self, style: impl Fn(RowId) -> Style + 'a) -> Self {
        self.style = Some(Box::new(style));
        self
    }
}

#[derive(Default)]
pub struct GridRows<'a> {
    pub columns: HashMap<String, GridColumn<'a>>,
    pub expander: GridExpander<'a>,
    pub style: Option<CellStyleFn<'a>>,
}

impl<'a> GridRows<'a> {
    pub fn column(mut self, name: impl Into<String>, column: GridColumn<'a>) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn expander(mut self, expander: GridExpander<'a>) -> Self {
        self.expander = expander;
        self
    }

    pub fn style(mut self, style: impl Fn(&CellContext<'_>) -> Style + 'a) -> Self {
        self.style = Some(Box::new(style));
        self
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        self.columns.get(column).is_some_and(|c| c.sortable)
    }
}

/// Emitted by a click on a sortable header. `direction` is the direction to
/// apply next, not the one currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortRequest {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellClick {
    pub row_id: RowId,
    pub column_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIcon {
    Up,
    Down,
}

impl SortIcon {
    /// Icon of a sortable column. Idle columns show the ascending arrow.
    pub fn for_column(column: &str, sort: &SortState) -> Self {
        if sort.is_sorted_by(column) && sort.direction == SortDirection::Descending {
            SortIcon::Down
        } else {
            SortIcon::Up
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            SortIcon::Up => "↑",
            SortIcon::Down => "↓",
        }
    }
}

/// Header style: the header override if set, else the theme. Sticky is forced
/// on regardless of the source.
pub fn header_style(theme: &dyn GridTheme, header: &GridHeader<'_>, sortable: bool) -> Style {
    let mut style = match &header.style {
        Some(style_fn) => style_fn(sortable),
        None => theme.header(sortable),
    };
    if header.sticky {
        style.sticky = true;
    }
    style
}

/// Cell style: column override, then row override, then theme. The result
/// always fills the track with border-box sizing.
pub fn cell_style(
    theme: &dyn GridTheme,
    ctx: &CellContext<'_>,
    column: Option<&GridColumn<'_>>,
    row_style: Option<&CellStyleFn<'_>>,
) -> Style {
    let mut style = if let Some(style_fn) = column.and_then(|c| c.style.as_ref()) {
        style_fn(ctx)
    } else if let Some(style_fn) = row_style {
        style_fn(ctx)
    } else {
        theme.cell(ctx)
    };
    style.width = Some(Width::Full);
    style.box_sizing = Some(BoxSizing::BorderBox);
    style
}

/// Expander style: the expander override if set, else the theme. The panel
/// always spans every column.
pub fn expander_style(
    theme: &dyn GridTheme,
    row_id: RowId,
    column_span: u16,
    override_fn: Option<&ExpanderStyleFn<'_>>,
) -> Style {
    let mut style = match override_fn {
        Some(style_fn) => style_fn(row_id),
        None => theme.expander(row_id),
    };
    style.column_span = Some(column_span);
    style.width = Some(Width::Full);
    style
}

fn default_render(ctx: &CellContext<'_>) -> Text<'static> {
    Text::from(ctx.value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    pub x: u16,
    pub width: u16,
}

/// One track per column, sized like `minmax(min_width, 1fr)`: equal shares of
/// the width while each share is at least `min_width`, otherwise `min_width`
/// each and the overflow is clipped.
pub fn compute_tracks(width: u16, columns: usize, min_width: u16, gap: u16) -> Vec<Track> {
    if columns == 0 {
        return Vec::new();
    }
    let n = columns as u16;
    let available = width.saturating_sub(gap.saturating_mul(n - 1));
    let (base, remainder) = if available >= min_width.saturating_mul(n) {
        (available / n, available % n)
    } else {
        (min_width, 0)
    };

    let mut tracks = Vec::with_capacity(columns);
    let mut x: u16 = 0;
    for idx in 0..n {
        let width = base + u16::from(idx < remainder);
        tracks.push(Track { x, width });
        x = x.saturating_add(width).saturating_add(gap);
    }
    tracks
}

pub struct HeaderCell<M> {
    pub column_index: usize,
    pub name: String,
    pub sortable: bool,
    pub icon: Option<SortIcon>,
    pub icon_style: Option<Style>,
    pub style: Style,
    pub on_click: Option<M>,
}

impl<M> HeaderCell<M> {
    fn content(&self) -> Text<'static> {
        let mut spans = Vec::new();
        if let (Some(icon), Some(icon_style)) = (self.icon, &self.icon_style) {
            spans.push(Span::styled(icon.glyph(), icon_style.to_ratatui()));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::raw(self.name.clone()));
        Text::from(Line::from(spans))
    }
}

pub struct BodyCell<M> {
    pub column_index: usize,
    pub style: Style,
    pub content: Text<'static>,
    pub highlighted: bool,
    pub on_click: Option<M>,
}

pub struct ExpanderPanel {
    pub row_id: RowId,
    pub style: Style,
    pub content: Text<'static>,
}

pub struct BodyRow<M> {
    pub row_id: RowId,
    pub view_position: usize,
    pub cells: Vec<BodyCell<M>>,
    pub expander: Option<ExpanderPanel>,
}

/// Backend independent result of laying out a grid for a given width.
pub struct GridLayout<M> {
    pub tracks: Vec<Track>,
    pub header: Vec<HeaderCell<M>>,
    pub rows: Vec<BodyRow<M>>,
    /// Lines of the highlighted row's panel scrolled past the row's top.
    pub panel_scroll: u16,
}

fn block_height(style: &Style, content: &Text<'_>) -> u16 {
    let lines = u16::try_from(content.height()).unwrap_or(u16::MAX).max(1);
    lines.saturating_add(style.border.bottom_height())
}

impl<M> GridLayout<M> {
    pub fn header_height(&self) -> u16 {
        self.header
            .iter()
            .map(|h| 1 + h.style.border.bottom_height())
            .max()
            .unwrap_or(0)
    }

    pub fn sticky_header(&self) -> bool {
        self.header.iter().any(|h| h.style.sticky)
    }

    pub fn row_height(row: &BodyRow<M>) -> u16 {
        row.cells
            .iter()
            .map(|c| block_height(&c.style, &c.content))
            .max()
            .unwrap_or(1)
    }

    pub fn expander_height(row: &BodyRow<M>) -> u16 {
        row.expander
            .as_ref()
            .map(|p| block_height(&p.style, &p.content))
            .unwrap_or(0)
    }

    fn highlighted_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.cells.iter().any(|c| c.highlighted))
    }

    /// How far the highlighted row's expander panel can scroll before its last
    /// line reaches the bottom of an area `height` lines tall. Zero when the
    /// highlighted row is not expanded or its panel fits.
    pub fn panel_scroll_limit(&self, height: u16) -> u16 {
        let viewport = if self.sticky_header() {
            height.saturating_sub(self.header_height())
        } else {
            height
        };
        self.highlighted_row()
            .map(|idx| &self.rows[idx])
            .filter(|row| row.expander.is_some())
            .map(|row| {
                Self::row_height(row)
                    .saturating_add(Self::expander_height(row))
                    .saturating_sub(viewport)
            })
            .unwrap_or(0)
    }

    pub fn content_height(&self) -> u16 {
        self.rows.iter().fold(self.header_height(), |acc, row| {
            acc.saturating_add(Self::row_height(row))
                .saturating_add(Self::expander_height(row))
        })
    }

    /// Paints the layout into `area`, scrolling so the highlighted cell stays
    /// visible, and records a hit region for every clickable element. With a
    /// panel scroll the highlighted row's panel is scrolled into view instead.
    pub fn paint(self, area: Rect, buf: &mut Buffer, state: &mut GridViewState<M>) {
        state.hits.clear();
        let area = area.intersection(buf.area);
        if area.is_empty() || self.tracks.is_empty() {
            return;
        }

        let header_height = self.header_height();
        let sticky = self.sticky_header();
        let (header_area, body_area) = if sticky {
            let h = header_height.min(area.height);
            (
                Rect::new(area.x, area.y, area.width, h),
                Rect::new(area.x, area.y + h, area.width, area.height - h),
            )
        } else {
            (area, area)
        };

        // Row tops in body content coordinates.
        let body_start = if sticky { 0 } else { i32::from(header_height) };
        let mut tops = Vec::with_capacity(self.rows.len());
        let mut y = body_start;
        for row in self.rows.iter() {
            tops.push(y);
            y += i32::from(Self::row_height(row)) + i32::from(Self::expander_height(row));
        }
        let content_height = y;
        let viewport = i32::from(body_area.height);

        let mut offset = i32::from(state.offset);
        if let Some(ridx) = self.highlighted_row() {
            let row = &self.rows[ridx];
            let top = tops[ridx];
            let row_height = i32::from(Self::row_height(row));
            let block = row_height + i32::from(Self::expander_height(row));
            let scroll = if row.expander.is_some() {
                i32::from(self.panel_scroll).min((block - viewport).max(0))
            } else {
                0
            };
            let bottom = top + row_height;
            if scroll > 0 {
                offset = top + scroll;
            } else if top < offset {
                offset = top;
            } else if bottom > offset + viewport {
                offset = bottom - viewport;
            }
        }
        offset = offset.clamp(0, (content_height - viewport).max(0));
        state.offset = offset as u16;
        trace!(
            "Grid paint: {} rows, content {}, viewport {}, offset {}, sticky {}",
            self.rows.len(),
            content_height,
            viewport,
            offset,
            sticky
        );

        let tracks = self.tracks.clone();
        let (header_clip, header_top) = if sticky {
            (header_area, i32::from(header_area.y))
        } else {
            (body_area, i32::from(body_area.y) - offset)
        };
        for cell in self.header {
            let Some(track) = tracks.get(cell.column_index) else {
                continue;
            };
            let content = cell.content();
            let visible = paint_block(
                buf,
                header_clip,
                area.x.saturating_add(track.x),
                track.width,
                header_top,
                header_height,
                &cell.style,
                &content,
            );
            if let (Some(rect), Some(message)) = (visible, cell.on_click) {
                state.hits.push((rect, message));
            }
        }

        let full_span = tracks.len() as u16;
        let origin = i32::from(body_area.y) - offset;
        for (row, top) in self.rows.into_iter().zip(tops) {
            let row_height = Self::row_height(&row);
            let expander_height = Self::expander_height(&row);
            let screen_top = origin + top;
            if screen_top >= i32::from(body_area.bottom())
                || screen_top + i32::from(row_height.saturating_add(expander_height))
                    <= i32::from(body_area.y)
            {
                continue;
            }
            for cell in row.cells {
                let Some(track) = tracks.get(cell.column_index) else {
                    continue;
                };
                let visible = paint_block(
                    buf,
                    body_area,
                    area.x.saturating_add(track.x),
                    track.width,
                    screen_top,
                    row_height,
                    &cell.style,
                    &cell.content,
                );
                if let (Some(rect), Some(message)) = (visible, cell.on_click) {
                    state.hits.push((rect, message));
                }
            }
            if let Some(panel) = row.expander {
                let span = panel.style.column_span.unwrap_or(full_span);
                let first = tracks[0];
                let last = tracks[(span.max(1) as usize).min(tracks.len()) - 1];
                let width = (last.x + last.width).saturating_sub(first.x);
                paint_block(
                    buf,
                    body_area,
                    area.x.saturating_add(first.x),
                    width,
                    screen_top + i32::from(row_height),
                    expander_height,
                    &panel.style,
                    &panel.content,
                );
            }
        }
    }
}

/// Paints one cell-like block line by line, clipped to `clip`. Returns the
/// visible part of the block.
#[allow(clippy::too_many_arguments)]
fn paint_block(
    buf: &mut Buffer,
    clip: Rect,
    x: u16,
    width: u16,
    top: i32,
    height: u16,
    style: &Style,
    content: &Text<'_>,
) -> Option<Rect> {
    if x >= clip.right() {
        return None;
    }
    let base = style.to_ratatui();
    let left = style.border.left_width();
    let (content_x, content_width) = match style.box_sizing {
        Some(BoxSizing::ContentBox) => (x, width),
        _ => {
            let inset = left + style.padding;
            (x + inset, width.saturating_sub(inset + style.padding))
        }
    };
    let rule = style.border.bottom_height() > 0;

    let mut visible: Option<Rect> = None;
    for i in 0..height {
        let y = top + i32::from(i);
        if y < i32::from(clip.top()) || y >= i32::from(clip.bottom()) {
            continue;
        }
        let y = y as u16;
        let line_rect = Rect::new(x, y, width, 1).intersection(clip);
        if line_rect.is_empty() {
            continue;
        }
        visible = Some(visible.map_or(line_rect, |v| v.union(line_rect)));

        let line = content.lines.get(usize::from(i));
        let fill = if style.width == Some(Width::Full) {
            line_rect
        } else {
            let used = line.map(|l| l.width()).unwrap_or(0) as u16;
            Rect::new(content_x, y, used.min(content_width), 1).intersection(clip)
        };
        buf.set_style(fill, base);

        if rule && i == height - 1 {
            buf.set_string(
                line_rect.x,
                y,
                "─".repeat(usize::from(line_rect.width)),
                style.border_style(),
            );
            continue;
        }
        if left > 0 {
            buf.set_string(x, y, "│", style.border_style());
        }
        if let Some(line) = line
            && content_x < clip.right()
        {
            let max_width = content_width.min(clip.right() - content_x);
            buf.set_line(content_x, y, line, max_width);
        }
    }
    visible
}

/// Scroll position and click targets of a rendered grid.
pub struct GridViewState<M> {
    offset: u16,
    hits: Vec<(Rect, M)>,
}

impl<M> Default for GridViewState<M> {
    fn default() -> Self {
        Self {
            offset: 0,
            hits: Vec::new(),
        }
    }
}

impl<M> GridViewState<M> {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.hits.clear();
    }
}

impl<M: Clone> GridViewState<M> {
    /// Event bound to the terminal position, if any clickable element covers it.
    pub fn event_at(&self, column: u16, row: u16) -> Option<M> {
        let position = Position::new(column, row);
        self.hits
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(position))
            .map(|(_, message)| message.clone())
    }
}

/// Data grid widget. Clicks are reported through `on_sort` and
/// `on_cell_click`, which turn them into the caller's message type.
pub struct GridTable<'a, M> {
    data: &'a TableData,
    header: Option<&'a GridHeader<'a>>,
    rows: Option<&'a GridRows<'a>>,
    sort: &'a SortState,
    theme: &'a dyn GridTheme,
    on_sort: Option<Box<dyn Fn(SortRequest) -> M + 'a>>,
    on_cell_click: Option<Box<dyn Fn(CellClick) -> M + 'a>>,
    highlight: Option<CellClick>,
    panel_scroll: u16,
    min_track_width: u16,
}

impl<'a, M> GridTable<'a, M> {
    pub fn new(data: &'a TableData) -> Self {
        Self {
            data,
            header: None,
            rows: None,
            sort: &IDLE_SORT,
            theme: &DEFAULT_THEME,
            on_sort: None,
            on_cell_click: None,
            highlight: None,
            panel_scroll: 0,
            min_track_width: DEFAULT_MIN_TRACK_WIDTH,
        }
    }

    pub fn header(mut self, header: &'a GridHeader<'a>) -> Self {
        self.header = Some(header);
        self
    }

    pub fn rows(mut self, rows: &'a GridRows<'a>) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn sort(mut self, sort: &'a SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn theme(mut self, theme: &'a dyn GridTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn on_sort(mut self, on_sort: impl Fn(SortRequest) -> M + 'a) -> Self {
        self.on_sort = Some(Box::new(on_sort));
        self
    }

    pub fn on_cell_click(mut self, on_cell_click: impl Fn(CellClick) -> M + 'a) -> Self {
        self.on_cell_click = Some(Box::new(on_cell_click));
        self
    }

    pub fn highlight(mut self, cell: Option<CellClick>) -> Self {
        self.highlight = cell;
        self
    }

    /// Scrolls the expander panel of the highlighted row by `lines`.
    pub fn panel_scroll(mut self, lines: u16) -> Self {
        self.panel_scroll = lines;
        self
    }

    pub fn min_track_width(mut self, width: u16) -> Self {
        self.min_track_width = width;
        self
    }

    pub fn layout(&self, width: u16) -> GridLayout<M> {
        let default_header;
        let header = match self.header {
            Some(h) => h,
            None => {
                default_header = GridHeader::default();
                &default_header
            }
        };
        let default_rows;
        let rows = match self.rows {
            Some(r) => r,
            None => {
                default_rows = GridRows::default();
                &default_rows
            }
        };
        let theme = self.theme;
        let sort = self.sort;
        let names = self.data.column_names();
        let tracks = compute_tracks(width, names.len(), self.min_track_width, TRACK_GAP);

        let header_cells = names
            .iter()
            .enumerate()
            .map(|(column_index, &name)| {
                let sortable = rows.is_sortable(name);
                let on_click = match &self.on_sort {
                    Some(on_sort) if sortable => Some(on_sort(SortRequest {
                        column: name.to_string(),
                        direction: sort.next_direction(name),
                    })),
                    _ => None,
                };
                HeaderCell {
                    column_index,
                    name: name.to_string(),
                    sortable,
                    icon: sortable.then(|| SortIcon::for_column(name, sort)),
                    icon_style: sortable.then(|| theme.sort_icon(name, sort.column.as_deref())),
                    style: header_style(theme, header, sortable),
                    on_click,
                }
            })
            .collect();

        let ncols = names.len() as u16;
        let mut body = Vec::with_capacity(self.data.num_rows());
        for (view_position, &row_id) in self.data.row_ids().iter().enumerate() {
            let cells = self
                .data
                .columns()
                .iter()
                .enumerate()
                .map(|(column_index, column)| {
                    let ctx = CellContext {
                        row_id,
                        column_index,
                        column_name: column.name(),
                        view_position,
                        value: &column.values()[view_position],
                    };
                    let config = rows.columns.get(column.name());
                    let mut style = cell_style(theme, &ctx, config, rows.style.as_ref());
                    let click = CellClick {
                        row_id,
                        column_index,
                    };
                    let highlighted = self.highlight == Some(click);
                    if highlighted {
                        style.modifiers |= Modifier::REVERSED;
                    }
                    let content = match config.and_then(|c| c.renderer.as_ref()) {
                        Some(renderer) => renderer.render(&ctx),
                        None => default_render(&ctx),
                    };
                    BodyCell {
                        column_index,
                        style,
                        content,
                        highlighted,
                        on_click: self.on_cell_click.as_ref().map(|f| f(click)),
                    }
                })
                .collect();

            let expander = match (&rows.expander.renderer, rows.expander.row_id) {
                (Some(renderer), Some(expanded)) if expanded == row_id => {
                    let style =
                        expander_style(theme, row_id, ncols, rows.expander.style.as_ref());
                    let panel_width = tracks
                        .last()
                        .map(|t| t.x + t.width)
                        .unwrap_or(0);
                    let inner_width = panel_width
                        .saturating_sub(style.border.left_width() + 2 * style.padding);
                    let expanded_row = ExpandedRow {
                        row_id,
                        width: inner_width,
                        columns: names.clone(),
                        values: self
                            .data
                            .columns()
                            .iter()
                            .map(|c| &c.values()[view_position])
                            .collect(),
                    };
                    Some(ExpanderPanel {
                        row_id,
                        style,
                        content: renderer.render(&expanded_row),
                    })
                }
                _ => None,
            };

            body.push(BodyRow {
                row_id,
                view_position,
                cells,
                expander,
            });
        }

        GridLayout {
            tracks,
            header: header_cells,
            rows: body,
            panel_scroll: self.panel_scroll,
        }
    }

    /// Paints the whole grid off screen and returns it as styled text, e.g.
    /// to nest a grid inside an expander panel.
    pub fn render_to_text(self, width: u16) -> Text<'static> {
        let layout = self.layout(width);
        let height = layout.content_height();
        if width == 0 || height == 0 {
            return Text::default();
        }
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        let mut state = GridViewState::default();
        layout.paint(area, &mut buf, &mut state);
        buffer_to_text(&buf)
    }
}

impl<M> StatefulWidget for GridTable<'_, M> {
    type State = GridViewState<M>;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        self.layout(area.width).paint(area, buf, state);
    }
}

/// Converts a painted buffer back into styled lines.
pub fn buffer_to_text(buf: &Buffer) -> Text<'static> {
    let area = buf.area;
    let mut lines = Vec::with_capacity(usize::from(area.height));
    for y in area.top()..area.bottom() {
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut skip = 0;
        for x in area.left()..area.right() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            let cell = &buf[(x, y)];
            let symbol = cell.symbol();
            skip = Span::raw(symbol).width().saturating_sub(1);
            let style = cell.style();
            match spans.last_mut() {
                Some(last) if last.style == style => last.content.to_mut().push_str(symbol),
                _ => spans.push(Span::styled(symbol.to_string(), style)),
            }
        }
        lines.push(Line::from(spans));
    }
    Text::from(lines)
}
