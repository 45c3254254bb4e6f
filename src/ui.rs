use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

use crate::domain::{CMDMode, Message};
use crate::grid::{GridTable, GridViewState};
use crate::model::Model;
use crate::page::{PAGE_TITLE, catalog_header, catalog_rows};
use crate::theme::ThemeKind;

// Status messages older than this are dimmed.
const STATUS_FADE: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct TableUI {
    grid: GridViewState<Message>,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Click targets of the last drawn grid.
    pub fn hits(&self) -> &GridViewState<Message> {
        &self.grid
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let [title_area, info_area, grid_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Line::from(PAGE_TITLE.bold().fg(Color::Green)).centered(),
            title_area,
        );
        self.draw_info(model, frame, info_area);
        self.draw_grid(model, frame, grid_area);
        self.draw_status(model, frame, status_area);

        if let Some(message) = model.popup_message() {
            Self::draw_popup(message, frame);
        }
    }

    fn draw_info(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let state = model.grid_state();
        let theme = match state.theme.kind {
            ThemeKind::Light => "light",
            ThemeKind::Dark => "dark",
        };
        let label = Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD);
        let info = Line::from(vec![
            Span::styled(" search ", label),
            Span::raw(format!("\"{}\"", model.query())),
            Span::styled("  filter ", label),
            Span::raw(format!("{} ~ \"{}\"", state.filter.column, state.filter.text)),
            Span::styled("  rows ", label),
            Span::raw(format!("{}/{}", model.view().num_rows(), model.catalog_size())),
            Span::styled("  theme ", label),
            Span::raw(format!(
                "{theme}{}",
                if state.theme.striped { ", striped" } else { "" }
            )),
        ]);
        frame.render_widget(info, area);
    }

    fn draw_grid(&mut self, model: &Model, frame: &mut Frame, area: Rect) {
        let state = model.grid_state();
        let theme = state.theme.resolve();
        let header = catalog_header();
        let rows = catalog_rows(
            state.expansion.expanded,
            model.expanded_episodes(),
            state.theme,
        );

        let block = Block::bordered()
            .border_set(border::ROUNDED)
            .title(Line::from(" Catalog ").bold())
            .title_bottom(Line::from(" ? help ").right_aligned());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let grid = GridTable::new(model.view())
            .header(&header)
            .rows(&rows)
            .sort(&state.sort)
            .theme(&theme)
            .on_sort(Message::GridSort)
            .on_cell_click(Message::GridCellClick)
            .highlight(model.cursor_cell())
            .panel_scroll(model.panel_scroll())
            .min_track_width(model.min_column_width());
        frame.render_stateful_widget(grid, inner, &mut self.grid);
    }

    fn draw_status(&self, model: &Model, frame: &mut Frame, area: Rect) {
        if let Some((mode, input)) = model.cmd_input() {
            let prompt = match mode {
                CMDMode::Filter => "/",
                CMDMode::Search => ":",
            };
            let line = Line::from(vec![
                Span::styled(prompt, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(input.input.clone()),
            ]);
            frame.render_widget(line, area);
            let x = area.x + 1 + input.cursor as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let style = if model.status_message_age() > STATUS_FADE {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default()
        };
        frame.render_widget(
            Line::from(Span::styled(model.status_message().to_string(), style)),
            area,
        );
    }

    fn draw_popup(message: &str, frame: &mut Frame) {
        let height = message.lines().count() as u16 + 2;
        let width = message.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(frame.area());
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);

        let popup = Paragraph::new(message.to_string()).block(
            Block::bordered()
                .title(Line::from(" Help ").bold())
                .border_set(border::THICK),
        );
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}
