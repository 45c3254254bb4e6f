use std::collections::HashMap;
use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace, warn};

use crate::domain::{AppConfig, CMDMode, GridError, HELP_TEXT, Message};
use crate::grid::{CellClick, GridTable, SortRequest};
use crate::inputter::{InputResult, Inputter};
use crate::page::{ID_COLUMN, SORTABLE_COLUMNS, catalog_header, catalog_rows};
use crate::source::{CATALOG_COLUMNS, CatalogSource, EPISODE_COLUMNS, RetryPolicy, search_catalog};
use crate::state::{ExpansionState, GridState, InteractionEvent};
use crate::table::{CellValue, RowId, TableData, sorted_and_filtered};
use crate::theme::ThemeChoice;

// Lines above and below the grid: title, filter line, status line, borders.
const CHROME_HEIGHT: usize = 6;
// Lines taken by one body row: content and its rule.
const ROW_HEIGHT: usize = 2;
// Columns and lines around the grid body: borders, title, filter and status line.
const GRID_CHROME_WIDTH: u16 = 2;
const GRID_CHROME_HEIGHT: u16 = 5;
// Panel lines scrolled per wheel step.
const WHEEL_STEP: i32 = 3;

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modus {
    Table,
    Popup,
    CmdInput,
}

pub struct Model {
    config: AppConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    source: Box<dyn CatalogSource>,
    retry: RetryPolicy,
    query: String,
    catalog: TableData,
    grid: GridState,
    view: TableData,
    cursor_row: usize,
    cursor_column: usize,
    page_size: usize,
    grid_size: (u16, u16),
    panel_scroll: u16,
    episodes: HashMap<String, TableData>,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    popup_message: Option<String>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &AppConfig, source: Box<dyn CatalogSource>) -> Self {
        let retry = RetryPolicy::default()
            .attempts(config.retry_attempts)
            .delay(config.retry_delay);
        let mut model = Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            source,
            retry,
            query: String::new(),
            catalog: TableData::empty(&CATALOG_COLUMNS),
            grid: GridState::new(config.filter_column.clone(), config.theme),
            view: TableData::empty(&CATALOG_COLUMNS),
            cursor_row: 0,
            cursor_column: 0,
            page_size: 10,
            grid_size: (78, 19),
            panel_scroll: 0,
            episodes: HashMap::new(),
            clipboard: None,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            popup_message: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.search("");
        model
    }

    // -------------------- Accessors for the UI ---------------------- //

    pub fn view(&self) -> &TableData {
        &self.view
    }

    pub fn grid_state(&self) -> &GridState {
        &self.grid
    }

    pub fn theme(&self) -> ThemeChoice {
        self.grid.theme
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn catalog_size(&self) -> usize {
        self.catalog.num_rows()
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn cmd_input(&self) -> Option<(CMDMode, &InputResult)> {
        match (self.modus, self.cmd_mode) {
            (Modus::CmdInput, Some(mode)) => Some((mode, &self.last_input)),
            _ => None,
        }
    }

    pub fn popup_message(&self) -> Option<&str> {
        self.popup_message.as_deref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn min_column_width(&self) -> u16 {
        self.config.min_column_width
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CmdInput
    }

    /// The cell under the keyboard cursor.
    pub fn cursor_cell(&self) -> Option<CellClick> {
        self.view.row_ids().get(self.cursor_row).map(|&row_id| CellClick {
            row_id,
            column_index: self.cursor_column,
        })
    }

    /// Lines the expanded panel under the cursor row is scrolled by.
    pub fn panel_scroll(&self) -> u16 {
        self.panel_scroll
    }

    /// Episode list of the expanded row, once it was fetched.
    pub fn expanded_episodes(&self) -> Option<&TableData> {
        let row_id = self.grid.expansion.expanded?;
        let anime_id = self.anime_id(row_id)?;
        self.episodes.get(&anime_id)
    }

    // -------------------- Update ---------------------- //

    pub fn update(&mut self, message: Message) -> Result<(), GridError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        let focus = self.panel_focus();
        self.dispatch(message);
        if self.panel_focus() != focus {
            self.panel_scroll = 0;
        }
        Ok(())
    }

    // Cursor row and expanded row; the panel scroll belongs to this pair.
    fn panel_focus(&self) -> (Option<RowId>, Option<RowId>) {
        (
            self.cursor_cell().map(|c| c.row_id),
            self.grid.expansion.expanded,
        )
    }

    fn dispatch(&mut self, message: Message) {
        match self.modus {
            Modus::Table => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(1),
                Message::MoveDown => self.move_selection_down(1),
                Message::MovePageUp => {
                    if !self.scroll_panel(-self.panel_page()) {
                        self.move_selection_up(self.page_size)
                    }
                }
                Message::MovePageDown => {
                    if !self.scroll_panel(self.panel_page()) {
                        self.move_selection_down(self.page_size)
                    }
                }
                Message::ScrollUp => {
                    if !self.scroll_panel(-WHEEL_STEP) {
                        self.move_selection_up(1)
                    }
                }
                Message::ScrollDown => {
                    if !self.scroll_panel(WHEEL_STEP) {
                        self.move_selection_down(1)
                    }
                }
                Message::MoveBeginning => self.cursor_row = 0,
                Message::MoveEnd => self.cursor_row = self.view.num_rows().saturating_sub(1),
                Message::MoveLeft => self.cursor_column = self.cursor_column.saturating_sub(1),
                Message::MoveRight => {
                    self.cursor_column =
                        (self.cursor_column + 1).min(self.view.num_columns().saturating_sub(1))
                }
                Message::SortColumn => self.sort_current_column(),
                Message::ToggleExpand => {
                    if let Some(cell) = self.cursor_cell() {
                        self.toggle_expansion(cell.row_id);
                    }
                }
                Message::CopyCell => self.copy_cell(),
                Message::CopyLinks => self.copy_links(),
                Message::Help => self.show_help(),
                Message::Filter => self.enter_cmd_mode(CMDMode::Filter),
                Message::Search => self.enter_cmd_mode(CMDMode::Search),
                Message::ToggleTheme => {
                    let theme = ThemeChoice {
                        kind: self.grid.theme.kind.toggled(),
                        ..self.grid.theme
                    };
                    self.apply(InteractionEvent::ThemeSelected(theme));
                }
                Message::ToggleStripes => {
                    let theme = ThemeChoice {
                        striped: !self.grid.theme.striped,
                        ..self.grid.theme
                    };
                    self.apply(InteractionEvent::ThemeSelected(theme));
                }
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::GridSort(request) => self.sort_by_request(request),
                Message::GridCellClick(click) => self.cell_clicked(click),
                Message::Exit => self.exit(),
                Message::RawKey(_) => (),
            },
            Modus::Popup => match message {
                Message::Quit => self.quit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::Help => self.exit(),
                _ => (),
            },
            Modus::CmdInput => match message {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
    }

    fn quit(&mut self) {
        info!("Quitting");
        self.status = Status::Quitting;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        debug!("Status: {}", self.status_message);
    }

    pub fn status_message_age(&self) -> std::time::Duration {
        self.last_status_message_update.elapsed()
    }

    fn ui_resize(&mut self, width: u16, height: u16) {
        trace!("UI was resized to w:{width}, h:{height}");
        self.page_size = (usize::from(height).saturating_sub(CHROME_HEIGHT) / ROW_HEIGHT).max(1);
        self.grid_size = (
            width.saturating_sub(GRID_CHROME_WIDTH),
            height.saturating_sub(GRID_CHROME_HEIGHT),
        );
    }

    // Panel lines per page, keeping one line of the previous page.
    fn panel_page(&self) -> i32 {
        (i32::from(self.grid_size.1) - 3).max(1)
    }

    /// How far the panel under the cursor row can scroll, laid out the way the
    /// ui draws the grid.
    fn panel_scroll_limit(&self) -> u16 {
        let (width, height) = self.grid_size;
        let theme = self.grid.theme.resolve();
        let header = catalog_header();
        let rows = catalog_rows(
            self.grid.expansion.expanded,
            self.expanded_episodes(),
            self.grid.theme,
        );
        GridTable::<()>::new(&self.view)
            .header(&header)
            .rows(&rows)
            .sort(&self.grid.sort)
            .theme(&theme)
            .highlight(self.cursor_cell())
            .min_track_width(self.config.min_column_width)
            .layout(width)
            .panel_scroll_limit(height)
    }

    /// Scrolls the expanded panel under the cursor row. Returns false when
    /// there is no such panel or it is already at the end in that direction.
    fn scroll_panel(&mut self, lines: i32) -> bool {
        let Some(cell) = self.cursor_cell() else {
            return false;
        };
        if self.grid.expansion.expanded != Some(cell.row_id) {
            return false;
        }
        let limit = i32::from(self.panel_scroll_limit());
        let target = (i32::from(self.panel_scroll) + lines).clamp(0, limit) as u16;
        if target == self.panel_scroll {
            return false;
        }
        trace!("Panel scroll {} -> {}", self.panel_scroll, target);
        self.panel_scroll = target;
        true
    }

    /// Applies an interaction event and re-derives the view. When the view
    /// cannot be derived the event is rolled back.
    fn apply(&mut self, event: InteractionEvent) {
        let previous = self.grid.clone();
        self.grid = previous.clone().update(event);
        if let Err(e) = self.refresh_view() {
            warn!("Keeping previous view: {e}");
            self.grid = previous;
            self.set_status_message(format!("Error: {e}"));
        }
    }

    fn refresh_view(&mut self) -> Result<(), GridError> {
        let selected = self.cursor_cell().map(|c| c.row_id);
        self.view = sorted_and_filtered(&self.catalog, &self.grid.sort, &self.grid.filter)?;
        self.cursor_row = selected
            .and_then(|id| self.view.position_of(id))
            .unwrap_or(self.cursor_row)
            .min(self.view.num_rows().saturating_sub(1));
        self.cursor_column = self
            .cursor_column
            .min(self.view.num_columns().saturating_sub(1));
        Ok(())
    }

    fn search(&mut self, query: &str) {
        let start_time = Instant::now();
        self.query = query.trim().to_string();
        match search_catalog(self.source.as_ref(), &self.query, &self.retry) {
            Ok(catalog) => {
                self.catalog = catalog;
                self.set_status_message(format!(
                    "Found {} titles in {}ms",
                    self.catalog.num_rows(),
                    start_time.elapsed().as_millis()
                ));
            }
            Err(e) => {
                warn!("Search for \"{}\" failed: {e}", self.query);
                self.catalog = TableData::empty(&CATALOG_COLUMNS);
                self.set_status_message(format!("No results for \"{}\": {e}", self.query));
            }
        }
        // Row ids belong to the previous dataset.
        self.grid.expansion = ExpansionState::default();
        self.cursor_row = 0;
        if let Err(e) = self.refresh_view() {
            self.set_status_message(format!("Error: {e}"));
            self.view = self.catalog.clone();
        }
    }

    // -------------------- Table actions ---------------------- //

    fn current_column_name(&self) -> Option<String> {
        self.view
            .column_names()
            .get(self.cursor_column)
            .map(|s| s.to_string())
    }

    fn sort_current_column(&mut self) {
        let Some(column) = self.current_column_name() else {
            return;
        };
        if SORTABLE_COLUMNS.contains(&column.as_str()) {
            self.apply(InteractionEvent::HeaderClicked(column));
        } else {
            self.set_status_message(format!("Column \"{column}\" is not sortable"));
        }
    }

    fn sort_by_request(&mut self, request: SortRequest) {
        if !SORTABLE_COLUMNS.contains(&request.column.as_str()) {
            return;
        }
        trace!("Sort request {:?}", request);
        self.apply(InteractionEvent::HeaderClicked(request.column));
    }

    fn cell_clicked(&mut self, click: CellClick) {
        if let Some(position) = self.view.position_of(click.row_id) {
            self.cursor_row = position;
            self.cursor_column = click.column_index;
        }
        self.toggle_expansion(click.row_id);
    }

    fn anime_id(&self, row_id: RowId) -> Option<String> {
        let column = self.view.column_index(ID_COLUMN)?;
        let values = self.view.row(row_id)?;
        values.get(column).map(|v| v.to_string())
    }

    fn toggle_expansion(&mut self, row_id: RowId) {
        self.apply(InteractionEvent::CellClicked(row_id));
        if self.grid.expansion.expanded == Some(row_id) {
            self.load_episodes(row_id);
        }
    }

    fn load_episodes(&mut self, row_id: RowId) {
        let Some(anime_id) = self.anime_id(row_id) else {
            return;
        };
        if self.episodes.contains_key(&anime_id) {
            return;
        }
        let episodes = match self.source.episodes(&anime_id) {
            Ok(table) => {
                self.set_status_message(format!(
                    "{} episodes for {anime_id}",
                    table.num_rows()
                ));
                table
            }
            Err(e) => {
                debug!("No episodes for {anime_id}: {e}");
                self.set_status_message(format!("No episodes for {anime_id}"));
                TableData::empty(&EPISODE_COLUMNS)
            }
        };
        self.episodes.insert(anime_id, episodes);
    }

    /// Text the copy action puts on the clipboard.
    pub fn cell_text_at_cursor(&self) -> Option<String> {
        self.view
            .value(self.cursor_row, self.cursor_column)
            .map(copy_text)
    }

    /// Download URLs of the expanded row's episodes, one per line.
    pub fn episode_links_text(&self) -> Option<String> {
        let episodes = self.expanded_episodes()?;
        let urls: Vec<String> = episodes
            .column(EPISODE_COLUMNS[1])
            .ok()?
            .values()
            .iter()
            .filter(|v| !v.is_null())
            .map(copy_text)
            .filter(|text| !text.is_empty())
            .collect();
        (!urls.is_empty()).then(|| urls.join("\n"))
    }

    fn copy_cell(&mut self) {
        let Some(text) = self.cell_text_at_cursor() else {
            return;
        };
        trace!("Cell content: {}", text);
        self.copy_to_clipboard(text, "Copied cell to clipboard");
    }

    fn copy_links(&mut self) {
        match self.episode_links_text() {
            Some(text) => {
                let count = text.lines().count();
                self.copy_to_clipboard(text, &format!("Copied {count} links to clipboard"));
            }
            None => self.set_status_message("No open row with download links"),
        }
    }

    fn copy_to_clipboard(&mut self, text: String, done: &str) {
        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new()
                .inspect_err(|e| warn!("Clipboard unavailable: {e:?}"))
                .ok();
        }
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(text).map_err(|e| e.to_string()),
            None => Err("no clipboard".to_string()),
        };
        match result {
            Ok(_) => self.set_status_message(done),
            Err(e) => self.set_status_message(format!("Copy failed: {e}")),
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        self.cursor_row = self.cursor_row.saturating_sub(size);
    }

    fn move_selection_down(&mut self, size: usize) {
        let last = self.view.num_rows().saturating_sub(1);
        self.cursor_row = (self.cursor_row + size).min(last);
    }

    // -------------------- Modus handling ---------------------- //

    fn exit(&mut self) {
        match self.modus {
            Modus::Table => {
                if let Some(expanded) = self.grid.expansion.expanded {
                    self.apply(InteractionEvent::CellClicked(expanded));
                } else if self.grid.filter.is_active() {
                    self.apply(InteractionEvent::FilterCommitted(String::new()));
                    self.set_status_message("Filter cleared");
                }
            }
            Modus::Popup => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::Popup;
                self.popup_message = None;
            }
            Modus::CmdInput => {}
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
        self.popup_message = Some(HELP_TEXT.to_string());
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {:?}", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CmdInput;
        self.cmd_mode = Some(mode);
        let prefill = match mode {
            CMDMode::Filter => self.grid.filter.text.clone(),
            CMDMode::Search => self.query.clone(),
        };
        self.input.start(&prefill);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CmdInput;

        let cmd_input = self.last_input.input.clone();
        let mode = self.cmd_mode.take();
        if self.last_input.canceled {
            return;
        }
        match mode {
            Some(CMDMode::Filter) => {
                self.apply(InteractionEvent::FilterCommitted(cmd_input));
            }
            Some(CMDMode::Search) => self.search(&cmd_input),
            None => info!("Cmd mode is none!"),
        }
    }
}

/// Clipboard text of a value. Link lists copy their URLs, one per line.
fn copy_text(value: &CellValue) -> String {
    match value {
        CellValue::Links(links) => links
            .iter()
            .map(|l| l.url.as_str())
            .collect::<Vec<&str>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::source::FileCatalog;
    use crate::table::{DownloadLink, FilterState, SortDirection, SortState};
    use crate::theme::ThemeKind;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn source() -> Box<dyn CatalogSource> {
        let raw = TableData::new(vec![
            ("id", vec![1i64.into(), 2i64.into(), 3i64.into(), 4i64.into()]),
            (
                "title",
                vec![
                    "Naruto".into(),
                    "Bleach".into(),
                    "Naruto Shippuden".into(),
                    "One Piece".into(),
                ],
            ),
            (
                "synopsis",
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ),
            ("poster", vec![CellValue::Null; 4]),
        ])
        .unwrap();
        let episodes = TableData::new(vec![
            ("anime_id", vec![1i64.into(), 1i64.into()]),
            ("episode", vec![1i64.into(), 2i64.into()]),
            ("server", vec!["MEGA".into(), "Stape".into()]),
            ("url", vec!["u1".into(), "u2".into()]),
        ])
        .unwrap();
        Box::new(FileCatalog::from_tables(&raw, Some(&episodes)).unwrap())
    }

    fn config() -> AppConfig {
        AppConfig::default()
            .retry_attempts(1)
            .retry_delay(Duration::ZERO)
    }

    fn model() -> Model {
        Model::init(&config(), source())
    }

    fn titles(model: &Model) -> Vec<String> {
        model
            .view()
            .column("Title")
            .unwrap()
            .values()
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    fn type_command(model: &mut Model, start: Message, text: &str) {
        model.update(start).unwrap();
        for chr in text.chars() {
            model
                .update(Message::RawKey(KeyEvent::new(KeyCode::Char(chr), KeyModifiers::NONE)))
                .unwrap();
        }
        model
            .update(Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
            .unwrap();
    }

    #[test]
    fn starts_with_the_whole_catalog() {
        let model = model();
        assert_eq!(model.view().num_rows(), 4);
        assert_eq!(model.catalog_size(), 4);
        assert_eq!(model.grid_state().sort, SortState::default());
        assert!(model.status_message().starts_with("Found 4 titles"));
    }

    #[test]
    fn sorts_the_title_column_and_toggles() {
        let mut model = model();
        model.update(Message::MoveRight).unwrap();
        model.update(Message::SortColumn).unwrap();
        assert_eq!(
            titles(&model),
            vec!["Bleach", "Naruto", "Naruto Shippuden", "One Piece"]
        );
        model.update(Message::SortColumn).unwrap();
        assert_eq!(
            model.grid_state().sort,
            SortState::by("Title", SortDirection::Descending)
        );
        assert_eq!(titles(&model)[0], "One Piece");
    }

    #[test]
    fn other_columns_are_not_sortable() {
        let mut model = model();
        model.update(Message::SortColumn).unwrap();
        assert_eq!(model.grid_state().sort, SortState::default());
        assert!(model.status_message().contains("not sortable"));

        model
            .update(Message::GridSort(SortRequest {
                column: "Synopsis".to_string(),
                direction: SortDirection::Ascending,
            }))
            .unwrap();
        assert_eq!(model.grid_state().sort, SortState::default());
    }

    #[test]
    fn header_click_sorts() {
        let mut model = model();
        model
            .update(Message::GridSort(SortRequest {
                column: "Title".to_string(),
                direction: SortDirection::Ascending,
            }))
            .unwrap();
        assert_eq!(titles(&model)[0], "Bleach");
    }

    #[test]
    fn cursor_follows_its_row_through_a_sort() {
        let mut model = model();
        model.update(Message::MoveDown).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(1));
        model.update(Message::MoveRight).unwrap();
        model.update(Message::SortColumn).unwrap();
        // Bleach moved to the top.
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(1));
        assert_eq!(model.cursor_cell().unwrap().column_index, 1);
        assert_eq!(titles(&model)[0], "Bleach");
    }

    #[test]
    fn filter_is_committed_on_enter() {
        let mut model = model();
        model.update(Message::Filter).unwrap();
        assert_eq!(model.modus(), Modus::CmdInput);
        assert!(model.raw_keyevents());
        for chr in "NARUTO".chars() {
            model
                .update(Message::RawKey(KeyEvent::new(KeyCode::Char(chr), KeyModifiers::NONE)))
                .unwrap();
        }
        // Nothing changes while typing.
        assert_eq!(model.view().num_rows(), 4);
        model
            .update(Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
            .unwrap();
        assert_eq!(model.modus(), Modus::Table);
        assert_eq!(titles(&model), vec!["Naruto", "Naruto Shippuden"]);

        model.update(Message::Exit).unwrap();
        assert_eq!(model.grid_state().filter, FilterState::on("Title"));
        assert_eq!(model.view().num_rows(), 4);
    }

    #[test]
    fn canceled_filter_changes_nothing() {
        let mut model = model();
        model.update(Message::Filter).unwrap();
        model
            .update(Message::RawKey(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)))
            .unwrap();
        model
            .update(Message::RawKey(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
            .unwrap();
        assert_eq!(model.modus(), Modus::Table);
        assert!(!model.grid_state().filter.is_active());
    }

    #[test]
    fn filter_on_a_missing_column_keeps_the_view() {
        let mut model = Model::init(&config().filter_column("Missing".to_string()), source());
        type_command(&mut model, Message::Filter, "x");
        assert_eq!(model.view().num_rows(), 4);
        assert!(!model.grid_state().filter.is_active());
        assert!(model.status_message().contains("unknown column"));
    }

    #[test]
    fn expansion_loads_episodes_and_stays_exclusive() {
        let mut model = model();
        model.update(Message::ToggleExpand).unwrap();
        assert_eq!(model.grid_state().expansion.expanded, Some(RowId(0)));
        assert_eq!(model.expanded_episodes().unwrap().num_rows(), 2);

        model
            .update(Message::GridCellClick(CellClick {
                row_id: RowId(1),
                column_index: 2,
            }))
            .unwrap();
        assert_eq!(model.grid_state().expansion.expanded, Some(RowId(1)));
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(1));
        assert_eq!(model.expanded_episodes().unwrap().num_rows(), 0);
        assert!(model.status_message().starts_with("No episodes"));

        model.update(Message::ToggleExpand).unwrap();
        assert_eq!(model.grid_state().expansion.expanded, None);
    }

    #[test]
    fn exit_collapses_before_clearing_the_filter() {
        let mut model = model();
        type_command(&mut model, Message::Filter, "naruto");
        model.update(Message::ToggleExpand).unwrap();
        model.update(Message::Exit).unwrap();
        assert_eq!(model.grid_state().expansion.expanded, None);
        assert!(model.grid_state().filter.is_active());
    }

    #[test]
    fn search_replaces_the_catalog() {
        let mut model = model();
        model.update(Message::ToggleExpand).unwrap();
        type_command(&mut model, Message::Search, "piece");
        assert_eq!(model.query(), "piece");
        assert_eq!(titles(&model), vec!["One Piece"]);
        assert_eq!(model.grid_state().expansion.expanded, None);

        type_command(&mut model, Message::Search, "dragon");
        assert_eq!(model.view().num_rows(), 0);
        assert!(model.status_message().starts_with("No results"));
        // Moving around an empty view is harmless.
        model.update(Message::MoveDown).unwrap();
        model.update(Message::MoveEnd).unwrap();
        model.update(Message::ToggleExpand).unwrap();
        assert_eq!(model.cursor_cell(), None);
    }

    #[test]
    fn theme_and_stripes_toggle() {
        let mut model = model();
        model.update(Message::ToggleTheme).unwrap();
        assert_eq!(model.theme().kind, ThemeKind::Dark);
        model.update(Message::ToggleStripes).unwrap();
        assert!(!model.theme().striped);
        assert_eq!(model.theme().kind, ThemeKind::Dark);
    }

    #[test]
    fn help_popup_and_quit() {
        let mut model = model();
        model.update(Message::Help).unwrap();
        assert_eq!(model.modus(), Modus::Popup);
        assert!(model.popup_message().unwrap().contains("Navigation"));
        model.update(Message::MoveDown).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(0));
        model.update(Message::Exit).unwrap();
        assert_eq!(model.modus(), Modus::Table);
        model.update(Message::Quit).unwrap();
        assert_eq!(model.status, Status::Quitting);
    }

    #[test]
    fn paging_is_sized_by_the_terminal() {
        let mut model = model();
        model.update(Message::Resize(80, 10)).unwrap();
        model.update(Message::MovePageDown).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(2));
        model.update(Message::MovePageDown).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(3));
        model.update(Message::MoveBeginning).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(0));
    }

    #[test]
    fn copy_text_of_a_cell_is_its_display_text() {
        let mut model = model();
        model.update(Message::MoveRight).unwrap();
        assert_eq!(model.cell_text_at_cursor().unwrap(), "Naruto");
        model.update(Message::MoveRight).unwrap();
        model.update(Message::MoveRight).unwrap();
        assert_eq!(model.cell_text_at_cursor().unwrap(), "1");
    }

    #[test]
    fn expanded_row_copies_its_download_urls() {
        let mut model = model();
        assert_eq!(model.episode_links_text(), None);
        model.update(Message::CopyLinks).unwrap();
        assert!(model.status_message().starts_with("No open row"));

        model.update(Message::ToggleExpand).unwrap();
        assert_eq!(model.episode_links_text().unwrap(), "u1\nu2");

        // Bleach has no episodes.
        model.update(Message::MoveDown).unwrap();
        model.update(Message::ToggleExpand).unwrap();
        assert_eq!(model.episode_links_text(), None);
    }

    #[test]
    fn copy_text_joins_link_urls() {
        let links = CellValue::Links(vec![
            DownloadLink::new("MEGA", "https://mega.nz/1"),
            DownloadLink::new("Stape", "https://stape/1"),
        ]);
        assert_eq!(copy_text(&links), "https://mega.nz/1\nhttps://stape/1");
        assert_eq!(copy_text(&CellValue::Links(Vec::new())), "");
    }

    #[test]
    fn paging_scrolls_a_tall_panel_before_moving_on() {
        let mut model = model();
        model.update(Message::Resize(80, 12)).unwrap();
        model.update(Message::ToggleExpand).unwrap();
        let limit = model.panel_scroll_limit();
        assert!(limit > 0);

        model.update(Message::MovePageDown).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(0));
        assert!(model.panel_scroll() > 0);

        let mut steps = 0;
        while model.panel_scroll() < limit && steps < 20 {
            model.update(Message::ScrollDown).unwrap();
            steps += 1;
        }
        assert_eq!(model.panel_scroll(), limit);
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(0));

        // At the end of the panel the cursor moves on and the scroll resets.
        model.update(Message::ScrollDown).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(1));
        assert_eq!(model.panel_scroll(), 0);
    }

    #[test]
    fn wheel_moves_the_cursor_without_an_open_panel() {
        let mut model = model();
        model.update(Message::ScrollDown).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(1));
        model.update(Message::ScrollUp).unwrap();
        assert_eq!(model.cursor_cell().unwrap().row_id, RowId(0));
        assert_eq!(model.panel_scroll(), 0);
    }
}
