use std::fmt;
use std::io::Error;
use std::path::PathBuf;
use std::time::Duration;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::grid::{CellClick, SortRequest};
use crate::theme::ThemeChoice;

#[derive(Debug)]
pub enum GridError {
    InvalidColumn(String),
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },
    DuplicateColumn(String),
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    SourceFailed(Vec<String>),
    LoggingFailed(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::InvalidColumn(name) => write!(f, "unknown column \"{name}\""),
            GridError::RaggedColumns {
                column,
                expected,
                found,
            } => write!(
                f,
                "column \"{column}\" has {found} rows, expected {expected}"
            ),
            GridError::DuplicateColumn(name) => write!(f, "duplicate column \"{name}\""),
            GridError::IoError(e) => write!(f, "io error: {e}"),
            GridError::PolarsError(e) => write!(f, "polars error: {e}"),
            GridError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            GridError::FileNotFound => write!(f, "file not found"),
            GridError::PermissionDenied => write!(f, "permission denied"),
            GridError::UnknownFileType => write!(f, "unknown file type"),
            GridError::SourceFailed(notes) => {
                write!(f, "source failed after {} attempts: {}", notes.len(), notes.join("; "))
            }
            GridError::LoggingFailed(reason) => write!(f, "could not set up logging: {reason}"),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridError::IoError(e) => Some(e),
            GridError::PolarsError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for GridError {
    fn from(err: Error) -> Self {
        GridError::IoError(err)
    }
}

impl From<PolarsError> for GridError {
    fn from(err: PolarsError) -> Self {
        GridError::PolarsError(err)
    }
}

/// Settings of the catalog browser, assembled from the command line.
#[derive(Debug, Clone, Setters)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    #[setters(strip_option)]
    pub episodes_path: Option<PathBuf>,
    pub event_poll_time: u64,
    pub min_column_width: u16,
    pub filter_column: String,
    pub theme: ThemeChoice,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("tests/fixtures/catalog.csv"),
            episodes_path: None,
            event_poll_time: 100,
            min_column_width: 12,
            filter_column: "Title".to_string(),
            theme: ThemeChoice::default(),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Filter,
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    ScrollUp,
    ScrollDown,
    SortColumn,
    ToggleExpand,
    CopyCell,
    CopyLinks,
    Help,
    Exit,
    Filter,
    Search,
    ToggleTheme,
    ToggleStripes,
    Resize(u16, u16),
    GridSort(SortRequest),
    GridCellClick(CellClick),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
 Navigation
   ←↓↑→ / hjkl    move the cursor
   PgUp / PgDn    move one page, or scroll the open episode list
   Home / End     first / last row

 Table
   s              sort by the current column
   Enter          show / hide episodes of the row
   /              filter titles
   :              search the catalog
   y              copy the cell to the clipboard
   Y              copy the download links of the open row
   t              switch light / dark theme
   z              toggle striped rows

 Mouse
   click header   sort
   click cell     show / hide episodes
   wheel          move, or scroll the open episode list

   ?              this help
   Esc            close
   q              quit
";
