use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::GridError;
use crate::loader;
use crate::table::{CellValue, DownloadLink, FilterState, SortState, TableData, sorted_and_filtered};

/// Columns of the catalog page dataset.
pub const CATALOG_COLUMNS: [&str; 4] = ["Image", "Title", "Synopsis", "Actions"];
/// Columns of an episode list.
pub const EPISODE_COLUMNS: [&str; 2] = ["Episode", "Downloads"];

#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The source refused to answer; retrying will not help.
    Challenge,
    /// The source answered without any rows.
    Empty,
    Failed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Challenge => write!(f, "challenged by the source"),
            FetchError::Empty => write!(f, "empty result"),
            FetchError::Failed(reason) => write!(f, "{reason}"),
        }
    }
}

/// How often a fetch is tried and how long to wait between tries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Calls `fetch` until it yields a non-empty table.
///
/// Empty results and failures are retried after `policy.delay`. A
/// [`FetchError::Challenge`] returns the `fallback` table right away. When all
/// attempts fail the error lists every failure in order.
pub fn fetch_with_retry<F>(
    policy: &RetryPolicy,
    fallback: impl FnOnce() -> TableData,
    mut fetch: F,
) -> Result<TableData, GridError>
where
    F: FnMut() -> Result<TableData, FetchError>,
{
    let mut notes = Vec::new();
    for attempt in 1..=policy.attempts {
        let failure = match fetch() {
            Ok(table) if !table.is_empty() => {
                debug!("Fetch succeeded on attempt {attempt}");
                return Ok(table);
            }
            Ok(_) => FetchError::Empty,
            Err(FetchError::Challenge) => {
                warn!("Fetch challenged on attempt {attempt}, using fallback");
                return Ok(fallback());
            }
            Err(e) => e,
        };
        warn!("Fetch attempt {attempt}/{} failed: {failure}", policy.attempts);
        notes.push(failure.to_string());
        if attempt < policy.attempts && !policy.delay.is_zero() {
            thread::sleep(policy.delay);
        }
    }
    Err(GridError::SourceFailed(notes))
}

pub trait CatalogSource {
    fn search(&self, query: &str) -> Result<TableData, FetchError>;
    fn episodes(&self, anime_id: &str) -> Result<TableData, FetchError>;
}

/// Searches `source` under the retry policy. A challenged search yields an
/// empty catalog page.
pub fn search_catalog(
    source: &dyn CatalogSource,
    query: &str,
    policy: &RetryPolicy,
) -> Result<TableData, GridError> {
    fetch_with_retry(
        policy,
        || TableData::empty(&CATALOG_COLUMNS),
        || source.search(query),
    )
}

/// Catalog read from local files.
///
/// The catalog file has the columns `id, title, synopsis, poster`, the optional
/// episodes file `anime_id, episode, server, url`.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    catalog: TableData,
    episodes: HashMap<String, TableData>,
}

impl FileCatalog {
    pub fn open(catalog: &Path, episodes: Option<&Path>) -> Result<Self, GridError> {
        let raw_catalog = loader::load_table(catalog)?;
        let raw_episodes = episodes.map(loader::load_table).transpose()?;
        FileCatalog::from_tables(&raw_catalog, raw_episodes.as_ref())
    }

    pub fn from_tables(
        raw_catalog: &TableData,
        raw_episodes: Option<&TableData>,
    ) -> Result<Self, GridError> {
        let catalog = catalog_page(raw_catalog)?;
        let episodes = match raw_episodes {
            Some(raw) => episode_lists(raw)?,
            None => HashMap::new(),
        };
        info!(
            "Catalog with {} titles and {} episode lists",
            catalog.num_rows(),
            episodes.len()
        );
        Ok(Self { catalog, episodes })
    }

    pub fn catalog(&self) -> &TableData {
        &self.catalog
    }
}

impl CatalogSource for FileCatalog {
    fn search(&self, query: &str) -> Result<TableData, FetchError> {
        let filter = FilterState::on("Title").with_text(query.trim());
        let found = sorted_and_filtered(&self.catalog, &SortState::default(), &filter)
            .map_err(|e| FetchError::Failed(e.to_string()))?;
        if found.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(found)
    }

    fn episodes(&self, anime_id: &str) -> Result<TableData, FetchError> {
        self.episodes.get(anime_id).cloned().ok_or(FetchError::Empty)
    }
}

fn non_empty_text(value: &CellValue) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let text = value.to_string();
    (!text.trim().is_empty()).then_some(text)
}

fn catalog_page(raw: &TableData) -> Result<TableData, GridError> {
    let ids = raw.column("id")?.values();
    let titles = raw.column("title")?.values();
    let synopses = raw.column("synopsis")?.values();
    let posters = raw.column("poster")?.values();

    let mut rows = Vec::with_capacity(raw.num_rows());
    for position in 0..raw.num_rows() {
        let (Some(id), Some(title)) = (
            non_empty_text(&ids[position]),
            non_empty_text(&titles[position]),
        ) else {
            debug!("Dropping catalog row {position} without id or title");
            continue;
        };
        rows.push(vec![
            CellValue::from(non_empty_text(&posters[position])).into_image(),
            CellValue::Text(title),
            CellValue::from(non_empty_text(&synopses[position])),
            CellValue::Text(id),
        ]);
    }
    TableData::from_rows(&CATALOG_COLUMNS, rows)
}

fn episode_lists(raw: &TableData) -> Result<HashMap<String, TableData>, GridError> {
    let anime_ids = raw.column("anime_id")?.values();
    let episodes = raw.column("episode")?.values();
    let servers = raw.column("server")?.values();
    let urls = raw.column("url")?.values();

    // anime id -> episodes in first seen order, each with its links
    let mut grouped: HashMap<String, Vec<(CellValue, Vec<DownloadLink>)>> = HashMap::new();
    for position in 0..raw.num_rows() {
        let Some(anime_id) = non_empty_text(&anime_ids[position]) else {
            continue;
        };
        let episode = &episodes[position];
        let list = grouped.entry(anime_id).or_default();
        let idx = match list.iter().position(|(e, _)| e == episode) {
            Some(idx) => idx,
            None => {
                list.push((episode.clone(), Vec::new()));
                list.len() - 1
            }
        };
        if let (Some(server), Some(url)) = (
            non_empty_text(&servers[position]),
            non_empty_text(&urls[position]),
        ) {
            list[idx].1.push(DownloadLink::new(server, url));
        }
    }

    grouped
        .into_iter()
        .map(|(anime_id, list)| {
            let rows = list
                .into_iter()
                .map(|(episode, links)| vec![episode, CellValue::Links(links)])
                .collect();
            TableData::from_rows(&EPISODE_COLUMNS, rows).map(|table| (anime_id, table))
        })
        .collect()
}
