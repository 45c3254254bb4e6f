use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;
use tracing::trace;

use crate::domain::GridError;

/// Stable identity of a data row, independent of its position in a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadLink {
    pub server: String,
    pub url: String,
}

impl DownloadLink {
    pub fn new(server: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Image(String),
    Links(Vec<DownloadLink>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) | CellValue::Image(s) => Some(s),
            _ => None,
        }
    }

    /// Turns text into an image reference, leaving other values untouched.
    pub fn into_image(self) -> CellValue {
        match self {
            CellValue::Text(url) => CellValue::Image(url),
            other => other,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Number(_) => 2,
            CellValue::Timestamp(_) => 3,
            CellValue::Text(_) => 4,
            CellValue::Image(_) => 5,
            CellValue::Links(_) => 6,
        }
    }

    /// Ascending order between two non-null values of a column.
    fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Timestamp(a), CellValue::Timestamp(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Image(a), CellValue::Image(b)) => a.cmp(b),
            (CellValue::Links(a), CellValue::Links(b)) => a.len().cmp(&b.len()),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "∅"),
            CellValue::Text(s) | CellValue::Image(s) => write!(f, "{s}"),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Links(links) => {
                let servers = links
                    .iter()
                    .map(|l| l.server.as_str())
                    .collect::<Vec<&str>>();
                write!(f, "{}", servers.join(", "))
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Timestamp(value)
    }
}

impl From<Vec<DownloadLink>> for CellValue {
    fn from(value: Vec<DownloadLink>) -> Self {
        CellValue::Links(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<CellValue>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// Column oriented table. Row ids are assigned on creation and travel with the
/// rows through every derived view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableData {
    columns: Vec<Column>,
    row_ids: Vec<RowId>,
}

impl TableData {
    pub fn new<S: Into<String>>(columns: Vec<(S, Vec<CellValue>)>) -> Result<Self, GridError> {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Column {
                name: name.into(),
                values,
            })
            .collect();

        let nrows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in columns.iter() {
            if !seen.insert(column.name.as_str()) {
                return Err(GridError::DuplicateColumn(column.name.clone()));
            }
            if column.values.len() != nrows {
                return Err(GridError::RaggedColumns {
                    column: column.name.clone(),
                    expected: nrows,
                    found: column.values.len(),
                });
            }
        }

        Ok(Self {
            columns,
            row_ids: (0..nrows).map(RowId).collect(),
        })
    }

    /// Table with the given header and no rows.
    pub fn empty(names: &[&str]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column {
                    name: name.to_string(),
                    values: Vec::new(),
                })
                .collect(),
            row_ids: Vec::new(),
        }
    }

    /// Builds a table from row records, each holding one value per column.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<CellValue>>) -> Result<Self, GridError> {
        let mut columns: Vec<Vec<CellValue>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (ridx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(GridError::LoadingFailed(format!(
                    "row {ridx} has {} values for {} columns",
                    row.len(),
                    names.len()
                )));
            }
            for (cidx, value) in row.into_iter().enumerate() {
                columns[cidx].push(value);
            }
        }
        TableData::new(names.iter().copied().zip(columns).collect())
    }

    pub fn num_rows(&self) -> usize {
        self.row_ids.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, GridError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| GridError::InvalidColumn(name.to_string()))
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn value(&self, position: usize, column_index: usize) -> Option<&CellValue> {
        self.columns
            .get(column_index)
            .and_then(|c| c.values.get(position))
    }

    pub fn position_of(&self, row_id: RowId) -> Option<usize> {
        self.row_ids.iter().position(|&id| id == row_id)
    }

    /// Values of one row in column order, looked up by row id.
    pub fn row(&self, row_id: RowId) -> Option<Vec<&CellValue>> {
        let position = self.position_of(row_id)?;
        Some(self.columns.iter().map(|c| &c.values[position]).collect())
    }

    pub fn map_column(
        &mut self,
        name: &str,
        f: impl Fn(CellValue) -> CellValue,
    ) -> Result<(), GridError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| GridError::InvalidColumn(name.to_string()))?;
        column.values = std::mem::take(&mut column.values)
            .into_iter()
            .map(f)
            .collect();
        Ok(())
    }

    // Materialize the rows at the given positions, keeping their ids.
    fn select(&self, positions: &[usize]) -> TableData {
        TableData {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: positions.iter().map(|&p| c.values[p].clone()).collect(),
                })
                .collect(),
            row_ids: positions.iter().map(|&p| self.row_ids[p]).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    pub fn is_sorted_by(&self, column: &str) -> bool {
        self.column.as_deref() == Some(column)
    }

    /// Direction a click on `column` applies: the active column flips, any
    /// other column starts ascending.
    pub fn next_direction(&self, column: &str) -> SortDirection {
        if self.is_sorted_by(column) {
            self.direction.flipped()
        } else {
            SortDirection::Ascending
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub column: String,
    pub text: String,
}

impl FilterState {
    pub fn on(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState::on("Title")
    }
}

/// Derives the view of `data` that is rendered: a stable sort on the sort
/// column followed by the case-insensitive substring filter.
///
/// Sorting by a column that does not exist is an error, as is filtering with
/// non-empty text on one. Row ids of the source rows are preserved.
pub fn sorted_and_filtered(
    data: &TableData,
    sort: &SortState,
    filter: &FilterState,
) -> Result<TableData, GridError> {
    let mut positions: Vec<usize> = (0..data.num_rows()).collect();

    if let Some(sort_column) = &sort.column {
        let values = data.column(sort_column)?.values();
        let descending = sort.direction == SortDirection::Descending;
        // slice::sort_by is stable, ties keep their relative order in both directions.
        positions.sort_by(|&a, &b| match (&values[a], &values[b]) {
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Null, _) => Ordering::Greater,
            (_, CellValue::Null) => Ordering::Less,
            (va, vb) if descending => vb.compare(va),
            (va, vb) => va.compare(vb),
        });
    }

    if filter.is_active() {
        let values = data.column(&filter.column)?.values();
        let needle = filter.text.to_lowercase();
        positions.retain(|&p| values[p].to_string().to_lowercase().contains(&needle));
    }

    trace!(
        "Derived view: {} of {} rows, sort {:?}, filter \"{}\"",
        positions.len(),
        data.num_rows(),
        sort,
        filter.text
    );
    Ok(data.select(&positions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(data: &TableData) -> Vec<String> {
        data.column("Title")
            .unwrap()
            .values()
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    fn ids(data: &TableData) -> Vec<usize> {
        data.row_ids().iter().map(|id| id.0).collect()
    }

    fn catalog() -> TableData {
        TableData::new(vec![
            (
                "Title",
                vec!["Naruto".into(), "naruto shippuden".into(), "Bleach".into()],
            ),
            ("Score", vec![5i64.into(), 9i64.into(), 7i64.into()]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        let ragged = TableData::new(vec![
            ("a", vec![CellValue::from(1i64)]),
            ("b", vec![]),
        ]);
        assert!(matches!(
            ragged,
            Err(GridError::RaggedColumns { expected: 1, found: 0, .. })
        ));

        let duplicate = TableData::new(vec![("a", vec![]), ("a", vec![])]);
        assert!(matches!(duplicate, Err(GridError::DuplicateColumn(name)) if name == "a"));
    }

    #[test]
    fn stable_sort_keeps_ties_in_both_directions() {
        let data = TableData::new(vec![
            ("Key", vec![1i64.into(), 0i64.into(), 1i64.into(), 0i64.into(), 1i64.into()]),
            ("Tag", vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()]),
        ])
        .unwrap();
        let filter = FilterState::on("Tag");

        let asc = sorted_and_filtered(&data, &SortState::by("Key", SortDirection::Ascending), &filter)
            .unwrap();
        assert_eq!(ids(&asc), vec![1, 3, 0, 2, 4]);

        let desc =
            sorted_and_filtered(&data, &SortState::by("Key", SortDirection::Descending), &filter)
                .unwrap();
        assert_eq!(ids(&desc), vec![0, 2, 4, 1, 3]);
    }

    #[test]
    fn nulls_sort_last_either_way() {
        let data = TableData::new(vec![(
            "Title",
            vec![CellValue::Null, "b".into(), "a".into()],
        )])
        .unwrap();
        let filter = FilterState::default();
        let asc = sorted_and_filtered(&data, &SortState::by("Title", SortDirection::Ascending), &filter)
            .unwrap();
        assert_eq!(ids(&asc), vec![2, 1, 0]);
        let desc =
            sorted_and_filtered(&data, &SortState::by("Title", SortDirection::Descending), &filter)
                .unwrap();
        assert_eq!(ids(&desc), vec![1, 2, 0]);
    }

    #[test]
    fn numbers_sort_numerically() {
        let data = TableData::new(vec![(
            "Title",
            vec![10i64.into(), 9i64.into(), 100i64.into()],
        )])
        .unwrap();
        let view = sorted_and_filtered(
            &data,
            &SortState::by("Title", SortDirection::Ascending),
            &FilterState::default(),
        )
        .unwrap();
        assert_eq!(titles(&view), vec!["9", "10", "100"]);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let data = TableData::new(vec![("Title", vec!["xAbCy".into(), "zzz".into()])]).unwrap();
        let upper = sorted_and_filtered(
            &data,
            &SortState::default(),
            &FilterState::on("Title").with_text("ABC"),
        )
        .unwrap();
        let lower = sorted_and_filtered(
            &data,
            &SortState::default(),
            &FilterState::on("Title").with_text("abc"),
        )
        .unwrap();
        assert_eq!(upper, lower);
        assert_eq!(ids(&upper), vec![0]);
    }

    #[test]
    fn empty_filter_keeps_every_row() {
        let view = sorted_and_filtered(&catalog(), &SortState::default(), &FilterState::default())
            .unwrap();
        assert_eq!(view, catalog());
    }

    #[test]
    fn unknown_sort_column_is_an_error() {
        let result = sorted_and_filtered(
            &catalog(),
            &SortState::by("Missing", SortDirection::Ascending),
            &FilterState::default(),
        );
        assert!(matches!(result, Err(GridError::InvalidColumn(name)) if name == "Missing"));
    }

    #[test]
    fn unknown_filter_column_only_matters_with_text() {
        let idle = FilterState::on("Missing");
        assert!(sorted_and_filtered(&catalog(), &SortState::default(), &idle).is_ok());
        let active = FilterState::on("Missing").with_text("x");
        assert!(matches!(
            sorted_and_filtered(&catalog(), &SortState::default(), &active),
            Err(GridError::InvalidColumn(_))
        ));
    }

    #[test]
    fn row_ids_survive_sorting() {
        let data = TableData::new(vec![("v", vec!["b".into(), "a".into()])]).unwrap();
        let before = data.row(RowId(0)).unwrap();
        assert_eq!(before, vec![&CellValue::from("b")]);

        let view = sorted_and_filtered(
            &data,
            &SortState::by("v", SortDirection::Ascending),
            &FilterState::on("v"),
        )
        .unwrap();
        assert_eq!(ids(&view), vec![1, 0]);
        assert_eq!(view.row(RowId(0)).unwrap(), vec![&CellValue::from("b")]);
        assert_eq!(view.position_of(RowId(0)), Some(1));
    }

    #[test]
    fn filter_then_sort_scenario() {
        let filter = FilterState::on("Title").with_text("naruto");
        let filtered = sorted_and_filtered(&catalog(), &SortState::default(), &filter).unwrap();
        assert_eq!(titles(&filtered), vec!["Naruto", "naruto shippuden"]);

        let sorted = sorted_and_filtered(
            &catalog(),
            &SortState::by("Score", SortDirection::Descending),
            &filter,
        )
        .unwrap();
        assert_eq!(titles(&sorted), vec!["naruto shippuden", "Naruto"]);
        assert_eq!(ids(&sorted), vec![1, 0]);
    }

    #[test]
    fn empty_table_derives_empty_view() {
        let data = TableData::empty(&["Title", "Score"]);
        let view = sorted_and_filtered(
            &data,
            &SortState::by("Score", SortDirection::Descending),
            &FilterState::on("Title").with_text("x"),
        )
        .unwrap();
        assert_eq!(view.num_rows(), 0);
        assert_eq!(view.num_columns(), 2);
    }

    #[test]
    fn map_column_retypes_values() {
        let mut data = TableData::new(vec![("Image", vec!["http://x/a.png".into()])]).unwrap();
        data.map_column("Image", CellValue::into_image).unwrap();
        assert_eq!(
            data.value(0, 0),
            Some(&CellValue::Image("http://x/a.png".to_string()))
        );
        assert!(data.map_column("Nope", CellValue::into_image).is_err());
    }

    #[test]
    fn next_direction_toggles_only_the_active_column() {
        let sort = SortState::by("Title", SortDirection::Ascending);
        assert_eq!(sort.next_direction("Title"), SortDirection::Descending);
        assert_eq!(sort.next_direction("Score"), SortDirection::Ascending);
        assert_eq!(
            SortState::by("Title", SortDirection::Descending).next_direction("Title"),
            SortDirection::Ascending
        );
    }
}
