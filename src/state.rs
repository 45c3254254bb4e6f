use tracing::trace;

use crate::table::{FilterState, RowId, SortDirection, SortState};
use crate::theme::ThemeChoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpansionState {
    pub expanded: Option<RowId>,
}

impl ExpansionState {
    pub fn is_expanded(&self, row_id: RowId) -> bool {
        self.expanded == Some(row_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    HeaderClicked(String),
    CellClicked(RowId),
    FilterCommitted(String),
    ThemeSelected(ThemeChoice),
}

/// Everything the user can change about a grid. Events replace the state, they
/// never mutate it in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridState {
    pub sort: SortState,
    pub filter: FilterState,
    pub expansion: ExpansionState,
    pub theme: ThemeChoice,
}

impl GridState {
    pub fn new(filter_column: impl Into<String>, theme: ThemeChoice) -> Self {
        Self {
            sort: SortState::default(),
            filter: FilterState::on(filter_column),
            expansion: ExpansionState::default(),
            theme,
        }
    }

    pub fn update(self, event: InteractionEvent) -> GridState {
        trace!("Grid event {:?}", event);
        match event {
            InteractionEvent::HeaderClicked(column) => {
                let sort = if self.sort.is_sorted_by(&column) {
                    SortState {
                        direction: self.sort.direction.flipped(),
                        ..self.sort
                    }
                } else {
                    SortState::by(column, SortDirection::Ascending)
                };
                GridState { sort, ..self }
            }
            InteractionEvent::CellClicked(row_id) => {
                let expanded = if self.expansion.is_expanded(row_id) {
                    None
                } else {
                    Some(row_id)
                };
                GridState {
                    expansion: ExpansionState { expanded },
                    ..self
                }
            }
            InteractionEvent::FilterCommitted(text) => GridState {
                filter: self.filter.with_text(text),
                ..self
            },
            InteractionEvent::ThemeSelected(theme) => GridState { theme, ..self },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeKind;

    fn click_header(state: GridState, column: &str) -> GridState {
        state.update(InteractionEvent::HeaderClicked(column.to_string()))
    }

    #[test]
    fn header_clicks_toggle_the_active_column() {
        let state = click_header(GridState::default(), "Title");
        assert_eq!(state.sort, SortState::by("Title", SortDirection::Ascending));

        let state = click_header(state, "Title");
        assert_eq!(state.sort, SortState::by("Title", SortDirection::Descending));

        let state = click_header(state, "Score");
        assert_eq!(state.sort, SortState::by("Score", SortDirection::Ascending));
    }

    #[test]
    fn toggle_pairing_returns_to_the_start() {
        let start = click_header(GridState::default(), "Title");
        let twice = click_header(click_header(start.clone(), "Title"), "Title");
        assert_eq!(start, twice);
    }

    #[test]
    fn only_one_row_is_expanded() {
        let state = GridState::default().update(InteractionEvent::CellClicked(RowId(3)));
        assert_eq!(state.expansion.expanded, Some(RowId(3)));

        let state = state.update(InteractionEvent::CellClicked(RowId(5)));
        assert_eq!(state.expansion.expanded, Some(RowId(5)));
        assert!(!state.expansion.is_expanded(RowId(3)));

        let state = state.update(InteractionEvent::CellClicked(RowId(5)));
        assert_eq!(state.expansion.expanded, None);
    }

    #[test]
    fn each_event_touches_one_slot() {
        let start = GridState::new("Title", ThemeChoice::default());

        let filtered = start
            .clone()
            .update(InteractionEvent::FilterCommitted("naruto".to_string()));
        assert_eq!(filtered.filter.text, "naruto");
        assert_eq!(filtered.filter.column, "Title");
        assert_eq!(
            GridState {
                filter: start.filter.clone(),
                ..filtered.clone()
            },
            start
        );

        let dark = ThemeChoice {
            kind: ThemeKind::Dark,
            striped: false,
        };
        let themed = filtered.clone().update(InteractionEvent::ThemeSelected(dark));
        assert_eq!(themed.theme, dark);
        assert_eq!(
            GridState {
                theme: filtered.theme,
                ..themed
            },
            filtered
        );
    }
}
