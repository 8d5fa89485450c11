//! Headless table view: search, column filters and sorting
//!
//! The visible rows are never stored. They are recomputed from the raw rows
//! and a [`TableViewState`] whenever something is drawn or printed.

use std::collections::HashMap;

use super::column::{ColumnDescriptor, ColumnKey, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Which parts of the pipeline are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub searchable: bool,
    pub filterable: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            searchable: true,
            filterable: true,
        }
    }
}

/// Body state, highest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    Loading,
    Empty,
    Rows(usize),
}

impl BodyState {
    pub fn resolve(loading: bool, visible: usize) -> Self {
        if loading {
            BodyState::Loading
        } else if visible == 0 {
            BodyState::Empty
        } else {
            BodyState::Rows(visible)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableViewState<K: ColumnKey> {
    search: String,
    filters: HashMap<K, String>,
    sort: Option<(K, SortDirection)>,
}

impl<K: ColumnKey> Default for TableViewState<K> {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: HashMap::new(),
            sort: None,
        }
    }
}

impl<K: ColumnKey> TableViewState<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn filter(&self, key: K) -> &str {
        self.filters.get(&key).map(String::as_str).unwrap_or("")
    }

    /// An empty value removes the filter
    pub fn set_filter(&mut self, key: K, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.filters.remove(&key);
        } else {
            self.filters.insert(key, value);
        }
    }

    pub fn active_filters(&self) -> impl Iterator<Item = (K, &str)> {
        self.filters.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn sort(&self) -> Option<(K, SortDirection)> {
        self.sort
    }

    pub fn set_sort(&mut self, key: K, direction: SortDirection) {
        self.sort = Some((key, direction));
    }

    /// Same column flips the direction, a different column starts ascending
    pub fn toggle_sort(&mut self, key: K) {
        self.sort = match self.sort {
            Some((current, direction)) if current == key => Some((key, direction.toggled())),
            _ => Some((key, SortDirection::Asc)),
        };
    }

    /// Toggle only when the column is sortable. Returns whether it applied.
    pub fn request_sort<R>(&mut self, column: &ColumnDescriptor<R>) -> bool
    where
        R: TableRow<Key = K>,
    {
        if !column.sortable {
            return false;
        }
        self.toggle_sort(column.key);
        true
    }

    pub fn matches_search<R>(&self, row: &R) -> bool
    where
        R: TableRow<Key = K>,
    {
        if self.search.is_empty() {
            return true;
        }
        let term = self.search.to_lowercase();
        row.search_values()
            .iter()
            .any(|value| value.string_form().to_lowercase().contains(&term))
    }

    pub fn matches_filters<R>(&self, row: &R) -> bool
    where
        R: TableRow<Key = K>,
    {
        self.filters.iter().all(|(key, value)| {
            row.cell(*key)
                .string_form()
                .to_lowercase()
                .contains(&value.to_lowercase())
        })
    }

    /// Search, then filter, then a stable sort
    pub fn apply<'a, R>(&self, rows: &'a [R], options: ViewOptions) -> Vec<&'a R>
    where
        R: TableRow<Key = K>,
    {
        let mut visible: Vec<&R> = rows
            .iter()
            .filter(|row| !options.searchable || self.matches_search(*row))
            .filter(|row| !options.filterable || self.matches_filters(*row))
            .collect();

        if let Some((key, direction)) = self.sort {
            visible.sort_by(|a, b| {
                let (a, b) = (a.cell(key), b.cell(key));
                // Missing values go last in either direction
                if a.is_missing() || b.is_missing() {
                    return a.is_missing().cmp(&b.is_missing());
                }
                let ordering = a.sort_cmp(&b);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::fixtures::*;

    fn names(rows: &[&Person]) -> Vec<String> {
        rows.iter().map(|row| row.name.clone()).collect()
    }

    #[test]
    fn test_search_ali_keeps_alice() {
        let rows = alice_and_bob();
        let mut view = TableViewState::new();
        view.set_search("ali");

        let visible = view.apply(&rows, ViewOptions::default());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, 1);
    }

    #[test]
    fn test_search_is_case_insensitive_and_covers_hidden_fields() {
        let mut rows = alice_and_bob();
        rows[1].note = Some("Prefers EMAIL".to_string());
        let mut view = TableViewState::new();

        view.set_search("email");
        assert_eq!(names(&view.apply(&rows, ViewOptions::default())), vec!["Bob"]);

        view.set_search("ALICE");
        assert_eq!(names(&view.apply(&rows, ViewOptions::default())), vec!["Alice"]);
    }

    #[test]
    fn test_search_disabled() {
        let rows = alice_and_bob();
        let mut view = TableViewState::new();
        view.set_search("zzz");
        let options = ViewOptions {
            searchable: false,
            filterable: true,
        };
        assert_eq!(view.apply(&rows, options).len(), 2);
    }

    #[test]
    fn test_filters_require_every_active_entry() {
        let rows = vec![
            person(1, "Alice", true),
            person(2, "Alicia", false),
            person(3, "Bob", true),
        ];
        let mut view = TableViewState::new();
        view.set_filter(PersonKey::Name, "ALI");
        assert_eq!(
            names(&view.apply(&rows, ViewOptions::default())),
            vec!["Alice", "Alicia"]
        );

        view.set_filter(PersonKey::Active, "true");
        assert_eq!(names(&view.apply(&rows, ViewOptions::default())), vec!["Alice"]);

        view.set_filter(PersonKey::Active, "");
        assert_eq!(view.filter(PersonKey::Active), "");
        assert_eq!(view.active_filters().count(), 1);
    }

    #[test]
    fn test_sort_toggle_alice_bob() {
        let rows = alice_and_bob();
        let columns = person_columns();
        let mut view = TableViewState::new();

        assert!(view.request_sort(&columns[0]));
        assert_eq!(names(&view.apply(&rows, ViewOptions::default())), vec!["Alice", "Bob"]);

        assert!(view.request_sort(&columns[0]));
        assert_eq!(names(&view.apply(&rows, ViewOptions::default())), vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_non_sortable_column_is_ignored() {
        let columns = person_columns();
        let mut view = TableViewState::new();
        assert!(!view.request_sort(&columns[1]));
        assert_eq!(view.sort(), None);
    }

    #[test]
    fn test_switching_column_resets_to_ascending() {
        let mut view = TableViewState::new();
        view.toggle_sort(PersonKey::Name);
        view.toggle_sort(PersonKey::Name);
        view.toggle_sort(PersonKey::Id);
        assert_eq!(view.sort(), Some((PersonKey::Id, SortDirection::Asc)));
    }

    #[test]
    fn test_toggle_reverses_unique_keys() {
        let rows: Vec<Person> = [7, 3, 9, 1, 4, 12, 8]
            .iter()
            .map(|id| person(*id, &format!("p{id}"), id % 2 == 0))
            .collect();
        let mut view = TableViewState::new();

        view.toggle_sort(PersonKey::Id);
        let ascending: Vec<i64> = view
            .apply(&rows, ViewOptions::default())
            .iter()
            .map(|row| row.id)
            .collect();
        view.toggle_sort(PersonKey::Id);
        let mut descending: Vec<i64> = view
            .apply(&rows, ViewOptions::default())
            .iter()
            .map(|row| row.id)
            .collect();

        assert_eq!(ascending, vec![1, 3, 4, 7, 8, 9, 12]);
        descending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let rows = vec![
            person(1, "b", true),
            person(2, "a", false),
            person(3, "c", true),
            person(4, "d", false),
        ];
        let mut view = TableViewState::new();
        view.toggle_sort(PersonKey::Active);
        let ids: Vec<i64> = view
            .apply(&rows, ViewOptions::default())
            .iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_body_state_precedence() {
        assert_eq!(BodyState::resolve(true, 5), BodyState::Loading);
        assert_eq!(BodyState::resolve(true, 0), BodyState::Loading);
        assert_eq!(BodyState::resolve(false, 0), BodyState::Empty);
        assert_eq!(BodyState::resolve(false, 3), BodyState::Rows(3));
    }
}
