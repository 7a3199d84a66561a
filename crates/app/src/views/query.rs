//! Client-side list pipeline shared by every list view.
//!
//! Order of stages: scope, text search, field filters, date range, stable sort.

use std::cmp::Ordering;

use chrono::NaiveDate;

use auditdesk_auth::{Scope, Scoped};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: Copy + Eq> SortState<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// A header click: the active field flips direction, any other field
    /// becomes active with `default_direction`.
    pub fn click(&mut self, field: F, default_direction: SortDirection) {
        if self.field == field {
            self.direction = self.direction.toggled();
        } else {
            self.field = field;
            self.direction = default_direction;
        }
    }
}

/// Inclusive date bounds; an open end is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Undated records only pass an open range.
    pub fn admits(&self, date: Option<NaiveDate>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Value a row exposes for sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Text(String),
    Number(i64),
    /// Undated rows sort first.
    Date(Option<NaiveDate>),
}

impl SortKey {
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
            (SortKey::Number(a), SortKey::Number(b)) => a.cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Text(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Date(_) => 2,
        }
    }
}

/// Case-insensitive collation with a byte-order tiebreak, so `"apple"`
/// sorts before `"Banana"` and the order stays total.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Case-insensitive substring match; an empty needle matches everything.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

/// A row type that list views can filter and sort.
pub trait Listable: Scoped {
    /// Sortable columns.
    type Field: Copy + Eq + core::fmt::Debug;
    /// Field filters (status, role, ...).
    type Filter: Default + Clone + core::fmt::Debug;

    /// `needle` is already trimmed and lowercased.
    fn matches_search(&self, needle: &str) -> bool;
    fn matches_filter(&self, filter: &Self::Filter) -> bool;
    /// Date checked by the date-range filter.
    fn list_date(&self) -> Option<NaiveDate>;
    fn sort_key(&self, field: Self::Field) -> SortKey;
}

#[derive(Debug, Clone)]
pub struct ListQuery<T: Listable> {
    pub search: String,
    pub filter: T::Filter,
    pub dates: DateRange,
    pub sort: SortState<T::Field>,
}

impl<T: Listable> ListQuery<T> {
    pub fn new(sort: SortState<T::Field>) -> Self {
        Self {
            search: String::new(),
            filter: T::Filter::default(),
            dates: DateRange::default(),
            sort,
        }
    }

    /// Run the pipeline over `items`. Feeding the output back in yields the
    /// same rows in the same order.
    pub fn apply<'a, I>(&self, scope: &Scope, items: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let needle = self.search.trim().to_lowercase();

        let mut rows: Vec<&'a T> = scope
            .filter(items)
            .into_iter()
            .filter(|row| needle.is_empty() || row.matches_search(&needle))
            .filter(|row| row.matches_filter(&self.filter))
            .filter(|row| self.dates.admits(row.list_date()))
            .collect();

        let field = self.sort.field;
        match self.sort.direction {
            SortDirection::Ascending => {
                rows.sort_by(|a, b| a.sort_key(field).compare(&b.sort_key(field)));
            }
            SortDirection::Descending => {
                rows.sort_by(|a, b| b.sort_key(field).compare(&a.sort_key(field)));
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_collation_ignores_case_first() {
        let mut names = vec!["banana", "Apple", "apple", "Cherry"];
        names.sort_by(|a, b| compare_text(a, b));
        assert_eq!(names, vec!["Apple", "apple", "banana", "Cherry"]);
    }

    #[test]
    fn header_clicks_toggle_or_reset() {
        let mut sort = SortState::new("name", SortDirection::Ascending);
        sort.click("name", SortDirection::Ascending);
        assert_eq!(sort.direction, SortDirection::Descending);

        sort.click("date", SortDirection::Descending);
        assert_eq!(sort, SortState::new("date", SortDirection::Descending));

        sort.click("date", SortDirection::Descending);
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn date_range_is_inclusive_and_excludes_undated_rows() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 6, day);
        let range = DateRange { from: d(10), to: d(20) };
        assert!(range.admits(d(10)));
        assert!(range.admits(d(20)));
        assert!(!range.admits(d(21)));
        assert!(!range.admits(None));
        assert!(DateRange::default().admits(None));
    }
}
