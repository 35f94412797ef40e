use anyhow::{bail, Result};
use tracing::debug;

use crate::data::columns::{ColumnSpec, Fragment, Tone};
use crate::data::record::Record;

/// Message shown when an active search query matches nothing. Deliberately
/// distinct from the caller-configured empty message: one means "you have no
/// data", the other means "your query found none of it".
pub const NO_MATCH_MESSAGE: &str = "No matches found";

/// One invokable control attached to a row: a label plus the callback the
/// caller wants run with the row's record.
pub struct RowAction {
    label: String,
    run: Box<dyn Fn(&Record)>,
}

impl RowAction {
    pub fn new(label: impl Into<String>, run: impl Fn(&Record) + 'static) -> Self {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the caller's callback. The browser's own collection is not
    /// touched; whatever the action did, the caller must re-supply records.
    pub fn invoke(&self, record: &Record) {
        (self.run)(record)
    }
}

/// Maps a record to the actions available on its row.
pub type ActionProvider = Box<dyn Fn(&Record) -> Vec<RowAction>>;

/// A fully rendered row: one fragment per column, plus action labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub cells: Vec<Fragment>,
    pub actions: Vec<String>,
}

/// The rendered state of the current page, ready for a display layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    /// Set when there are no rows to show: the configured empty message,
    /// or [`NO_MATCH_MESSAGE`] when a query is active.
    pub placeholder: Option<String>,
    pub page_index: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    /// Prev/Next controls are only drawn when this is true.
    pub show_pager: bool,
}

/// A searchable, paginated view over a collection of uniformly-shaped
/// records. The browser owns its search and page state but never the data:
/// records are immutable snapshots supplied by the caller, and every state
/// transition is a pure function of the current state and one input event.
pub struct TabularBrowser {
    records: Vec<Record>,
    columns: Vec<ColumnSpec>,
    query: String,
    /// 1-based; always within `[1, total_pages]`.
    page_index: usize,
    page_size: usize,
    empty_message: String,
    actions: Option<ActionProvider>,
    /// Indices into `records` that survive the current filter, in supply order.
    matches: Vec<usize>,
}

impl TabularBrowser {
    /// Builds a browser over an initially empty collection.
    ///
    /// An empty column set or a zero page size is a programming error at the
    /// integration site and fails fast rather than producing a view that
    /// renders nothing.
    pub fn new(columns: Vec<ColumnSpec>, page_size: usize) -> Result<Self> {
        if columns.is_empty() {
            bail!("TabularBrowser requires at least one column");
        }
        if page_size == 0 {
            bail!("TabularBrowser page size must be positive");
        }

        Ok(Self {
            records: Vec::new(),
            columns,
            query: String::new(),
            page_index: 1,
            page_size,
            empty_message: "No records".to_string(),
            actions: None,
            matches: Vec::new(),
        })
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn with_actions(mut self, provider: ActionProvider) -> Self {
        self.actions = Some(provider);
        self
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.set_records(records);
        self
    }

    /// Replaces the underlying collection, e.g. after the caller carried out
    /// a create/update/delete and re-fetched. The filter is re-run and the
    /// page index preserved, clamping to the last page when the filtered set
    /// shrank beneath it.
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records;
        self.refilter();
        self.page_index = self.page_index.min(self.total_pages()).max(1);
    }

    /// Updates the search query and resets to page 1.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page_index = 1;
        self.refilter();
        debug!(
            "query '{}' matched {} of {} records",
            self.query,
            self.matches.len(),
            self.records.len()
        );
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn filtered_count(&self) -> usize {
        self.matches.len()
    }

    /// Always at least 1: an empty filtered set still has one (empty) page.
    pub fn total_pages(&self) -> usize {
        self.matches.len().div_ceil(self.page_size).max(1)
    }

    /// Moves to a 1-based page. Out-of-range requests are a silent no-op
    /// (returns false) so callers can wire Prev/Next without bounds checks.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages() {
            return false;
        }
        self.page_index = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.page_index + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        // page_index is 1-based, so this underflows to 0 and no-ops there
        self.go_to_page(self.page_index.wrapping_sub(1))
    }

    /// The records on the current page, in supply order.
    pub fn visible(&self) -> Vec<&Record> {
        let start = (self.page_index - 1) * self.page_size;
        self.matches
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&idx| &self.records[idx])
            .collect()
    }

    /// Actions for a row of the current page, by visible position.
    pub fn actions_for(&self, visible_row: usize) -> Vec<RowAction> {
        match (&self.actions, self.visible().get(visible_row).copied()) {
            (Some(provider), Some(record)) => provider(record),
            _ => Vec::new(),
        }
    }

    /// Invokes one action on a visible row. Returns false when the row or
    /// action does not exist. The record collection is left untouched.
    pub fn invoke_action(&self, visible_row: usize, action_index: usize) -> bool {
        let visible = self.visible();
        let Some(&record) = visible.get(visible_row) else {
            return false;
        };
        let Some(provider) = &self.actions else {
            return false;
        };
        let actions = provider(record);
        match actions.get(action_index) {
            Some(action) => {
                action.invoke(record);
                true
            }
            None => false,
        }
    }

    /// Produces the current page for display. Cells carry either the raw
    /// value's string form (`"-"` for null/absent) or the column renderer's
    /// fragment; renderers never participate in search matching.
    pub fn render(&self) -> PageView {
        let rows: Vec<RowView> = self
            .visible()
            .into_iter()
            .map(|record| RowView {
                cells: self
                    .columns
                    .iter()
                    .map(|col| render_cell(col, record))
                    .collect(),
                actions: match &self.actions {
                    Some(provider) => provider(record)
                        .iter()
                        .map(|a| a.label().to_string())
                        .collect(),
                    None => Vec::new(),
                },
            })
            .collect();

        let placeholder = if rows.is_empty() {
            if self.query.is_empty() {
                Some(self.empty_message.clone())
            } else {
                Some(NO_MATCH_MESSAGE.to_string())
            }
        } else {
            None
        };

        PageView {
            headers: self.columns.iter().map(|c| c.label.clone()).collect(),
            rows,
            placeholder,
            page_index: self.page_index,
            total_pages: self.total_pages(),
            filtered_count: self.matches.len(),
            show_pager: self.total_pages() > 1,
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// All records surviving the current filter, across every page. Used by
    /// export so that a filtered view exports exactly what it shows.
    pub fn filtered(&self) -> Vec<&Record> {
        self.matches.iter().map(|&idx| &self.records[idx]).collect()
    }

    /// Case-insensitive substring match of the query against the string
    /// coercion of every column's raw value. A record survives if any
    /// column matches.
    fn refilter(&mut self) {
        if self.query.is_empty() {
            self.matches = (0..self.records.len()).collect();
            return;
        }

        let needle = self.query.to_lowercase();
        self.matches = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                self.columns
                    .iter()
                    .any(|col| record.coerce(&col.key).to_lowercase().contains(&needle))
            })
            .map(|(idx, _)| idx)
            .collect();
    }
}

fn render_cell(col: &ColumnSpec, record: &Record) -> Fragment {
    let value = record.get(&col.key);
    match col.render {
        Some(render) => render(value, record),
        None => {
            if value.is_null() {
                Fragment::new("-", Tone::Muted)
            } else {
                Fragment::plain(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::attendance_badge;

    fn people(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Record::new()
                    .with_field("u_id", format!("S_{:03}", i + 1).as_str())
                    .with_field("name", format!("Student {}", i + 1).as_str())
            })
            .collect()
    }

    fn browser(records: Vec<Record>, page_size: usize) -> TabularBrowser {
        TabularBrowser::new(
            vec![ColumnSpec::new("u_id", "ID"), ColumnSpec::new("name", "Name")],
            page_size,
        )
        .unwrap()
        .with_records(records)
    }

    #[test]
    fn test_empty_columns_fail_fast() {
        assert!(TabularBrowser::new(Vec::new(), 5).is_err());
    }

    #[test]
    fn test_zero_page_size_fails_fast() {
        assert!(TabularBrowser::new(vec![ColumnSpec::new("u_id", "ID")], 0).is_err());
    }

    #[test]
    fn test_pagination_boundaries() {
        let b = browser(people(23), 10);
        assert_eq!(b.total_pages(), 3);

        let mut b = b;
        assert!(b.go_to_page(3));
        assert_eq!(b.visible().len(), 3);

        // out of range is a silent no-op
        assert!(!b.go_to_page(0));
        assert!(!b.go_to_page(4));
        assert_eq!(b.page_index(), 3);
    }

    #[test]
    fn test_empty_collection_has_one_page() {
        let b = browser(Vec::new(), 10);
        assert_eq!(b.total_pages(), 1);
        let view = b.render();
        assert_eq!(view.placeholder.as_deref(), Some("No records"));
        assert!(!view.show_pager);
    }

    #[test]
    fn test_query_resets_page_and_filters() {
        let records = vec![
            Record::new()
                .with_field("u_id", "S_001")
                .with_field("name", "Asha")
                .with_field("percentage", 82i64),
            Record::new()
                .with_field("u_id", "S_002")
                .with_field("name", "Ravi")
                .with_field("percentage", 40i64),
        ];
        let mut b = TabularBrowser::new(
            vec![
                ColumnSpec::new("u_id", "ID"),
                ColumnSpec::new("name", "Name"),
                ColumnSpec::new("percentage", "Attendance %"),
            ],
            5,
        )
        .unwrap()
        .with_records(records);

        b.set_query("ravi");
        assert_eq!(b.filtered_count(), 1);
        assert_eq!(b.visible()[0].coerce("u_id"), "S_002");
        assert_eq!(b.page_index(), 1);
    }

    #[test]
    fn test_search_ignores_rendered_fragment() {
        // The badge renderer decorates the value with '%', but matching runs
        // against the raw coercion, so "82%" must not match while "82" does.
        let records = vec![Record::new()
            .with_field("u_id", "S_001")
            .with_field("percentage", 82i64)];
        let mut b = TabularBrowser::new(
            vec![
                ColumnSpec::new("u_id", "ID"),
                ColumnSpec::new("percentage", "Attendance %").with_render(attendance_badge),
            ],
            5,
        )
        .unwrap()
        .with_records(records);

        b.set_query("82%");
        assert_eq!(b.filtered_count(), 0);
        b.set_query("82");
        assert_eq!(b.filtered_count(), 1);
    }

    #[test]
    fn test_no_match_placeholder_is_distinct() {
        let mut b = browser(people(3), 5).with_empty_message("No students yet");
        b.set_query("zzz");
        let view = b.render();
        assert_eq!(view.placeholder.as_deref(), Some(NO_MATCH_MESSAGE));

        b.set_query("");
        b.set_records(Vec::new());
        let view = b.render();
        assert_eq!(view.placeholder.as_deref(), Some("No students yet"));
    }

    #[test]
    fn test_shrinking_collection_clamps_page() {
        let mut b = browser(people(23), 10);
        b.go_to_page(3);
        b.set_records(people(11));
        assert_eq!(b.page_index(), 2);

        b.set_records(Vec::new());
        assert_eq!(b.page_index(), 1);
    }

    #[test]
    fn test_round_trip_restores_first_page() {
        let mut b = browser(people(23), 10);
        let first: Vec<String> = b.visible().iter().map(|r| r.coerce("u_id")).collect();
        b.go_to_page(b.total_pages());
        b.go_to_page(1);
        let again: Vec<String> = b.visible().iter().map(|r| r.coerce("u_id")).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_missing_field_renders_dash() {
        let records = vec![Record::new().with_field("u_id", "S_001")];
        let b = TabularBrowser::new(
            vec![ColumnSpec::new("u_id", "ID"), ColumnSpec::new("email", "Email")],
            5,
        )
        .unwrap()
        .with_records(records);

        let view = b.render();
        assert_eq!(view.rows[0].cells[1].text, "-");
    }

    #[test]
    fn test_action_does_not_mutate_records() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let deleted: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = deleted.clone();
        let provider: ActionProvider = Box::new(move |_record| {
            let sink = sink.clone();
            vec![RowAction::new("delete", move |record: &Record| {
                sink.borrow_mut().push(record.coerce("u_id"));
            })]
        });

        let mut b = browser(people(2), 5).with_actions(provider);
        assert!(b.invoke_action(0, 0));

        // The callback ran but the displayed collection is unchanged until
        // the caller supplies a new one.
        assert_eq!(deleted.borrow().as_slice(), ["S_001".to_string()]);
        assert_eq!(b.filtered_count(), 2);

        b.set_records(people(1));
        assert_eq!(b.filtered_count(), 1);
    }

    #[test]
    fn test_pager_hidden_on_single_page() {
        let b = browser(people(4), 5);
        assert!(!b.render().show_pager);
        let b = browser(people(6), 5);
        assert!(b.render().show_pager);
    }
}
