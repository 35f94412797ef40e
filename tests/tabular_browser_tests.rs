use sdms_cli::data::browser::{TabularBrowser, NO_MATCH_MESSAGE};
use sdms_cli::data::columns::{attendance_badge, ColumnSpec, Tone};
use sdms_cli::data::record::Record;

fn roster() -> Vec<Record> {
    vec![
        Record::new()
            .with_field("u_id", "S_001")
            .with_field("name", "Asha")
            .with_field("percentage", 82i64),
        Record::new()
            .with_field("u_id", "S_002")
            .with_field("name", "Ravi")
            .with_field("percentage", 40i64),
    ]
}

fn roster_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("u_id", "ID"),
        ColumnSpec::new("name", "Name"),
        ColumnSpec::new("percentage", "Attendance %"),
    ]
}

fn numbered(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new()
                .with_field("u_id", format!("S_{:03}", i + 1))
                .with_field("name", format!("Student {}", i + 1))
        })
        .collect()
}

#[test]
fn query_matches_case_insensitively_against_any_column() {
    let mut browser = TabularBrowser::new(roster_columns(), 5)
        .unwrap()
        .with_records(roster());

    browser.set_query("ravi");
    assert_eq!(browser.filtered_count(), 1);
    assert_eq!(browser.visible()[0].coerce("u_id"), "S_002");

    // numeric columns participate through their string coercion
    browser.set_query("82");
    assert_eq!(browser.visible()[0].coerce("u_id"), "S_001");

    // every displayed record must actually contain the query somewhere
    browser.set_query("s_0");
    assert_eq!(browser.filtered_count(), 2);
}

#[test]
fn set_query_always_resets_to_page_one() {
    let mut browser = TabularBrowser::new(roster_columns(), 5)
        .unwrap()
        .with_records(numbered(23));

    browser.go_to_page(3);
    assert_eq!(browser.page_index(), 3);
    browser.set_query("student");
    assert_eq!(browser.page_index(), 1);
}

#[test]
fn go_to_page_is_idempotent_on_invalid_input() {
    let mut browser = TabularBrowser::new(roster_columns(), 10)
        .unwrap()
        .with_records(numbered(23));

    browser.go_to_page(2);
    let before: Vec<String> = browser.visible().iter().map(|r| r.coerce("u_id")).collect();

    assert!(!browser.go_to_page(0));
    assert!(!browser.go_to_page(99));

    let after: Vec<String> = browser.visible().iter().map(|r| r.coerce("u_id")).collect();
    assert_eq!(before, after);
    assert_eq!(browser.page_index(), 2);
}

#[test]
fn last_page_then_first_page_round_trips() {
    let mut browser = TabularBrowser::new(roster_columns(), 10)
        .unwrap()
        .with_records(numbered(23));

    let initial: Vec<String> = browser.visible().iter().map(|r| r.coerce("u_id")).collect();

    browser.go_to_page(browser.total_pages());
    assert_eq!(browser.visible().len(), 3);
    browser.go_to_page(1);

    let restored: Vec<String> = browser.visible().iter().map(|r| r.coerce("u_id")).collect();
    assert_eq!(initial, restored);
}

#[test]
fn empty_collection_is_one_empty_page_with_empty_message() {
    let browser = TabularBrowser::new(roster_columns(), 10)
        .unwrap()
        .with_empty_message("No students yet");

    assert_eq!(browser.total_pages(), 1);
    let view = browser.render();
    assert!(view.rows.is_empty());
    assert_eq!(view.placeholder.as_deref(), Some("No students yet"));
    assert!(!view.show_pager);
}

#[test]
fn no_match_message_only_when_query_active() {
    let mut browser = TabularBrowser::new(roster_columns(), 10)
        .unwrap()
        .with_empty_message("No students yet")
        .with_records(roster());

    browser.set_query("nobody");
    assert_eq!(browser.render().placeholder.as_deref(), Some(NO_MATCH_MESSAGE));
}

#[test]
fn renderer_output_and_raw_fallback() {
    let records = vec![Record::new()
        .with_field("u_id", "S_001")
        .with_field("percentage", 82i64)];
    let columns = vec![
        ColumnSpec::new("u_id", "ID"),
        ColumnSpec::new("email", "Email"),
        ColumnSpec::new("percentage", "Attendance %").with_render(attendance_badge),
    ];
    let browser = TabularBrowser::new(columns, 5)
        .unwrap()
        .with_records(records);

    let view = browser.render();
    let row = &view.rows[0];
    assert_eq!(row.cells[0].text, "S_001");
    // missing field falls back to the dash display
    assert_eq!(row.cells[1].text, "-");
    // renderer output carries the badge tone
    assert_eq!(row.cells[2].text, "82%");
    assert_eq!(row.cells[2].tone, Tone::Success);
}

#[test]
fn delete_action_leaves_displayed_list_untouched() {
    use sdms_cli::data::browser::RowAction;
    use std::cell::RefCell;
    use std::rc::Rc;

    let requested: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = requested.clone();

    let mut browser = TabularBrowser::new(roster_columns(), 5)
        .unwrap()
        .with_actions(Box::new(move |_record| {
            let sink = sink.clone();
            vec![RowAction::new("delete", move |record: &Record| {
                sink.borrow_mut().push(record.coerce("u_id"));
            })]
        }))
        .with_records(roster());

    assert!(browser.invoke_action(1, 0));
    assert_eq!(requested.borrow().as_slice(), ["S_002".to_string()]);

    // still two rows: the component holds no deletion logic of its own
    assert_eq!(browser.filtered_count(), 2);

    // the caller deleted and re-fetched; only now does the view shrink
    let remaining: Vec<Record> = roster()
        .into_iter()
        .filter(|r| r.coerce("u_id") != "S_002")
        .collect();
    browser.set_records(remaining);
    assert_eq!(browser.filtered_count(), 1);
    assert_eq!(browser.visible()[0].coerce("u_id"), "S_001");
}

#[test]
fn twenty_three_records_paginate_into_three_pages_of_ten() {
    let mut browser = TabularBrowser::new(roster_columns(), 10)
        .unwrap()
        .with_records(numbered(23));

    assert_eq!(browser.total_pages(), 3);
    assert_eq!(browser.visible().len(), 10);
    browser.go_to_page(3);
    assert_eq!(browser.visible().len(), 3);
}
