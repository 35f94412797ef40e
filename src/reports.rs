use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

use crate::data::columns::{attendance_badge, grade_badge, percent_suffix, ColumnSpec};
use crate::data::record::Record;

/// Round to two decimal places, the precision every report percentage uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Letter grade bands for the performance report.
pub fn grade_for(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A"
    } else if percentage >= 75.0 {
        "B"
    } else if percentage >= 50.0 {
        "C"
    } else {
        "Fail"
    }
}

/// Per-student attendance summary.
///
/// A student's class total is the larger of their own marked entries and the
/// number of distinct (subject, date) sessions held, so students with no
/// marks at all still show the sessions they missed.
pub fn attendance_summary(students: &[Record], attendance: &[Record]) -> Vec<Record> {
    let sessions: HashSet<(String, String)> = attendance
        .iter()
        .map(|row| (row.coerce("subject_id"), row.coerce("date")))
        .collect();
    let classes_held = sessions.len();

    students
        .iter()
        .map(|student| {
            let sid = student.coerce("u_id");
            let present = attendance
                .iter()
                .filter(|row| row.coerce("student_id") == sid && row.coerce("status") == "present")
                .count();
            let absent = attendance
                .iter()
                .filter(|row| row.coerce("student_id") == sid && row.coerce("status") == "absent")
                .count();

            let total = (present + absent).max(classes_held);
            let percentage = if total > 0 {
                round2(present as f64 / total as f64 * 100.0)
            } else {
                0.0
            };

            Record::new()
                .with_field("u_id", sid)
                .with_field("name", student.coerce("name"))
                .with_field("total_classes", total as i64)
                .with_field("present", present as i64)
                .with_field("absent", absent as i64)
                .with_field("percentage", percentage)
        })
        .collect()
}

/// Per-student marks summary with overall percentage and grade.
pub fn performance_summary(students: &[Record], marks: &[Record]) -> Vec<Record> {
    students
        .iter()
        .map(|student| {
            let sid = student.coerce("u_id");
            let mine: Vec<&Record> = marks
                .iter()
                .filter(|row| row.coerce("student_id") == sid)
                .collect();

            let obtained: f64 = mine
                .iter()
                .filter_map(|row| row.get("marks_obtained").as_f64())
                .sum();
            let max: f64 = mine
                .iter()
                .filter_map(|row| row.get("max_marks").as_f64())
                .sum();

            let percentage = if max > 0.0 {
                round2(obtained / max * 100.0)
            } else {
                0.0
            };

            Record::new()
                .with_field("u_id", sid)
                .with_field("name", student.coerce("name"))
                .with_field("total_obtained", obtained)
                .with_field("total_max", max)
                .with_field("percentage", percentage)
                .with_field("grade", grade_for(percentage))
        })
        .collect()
}

/// Students registered inside the optional inclusive date range. An
/// unparseable or missing `created_at` never matches a bounded range.
pub fn registrations_between(
    students: &[Record],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<Record> {
    let matched: Vec<Record> = students
        .iter()
        .filter(|student| {
            let created = parse_date(&student.coerce("created_at"));
            match (created, start, end) {
                (None, None, None) => true,
                (None, _, _) => false,
                (Some(date), lo, hi) => {
                    lo.map_or(true, |lo| date >= lo) && hi.map_or(true, |hi| date <= hi)
                }
            }
        })
        .cloned()
        .collect();
    debug!(
        "registrations report: {} of {} students in range",
        matched.len(),
        students.len()
    );
    matched
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // created_at may arrive as a bare date or a full timestamp
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| text.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

pub fn attendance_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("u_id", "Student ID"),
        ColumnSpec::new("name", "Name"),
        ColumnSpec::new("total_classes", "Total Classes"),
        ColumnSpec::new("present", "Present"),
        ColumnSpec::new("absent", "Absent"),
        ColumnSpec::new("percentage", "Attendance %").with_render(attendance_badge),
    ]
}

pub fn performance_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("u_id", "Student ID"),
        ColumnSpec::new("name", "Name"),
        ColumnSpec::new("total_obtained", "Total Obtained"),
        ColumnSpec::new("total_max", "Total Max"),
        ColumnSpec::new("percentage", "Percentage").with_render(percent_suffix),
        ColumnSpec::new("grade", "Grade").with_render(grade_badge),
    ]
}

pub fn registration_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("u_id", "Student ID"),
        ColumnSpec::new("name", "Name"),
        ColumnSpec::new("email", "Email"),
        ColumnSpec::new("created_at", "Reg. Date"),
    ]
}
