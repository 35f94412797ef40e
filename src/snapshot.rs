use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::api_client::{AttendanceStatus, Backend, EntityKind};
use crate::data::record::Record;
use crate::reports;

#[derive(Default)]
struct SnapshotState {
    faculty: Vec<Record>,
    students: Vec<Record>,
    admins: Vec<Record>,
    attendance: Vec<Record>,
    marks: Vec<Record>,
}

/// In-memory [`Backend`] over a JSON snapshot of the service's data.
///
/// Used for offline browsing and as the test double behind the shell: the
/// same trait surface as [`crate::api_client::HttpBackend`], with reports
/// computed locally from the raw attendance and marks rows.
pub struct SnapshotBackend {
    state: RefCell<SnapshotState>,
}

impl SnapshotBackend {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SnapshotState::default()),
        }
    }

    /// Load a snapshot file: a JSON object with `faculty`, `students`,
    /// `admins`, `attendance`, and `marks` arrays (all optional).
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let body: JsonValue = serde_json::from_str(&text)?;

        let section = |name: &str| -> Vec<Record> {
            body.get(name)
                .and_then(|v| v.as_array())
                .map(|rows| Record::from_rows(rows))
                .unwrap_or_default()
        };

        let state = SnapshotState {
            faculty: section("faculty"),
            students: section("students"),
            admins: section("admins"),
            attendance: section("attendance"),
            marks: section("marks"),
        };
        info!(
            "loaded snapshot from {:?}: {} faculty, {} students, {} admins",
            path,
            state.faculty.len(),
            state.students.len(),
            state.admins.len()
        );

        Ok(Self {
            state: RefCell::new(state),
        })
    }

    /// A small built-in dataset for running the dashboard with no server
    /// and no snapshot file.
    pub fn seeded() -> Self {
        let backend = Self::new();
        {
            let mut state = backend.state.borrow_mut();
            state.faculty = vec![
                person("F_001", "Meera Iyer", "meera@example.edu", "2024-01-05"),
                person("F_002", "Arjun Nair", "arjun@example.edu", "2024-02-11"),
            ];
            state.students = vec![
                person("S_001", "Asha Rao", "asha@example.edu", "2024-01-10"),
                person("S_002", "Ravi Kumar", "ravi@example.edu", "2024-02-18"),
                person("S_003", "Divya Menon", "divya@example.edu", "2024-03-02"),
            ];
            state.admins = vec![
                person("A_001", "Priya Shah", "priya@example.edu", "2023-12-20")
                    .with_field("type", "super"),
            ];
            state.attendance = vec![
                attendance_row("S_001", "SUB1", "2024-03-01", "present"),
                attendance_row("S_001", "SUB1", "2024-03-02", "present"),
                attendance_row("S_002", "SUB1", "2024-03-01", "absent"),
                attendance_row("S_002", "SUB1", "2024-03-02", "present"),
            ];
            state.marks = vec![
                mark_row("S_001", "SUB1", 46.0, 50.0),
                mark_row("S_002", "SUB1", 28.0, 50.0),
            ];
        }
        backend
    }

    fn collection<'a>(state: &'a SnapshotState, kind: EntityKind) -> &'a Vec<Record> {
        match kind {
            EntityKind::Faculty => &state.faculty,
            EntityKind::Student => &state.students,
            EntityKind::Admin => &state.admins,
        }
    }

    fn collection_mut<'a>(state: &'a mut SnapshotState, kind: EntityKind) -> &'a mut Vec<Record> {
        match kind {
            EntityKind::Faculty => &mut state.faculty,
            EntityKind::Student => &mut state.students,
            EntityKind::Admin => &mut state.admins,
        }
    }

    fn set_status(&self, kind: EntityKind, id: &str, status: &str, reason: Option<&str>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let rows = Self::collection_mut(&mut state, kind);
        let row = rows
            .iter_mut()
            .find(|r| r.coerce("u_id") == id)
            .ok_or_else(|| anyhow!("{} {} not found", kind.label(), id))?;

        let mut updated = row.clone().with_field("status", status);
        updated = match reason {
            Some(reason) => updated.with_field("block_reason", reason),
            None => updated.with_field("block_reason", crate::data::record::FieldValue::Null),
        };
        *row = updated;
        Ok(())
    }
}

impl Default for SnapshotBackend {
    fn default() -> Self {
        Self::seeded()
    }
}

fn person(u_id: &str, name: &str, email: &str, created: &str) -> Record {
    Record::new()
        .with_field("u_id", u_id)
        .with_field("name", name)
        .with_field("email", email)
        .with_field("phone", "9876543210")
        .with_field("dob", "2001-06-15")
        .with_field("status", "active")
        .with_field("created_at", created)
}

fn attendance_row(student: &str, subject: &str, date: &str, status: &str) -> Record {
    Record::new()
        .with_field("student_id", student)
        .with_field("subject_id", subject)
        .with_field("date", date)
        .with_field("status", status)
}

fn mark_row(student: &str, subject: &str, obtained: f64, max: f64) -> Record {
    Record::new()
        .with_field("student_id", student)
        .with_field("subject_id", subject)
        .with_field("marks_obtained", obtained)
        .with_field("max_marks", max)
}

/// Overlay payload fields onto an existing record.
fn merged(base: &Record, payload: &JsonValue) -> Record {
    let mut body = base.to_json();
    if let (Some(obj), Some(updates)) = (body.as_object_mut(), payload.as_object()) {
        for (key, value) in updates {
            obj.insert(key.clone(), value.clone());
        }
    }
    Record::from_json(&body).unwrap_or_else(|| base.clone())
}

impl Backend for SnapshotBackend {
    fn list_records(&self, kind: EntityKind) -> Result<Vec<Record>> {
        Ok(Self::collection(&self.state.borrow(), kind).clone())
    }

    fn create_record(&self, kind: EntityKind, payload: &JsonValue) -> Result<()> {
        let record = Record::from_json(payload).ok_or_else(|| anyhow!("Payload must be an object"))?;
        let id = record.coerce("u_id");
        if id.is_empty() {
            bail!("Payload is missing u_id");
        }

        let mut state = self.state.borrow_mut();
        let rows = Self::collection_mut(&mut state, kind);
        if rows.iter().any(|r| r.coerce("u_id") == id) {
            bail!("{} {} already exists", kind.label(), id);
        }
        rows.push(record.with_field("status", "active"));
        Ok(())
    }

    fn update_record(&self, kind: EntityKind, id: &str, payload: &JsonValue) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let rows = Self::collection_mut(&mut state, kind);
        let row = rows
            .iter_mut()
            .find(|r| r.coerce("u_id") == id)
            .ok_or_else(|| anyhow!("{} {} not found", kind.label(), id))?;
        *row = merged(row, payload);
        Ok(())
    }

    fn delete_record(&self, kind: EntityKind, id: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let rows = Self::collection_mut(&mut state, kind);
        let before = rows.len();
        rows.retain(|r| r.coerce("u_id") != id);
        if rows.len() == before {
            bail!("{} {} not found", kind.label(), id);
        }
        Ok(())
    }

    fn users(&self, kind: EntityKind) -> Result<Vec<Record>> {
        let state = self.state.borrow();
        Ok(Self::collection(&state, kind)
            .iter()
            .map(|r| {
                Record::new()
                    .with_field("u_id", r.coerce("u_id"))
                    .with_field("name", r.coerce("name"))
                    .with_field("email", r.coerce("email"))
                    .with_field(
                        "status",
                        if r.get("status").is_null() {
                            "active".to_string()
                        } else {
                            r.coerce("status")
                        },
                    )
            })
            .collect())
    }

    fn block_user(&self, kind: EntityKind, id: &str, reason: &str) -> Result<()> {
        self.set_status(kind, id, "blocked", Some(reason))
    }

    fn unblock_user(&self, kind: EntityKind, id: &str) -> Result<()> {
        self.set_status(kind, id, "active", None)
    }

    fn attendance_report(&self) -> Result<Vec<Record>> {
        let state = self.state.borrow();
        Ok(reports::attendance_summary(&state.students, &state.attendance))
    }

    fn performance_report(&self) -> Result<Vec<Record>> {
        let state = self.state.borrow();
        Ok(reports::performance_summary(&state.students, &state.marks))
    }

    fn registrations_report(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Record>> {
        let state = self.state.borrow();
        Ok(reports::registrations_between(&state.students, start, end))
    }

    fn attendance_for(&self, subject_id: &str, date: NaiveDate) -> Result<Vec<Record>> {
        let date = date.to_string();
        let state = self.state.borrow();
        Ok(state
            .attendance
            .iter()
            .filter(|row| row.coerce("subject_id") == subject_id && row.coerce("date") == date)
            .cloned()
            .collect())
    }

    fn mark_attendance(
        &self,
        _faculty_id: &str,
        subject_id: &str,
        date: NaiveDate,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<()> {
        let date = date.to_string();
        let mut state = self.state.borrow_mut();

        if let Some(existing) = state.attendance.iter().find(|row| {
            row.coerce("student_id") == student_id
                && row.coerce("subject_id") == subject_id
                && row.coerce("date") == date
        }) {
            bail!("Attendance already marked as {}", existing.coerce("status"));
        }

        state.attendance.push(
            Record::new()
                .with_field("student_id", student_id)
                .with_field("subject_id", subject_id)
                .with_field("date", date)
                .with_field("status", status.as_str()),
        );
        Ok(())
    }

    fn save_result(
        &self,
        _faculty_id: &str,
        subject_id: &str,
        student_id: &str,
        marks_obtained: f64,
        max_marks: f64,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        // one result per student and subject; a re-entry overwrites
        state.marks.retain(|row| {
            !(row.coerce("student_id") == student_id && row.coerce("subject_id") == subject_id)
        });
        state
            .marks
            .push(mark_row(student_id, subject_id, marks_obtained, max_marks));
        Ok(())
    }

    fn student_profile(&self, student_id: &str) -> Result<Record> {
        let state = self.state.borrow();
        state
            .students
            .iter()
            .find(|r| r.coerce("u_id") == student_id)
            .cloned()
            .ok_or_else(|| anyhow!("Student {} not found", student_id))
    }

    fn student_attendance(&self, student_id: &str) -> Result<Vec<Record>> {
        let state = self.state.borrow();
        Ok(state
            .attendance
            .iter()
            .filter(|row| row.coerce("student_id") == student_id)
            .map(|row| {
                Record::new()
                    .with_field("date", row.coerce("date"))
                    .with_field("subject", row.coerce("subject_id"))
                    .with_field("status", row.coerce("status"))
            })
            .collect())
    }

    fn student_results(&self, student_id: &str) -> Result<Vec<Record>> {
        let state = self.state.borrow();
        Ok(state
            .marks
            .iter()
            .filter(|row| row.coerce("student_id") == student_id)
            .map(|row| {
                Record::new()
                    .with_field("subject", row.coerce("subject_id"))
                    .with_field("obtained", row.get("marks_obtained").clone())
                    .with_field("max", row.get("max_marks").clone())
            })
            .collect())
    }
}
