use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::data::record::Record;
use crate::session::Session;

/// The three record collections the admin side manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Faculty,
    Student,
    Admin,
}

impl EntityKind {
    /// Collection segment in admin routes, e.g. `/api/admin/students`.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Faculty => "faculty",
            EntityKind::Student => "students",
            EntityKind::Admin => "admins",
        }
    }

    /// Singular role segment used by the user management routes.
    pub fn role_segment(&self) -> &'static str {
        match self {
            EntityKind::Faculty => "faculty",
            EntityKind::Student => "student",
            EntityKind::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Faculty => "Faculty",
            EntityKind::Student => "Student",
            EntityKind::Admin => "Admin",
        }
    }

    /// ID prefix letter, e.g. `S` for `S_001`.
    pub fn id_prefix(&self) -> char {
        match self {
            EntityKind::Faculty => 'F',
            EntityKind::Student => 'S',
            EntityKind::Admin => 'A',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

/// The fetch boundary the shell talks through. Every method blocks until it
/// has a finished collection (or an error); nothing here hands back futures,
/// and nothing here retries. Staleness between a fetch and the next render
/// is the caller's concern.
pub trait Backend {
    fn list_records(&self, kind: EntityKind) -> Result<Vec<Record>>;
    fn create_record(&self, kind: EntityKind, payload: &JsonValue) -> Result<()>;
    fn update_record(&self, kind: EntityKind, id: &str, payload: &JsonValue) -> Result<()>;
    fn delete_record(&self, kind: EntityKind, id: &str) -> Result<()>;

    /// User listing with account `status`, for the management view.
    fn users(&self, kind: EntityKind) -> Result<Vec<Record>>;
    fn block_user(&self, kind: EntityKind, id: &str, reason: &str) -> Result<()>;
    fn unblock_user(&self, kind: EntityKind, id: &str) -> Result<()>;

    fn attendance_report(&self) -> Result<Vec<Record>>;
    fn performance_report(&self) -> Result<Vec<Record>>;
    fn registrations_report(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Record>>;

    /// Attendance already marked for a subject on a date.
    fn attendance_for(&self, subject_id: &str, date: NaiveDate) -> Result<Vec<Record>>;
    fn mark_attendance(
        &self,
        faculty_id: &str,
        subject_id: &str,
        date: NaiveDate,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<()>;
    fn save_result(
        &self,
        faculty_id: &str,
        subject_id: &str,
        student_id: &str,
        marks_obtained: f64,
        max_marks: f64,
    ) -> Result<()>;

    fn student_profile(&self, student_id: &str) -> Result<Record>;
    fn student_attendance(&self, student_id: &str) -> Result<Vec<Record>>;
    fn student_results(&self, student_id: &str) -> Result<Vec<Record>>;
}

/// HTTP implementation of [`Backend`] over the service's JSON API.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::blocking::Client,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, session: &Session) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
            token: session.token.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::blocking::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Surfaces the backend's `{"error": ...}` body when a call fails.
    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .json::<JsonValue>()
            .ok()
            .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());
        Err(anyhow!("API error: {}", detail))
    }

    fn get_records(&self, path: &str) -> Result<Vec<Record>> {
        let response = Self::check(self.request(reqwest::Method::GET, path).send()?)?;
        let rows: Vec<JsonValue> = response.json()?;
        Ok(Record::from_rows(&rows))
    }

    fn send_json(&self, method: reqwest::Method, path: &str, body: &JsonValue) -> Result<()> {
        let response = self.request(method, path).json(body).send()?;
        Self::check(response)?;
        Ok(())
    }
}

impl Backend for HttpBackend {
    fn list_records(&self, kind: EntityKind) -> Result<Vec<Record>> {
        self.get_records(&format!("/api/admin/{}", kind.collection()))
    }

    fn create_record(&self, kind: EntityKind, payload: &JsonValue) -> Result<()> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/api/admin/{}", kind.collection()),
            payload,
        )
    }

    fn update_record(&self, kind: EntityKind, id: &str, payload: &JsonValue) -> Result<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/api/admin/{}/{}", kind.collection(), id),
            payload,
        )
    }

    fn delete_record(&self, kind: EntityKind, id: &str) -> Result<()> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/admin/{}/{}", kind.collection(), id),
            )
            .send()?;
        Self::check(response)?;
        Ok(())
    }

    fn users(&self, kind: EntityKind) -> Result<Vec<Record>> {
        self.get_records(&format!("/api/admin/users/{}", kind.role_segment()))
    }

    fn block_user(&self, kind: EntityKind, id: &str, reason: &str) -> Result<()> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/api/admin/users/{}/{}/block", kind.role_segment(), id),
            &serde_json::json!({ "reason": reason }),
        )
    }

    fn unblock_user(&self, kind: EntityKind, id: &str) -> Result<()> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/api/admin/users/{}/{}/unblock", kind.role_segment(), id),
            )
            .send()?;
        Self::check(response)?;
        Ok(())
    }

    fn attendance_report(&self) -> Result<Vec<Record>> {
        self.get_records("/api/admin/reports/attendance")
    }

    fn performance_report(&self) -> Result<Vec<Record>> {
        self.get_records("/api/admin/reports/performance")
    }

    fn registrations_report(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Record>> {
        let start = start.map(|d| d.to_string()).unwrap_or_default();
        let end = end.map(|d| d.to_string()).unwrap_or_default();
        self.get_records(&format!(
            "/api/admin/reports/registrations?start_date={}&end_date={}",
            start, end
        ))
    }

    fn attendance_for(&self, subject_id: &str, date: NaiveDate) -> Result<Vec<Record>> {
        self.get_records(&format!(
            "/api/faculty/attendance?subject_id={}&date={}",
            subject_id, date
        ))
    }

    fn mark_attendance(
        &self,
        faculty_id: &str,
        subject_id: &str,
        date: NaiveDate,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<()> {
        self.send_json(
            reqwest::Method::POST,
            "/api/faculty/attendance",
            &serde_json::json!({
                "faculty_id": faculty_id,
                "subject_id": subject_id,
                "date": date.to_string(),
                "statusMap": { student_id: status.as_str() },
            }),
        )
    }

    fn save_result(
        &self,
        faculty_id: &str,
        subject_id: &str,
        student_id: &str,
        marks_obtained: f64,
        max_marks: f64,
    ) -> Result<()> {
        self.send_json(
            reqwest::Method::POST,
            "/api/faculty/results",
            &serde_json::json!({
                "faculty_id": faculty_id,
                "subject_id": subject_id,
                "marksMap": { student_id: marks_obtained },
                "max_marks": max_marks,
            }),
        )
    }

    fn student_profile(&self, student_id: &str) -> Result<Record> {
        let response = Self::check(
            self.request(
                reqwest::Method::GET,
                &format!("/api/student/{}/profile", student_id),
            )
            .send()?,
        )?;
        let body: JsonValue = response.json()?;
        // Some deployments wrap the profile in a data envelope
        let profile = body.get("data").unwrap_or(&body);
        Record::from_json(profile).ok_or_else(|| anyhow!("Malformed profile payload"))
    }

    fn student_attendance(&self, student_id: &str) -> Result<Vec<Record>> {
        self.get_records(&format!("/api/student/{}/attendance", student_id))
    }

    fn student_results(&self, student_id: &str) -> Result<Vec<Record>> {
        self.get_records(&format!("/api/student/{}/results", student_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_segments() {
        assert_eq!(EntityKind::Student.collection(), "students");
        assert_eq!(EntityKind::Student.role_segment(), "student");
        assert_eq!(EntityKind::Faculty.collection(), "faculty");
        assert_eq!(EntityKind::Admin.id_prefix(), 'A');
    }

    #[test]
    fn test_base_url_normalized() {
        let session = Session::new(crate::session::Role::Admin, "A_001");
        let backend = HttpBackend::new("http://localhost:5000/", &session);
        assert_eq!(backend.base_url, "http://localhost:5000");
    }
}
