use chrono::{Local, NaiveDate};
use regex::Regex;
use serde_json::{json, Value as JsonValue};
use std::fmt;

use crate::api_client::EntityKind;

/// A validation failure tied to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Input for creating or updating a faculty/student/admin record. Admin
/// records additionally carry a type (`normal` or `super`).
#[derive(Debug, Clone, Default)]
pub struct PersonForm {
    pub u_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub admin_type: Option<String>,
}

impl PersonForm {
    /// Validates every field and builds the JSON payload the backend
    /// expects. The first failing field wins, mirroring how the form
    /// surfaces one error at a time.
    pub fn validate(&self, kind: EntityKind) -> Result<JsonValue, FieldError> {
        validate_id(&self.u_id, kind)?;
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        let dob = parse_dob(&self.dob)?;
        validate_dob(dob, Local::now().date_naive())?;

        let mut payload = json!({
            "u_id": self.u_id,
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "dob": self.dob,
        });

        if kind == EntityKind::Admin {
            let admin_type = self.admin_type.as_deref().unwrap_or("normal");
            if admin_type != "normal" && admin_type != "super" {
                return Err(FieldError::new("type", "Admin type must be normal or super"));
            }
            payload["type"] = json!(admin_type);
        }

        Ok(payload)
    }
}

/// IDs follow `<prefix>_<three digits>`, e.g. `S_001`.
pub fn validate_id(u_id: &str, kind: EntityKind) -> Result<(), FieldError> {
    if u_id.is_empty() {
        return Err(FieldError::new("u_id", "ID is required"));
    }
    let pattern = format!(r"^{}_\d{{3}}$", kind.id_prefix());
    let re = Regex::new(&pattern).expect("static ID pattern");
    if !re.is_match(u_id) {
        return Err(FieldError::new(
            "u_id",
            format!(
                "{} ID must be in format {}_XXX (e.g., {}_001)",
                kind.label(),
                kind.id_prefix(),
                kind.id_prefix()
            ),
        ));
    }
    Ok(())
}

/// Names start with a letter and contain only letters, spaces, and dots.
pub fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.is_empty() {
        return Err(FieldError::new("name", "Name is required"));
    }
    if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(FieldError::new("name", "Name must start with an alphabet"));
    }
    let re = Regex::new(r"^[a-zA-Z\s\.]+$").expect("static name pattern");
    if !re.is_match(name) {
        return Err(FieldError::new(
            "name",
            "Name can only contain letters, spaces, and dots",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    let re = Regex::new(r"^[\w\.\-]+@[\w\.\-]+\.\w+$").expect("static email pattern");
    if !re.is_match(email) {
        return Err(FieldError::new("email", "Invalid email format"));
    }
    Ok(())
}

/// Phone is optional, but when supplied must be exactly 10 digits.
pub fn validate_phone(phone: &str) -> Result<(), FieldError> {
    if phone.is_empty() {
        return Ok(());
    }
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(
            "phone",
            "Phone number must be exactly 10 digits",
        ));
    }
    Ok(())
}

pub fn parse_dob(dob: &str) -> Result<NaiveDate, FieldError> {
    if dob.is_empty() {
        return Err(FieldError::new("dob", "Date of birth is required"));
    }
    NaiveDate::parse_from_str(dob, "%Y-%m-%d")
        .map_err(|_| FieldError::new("dob", "Date of birth must be YYYY-MM-DD"))
}

/// No future or current date, and a minimum age of 4 years.
pub fn validate_dob(dob: NaiveDate, today: NaiveDate) -> Result<(), FieldError> {
    if dob >= today {
        return Err(FieldError::new(
            "dob",
            "Date of birth cannot be in the future or today",
        ));
    }

    let age = today.years_since(dob).unwrap_or(0);
    if age < 4 {
        return Err(FieldError::new("dob", "Minimum age must be 4 years"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(u_id: &str) -> PersonForm {
        PersonForm {
            u_id: u_id.to_string(),
            name: "Asha Rao".to_string(),
            email: "asha@example.edu".to_string(),
            phone: "9876543210".to_string(),
            dob: "2001-06-15".to_string(),
            admin_type: None,
        }
    }

    #[test]
    fn test_id_format_per_kind() {
        assert!(validate_id("S_001", EntityKind::Student).is_ok());
        assert!(validate_id("F_123", EntityKind::Faculty).is_ok());
        assert!(validate_id("A_001", EntityKind::Admin).is_ok());

        assert!(validate_id("S_1", EntityKind::Student).is_err());
        assert!(validate_id("S_0001", EntityKind::Student).is_err());
        assert!(validate_id("F_001", EntityKind::Student).is_err());
        assert!(validate_id("", EntityKind::Student).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Asha Rao").is_ok());
        assert!(validate_name("J. K. Iyer").is_ok());
        assert!(validate_name("Rohan@#das").is_err());
        assert!(validate_name("1Asha").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("a.b-c@uni.example.edu").is_ok());
        assert!(validate_email("9start@uni.edu").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("x@nodot").is_err());
    }

    #[test]
    fn test_phone_optional_but_strict() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("98765").is_err());
        assert!(validate_phone("98765432100").is_err());
        assert!(validate_phone("98765abcde").is_err());
    }

    #[test]
    fn test_dob_bounds() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        assert!(validate_dob(NaiveDate::from_ymd_opt(2001, 6, 15).unwrap(), today).is_ok());
        // today and future rejected
        assert!(validate_dob(today, today).is_err());
        assert!(validate_dob(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(), today).is_err());
        // under four years old
        assert!(validate_dob(NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(), today).is_err());
        // exactly four years ago passes
        assert!(validate_dob(NaiveDate::from_ymd_opt(2022, 8, 7).unwrap(), today).is_ok());
    }

    #[test]
    fn test_payload_includes_admin_type() {
        let mut f = form("A_002");
        f.admin_type = Some("super".to_string());
        let payload = f.validate(EntityKind::Admin).unwrap();
        assert_eq!(payload["type"], "super");
        assert_eq!(payload["u_id"], "A_002");

        let payload = form("S_002").validate(EntityKind::Student).unwrap();
        assert!(payload.get("type").is_none());
    }

    #[test]
    fn test_first_failing_field_wins() {
        let mut f = form("S_002");
        f.email = "bad".to_string();
        f.phone = "123".to_string();
        let err = f.validate(EntityKind::Student).unwrap_err();
        assert_eq!(err.field, "email");
    }
}
