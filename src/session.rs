use std::fmt;

/// The four access levels the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Admin,
    Faculty,
    Student,
}

impl Role {
    pub fn parse(text: &str) -> Option<Role> {
        match text.to_lowercase().as_str() {
            "super_admin" | "super-admin" | "superadmin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "faculty" => Some(Role::Faculty),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Faculty => "faculty",
            Role::Student => "student",
        }
    }

    /// Human form for the account header.
    pub fn title(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Faculty => "Faculty",
            Role::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated identity, passed explicitly into the shell. There is no
/// ambient login state anywhere; whoever builds the shell owns this object.
#[derive(Debug, Clone)]
pub struct Session {
    pub role: Role,
    pub user_id: String,
    pub email: Option<String>,
    pub token: Option<String>,
}

impl Session {
    pub fn new(role: Role, user_id: impl Into<String>) -> Self {
        Self {
            role,
            user_id: user_id.into(),
            email: None,
            token: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse("super_admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("faculty"), Some(Role::Faculty));
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse("registrar"), None);
    }

    #[test]
    fn test_session_builder() {
        let session = Session::new(Role::Faculty, "F_001").with_email("f@example.edu");
        assert_eq!(session.user_id, "F_001");
        assert_eq!(session.email.as_deref(), Some("f@example.edu"));
        assert!(session.token.is_none());
    }
}
