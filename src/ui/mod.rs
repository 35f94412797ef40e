//! User interface layer: role-driven menu and pane routing, plus the
//! dashboard application and its table rendering.

pub mod dashboard;
pub mod table_view;

use crate::api_client::EntityKind;
use crate::data::columns::{status_badge, ColumnSpec};
use crate::session::Role;

/// One sidebar entry. Keys are stable route identifiers; labels are what
/// the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub key: &'static str,
    pub label: &'static str,
}

const fn item(key: &'static str, label: &'static str) -> MenuItem {
    MenuItem { key, label }
}

/// Sidebar contents per role. Routing is a pure function of the session's
/// role; there is nothing to mutate after login.
pub fn menu_for(role: Role) -> Vec<MenuItem> {
    match role {
        Role::SuperAdmin => vec![
            item("overview", "Overview"),
            item("admins", "Manage Roles"),
            item("reports", "Reports"),
            item("settings", "User Management"),
        ],
        Role::Admin => vec![
            item("overview", "Overview"),
            item("faculty", "Faculty"),
            item("students", "Students"),
            item("reports", "Reports"),
        ],
        Role::Faculty => vec![
            item("overview", "Overview"),
            item("students", "Student List"),
        ],
        Role::Student => vec![
            item("overview", "Overview"),
            item("profile", "Profile"),
            item("attendance", "Attendance"),
            item("results", "Results"),
        ],
    }
}

/// The report views reachable from the Reports pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTab {
    Attendance,
    Performance,
    Registrations,
}

impl ReportTab {
    pub fn next(self) -> Self {
        match self {
            ReportTab::Attendance => ReportTab::Performance,
            ReportTab::Performance => ReportTab::Registrations,
            ReportTab::Registrations => ReportTab::Attendance,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportTab::Attendance => "Attendance Report",
            ReportTab::Performance => "Performance Report",
            ReportTab::Registrations => "Date-wise Registrations",
        }
    }
}

/// A routed dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Overview,
    EntityList(EntityKind),
    Reports(ReportTab),
    UserManagement(EntityKind),
    Profile,
    MyAttendance,
    MyResults,
}

/// Resolve a menu key for a role. Unknown keys fall back to Overview
/// rather than erroring; the menu is the only source of keys anyway.
pub fn pane_for(role: Role, key: &str) -> Pane {
    match (role, key) {
        (Role::SuperAdmin, "admins") => Pane::EntityList(EntityKind::Admin),
        (Role::SuperAdmin, "reports") | (Role::Admin, "reports") => {
            Pane::Reports(ReportTab::Attendance)
        }
        (Role::SuperAdmin, "settings") => Pane::UserManagement(EntityKind::Faculty),
        (Role::Admin, "faculty") => Pane::EntityList(EntityKind::Faculty),
        (Role::Admin, "students") | (Role::Faculty, "students") => {
            Pane::EntityList(EntityKind::Student)
        }
        (Role::Student, "profile") => Pane::Profile,
        (Role::Student, "attendance") => Pane::MyAttendance,
        (Role::Student, "results") => Pane::MyResults,
        _ => Pane::Overview,
    }
}

/// List columns for the three managed collections.
pub fn entity_columns(kind: EntityKind) -> Vec<ColumnSpec> {
    match kind {
        EntityKind::Faculty | EntityKind::Student => vec![
            ColumnSpec::new("u_id", "ID"),
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("email", "Email"),
            ColumnSpec::new("phone", "Phone"),
            ColumnSpec::new("dob", "DOB"),
        ],
        EntityKind::Admin => vec![
            ColumnSpec::new("u_id", "ID"),
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("type", "Type"),
            ColumnSpec::new("dob", "DOB"),
        ],
    }
}

/// Columns for the user management view.
pub fn user_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("u_id", "ID"),
        ColumnSpec::new("name", "Name"),
        ColumnSpec::new("email", "Email"),
        ColumnSpec::new("status", "Status").with_render(status_badge),
    ]
}

/// Columns for the student's own attendance and results panes.
pub fn my_attendance_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("date", "Date"),
        ColumnSpec::new("subject", "Subject"),
        ColumnSpec::new("status", "Status"),
    ]
}

pub fn my_results_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("subject", "Subject"),
        ColumnSpec::new("obtained", "Obtained"),
        ColumnSpec::new("max", "Max"),
    ]
}

/// Profile is shown as field/value rows through the same browser.
pub fn profile_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("field", "Field"),
        ColumnSpec::new("value", "Value"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_per_role() {
        let keys: Vec<&str> = menu_for(Role::SuperAdmin).iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["overview", "admins", "reports", "settings"]);

        let keys: Vec<&str> = menu_for(Role::Admin).iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["overview", "faculty", "students", "reports"]);

        let keys: Vec<&str> = menu_for(Role::Faculty).iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["overview", "students"]);

        let keys: Vec<&str> = menu_for(Role::Student).iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["overview", "profile", "attendance", "results"]);
    }

    #[test]
    fn test_unknown_key_routes_to_overview() {
        assert_eq!(pane_for(Role::Admin, "nonsense"), Pane::Overview);
        // settings is super-admin only
        assert_eq!(pane_for(Role::Admin, "settings"), Pane::Overview);
    }

    #[test]
    fn test_role_scoped_routes() {
        assert_eq!(
            pane_for(Role::SuperAdmin, "admins"),
            Pane::EntityList(EntityKind::Admin)
        );
        assert_eq!(
            pane_for(Role::Faculty, "students"),
            Pane::EntityList(EntityKind::Student)
        );
        assert_eq!(pane_for(Role::Student, "results"), Pane::MyResults);
    }

    #[test]
    fn test_report_tab_cycle() {
        let tab = ReportTab::Attendance;
        assert_eq!(tab.next().next().next(), ReportTab::Attendance);
    }
}
