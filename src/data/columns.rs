use crate::data::record::{FieldValue, Record};

/// Semantic tone attached to a rendered cell. The browser treats fragments
/// as opaque; the terminal layer decides what a tone looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Muted,
    Success,
    Warning,
    Danger,
    Info,
}

/// The rendered form of one cell: display text plus a tone tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub tone: Tone,
}

impl Fragment {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Neutral)
    }
}

/// A pure cell renderer: raw value and full record in, fragment out.
pub type Renderer = fn(&FieldValue, &Record) -> Fragment;

/// Configuration for one column: which field it addresses, how it is
/// labeled, and optionally how its cells are rendered. Descriptors are
/// supplied once per view and never change afterwards.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
    pub render: Option<Renderer>,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            render: None,
        }
    }

    pub fn with_render(mut self, render: Renderer) -> Self {
        self.render = Some(render);
        self
    }
}

/// Attendance percentage badge: comfortable / borderline / shortfall.
pub fn attendance_badge(value: &FieldValue, _record: &Record) -> Fragment {
    match value.as_f64() {
        Some(pct) if pct >= 75.0 => Fragment::new(format!("{}%", value), Tone::Success),
        Some(pct) if pct >= 50.0 => Fragment::new(format!("{}%", value), Tone::Warning),
        Some(_) => Fragment::new(format!("{}%", value), Tone::Danger),
        None => Fragment::new("-", Tone::Muted),
    }
}

/// Letter grade badge used by the performance report.
pub fn grade_badge(value: &FieldValue, _record: &Record) -> Fragment {
    match value.as_str() {
        Some("A") => Fragment::new("A", Tone::Success),
        Some("B") => Fragment::new("B", Tone::Info),
        Some("C") => Fragment::new("C", Tone::Warning),
        Some(other) => Fragment::new(other, Tone::Danger),
        None => Fragment::new("-", Tone::Muted),
    }
}

/// Account status badge for the user management view.
pub fn status_badge(value: &FieldValue, _record: &Record) -> Fragment {
    match value.as_str() {
        Some("active") => Fragment::new("active", Tone::Success),
        Some("blocked") => Fragment::new("blocked", Tone::Danger),
        Some("suspended") => Fragment::new("suspended", Tone::Warning),
        Some(other) => Fragment::new(other, Tone::Neutral),
        // Backends without a status column report everyone as active
        None => Fragment::new("active", Tone::Success),
    }
}

/// Plain percent suffix without banding, e.g. the performance total.
pub fn percent_suffix(value: &FieldValue, _record: &Record) -> Fragment {
    if value.is_null() {
        Fragment::new("-", Tone::Muted)
    } else {
        Fragment::plain(format!("{}%", value))
    }
}
