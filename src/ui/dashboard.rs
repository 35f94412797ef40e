use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, TableState};
use ratatui::{Frame, Terminal};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;
use tracing::{info, warn};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::api_client::{Backend, EntityKind};
use crate::config::Config;
use crate::data::browser::{ActionProvider, RowAction, TabularBrowser};
use crate::data::exporter::Exporter;
use crate::data::record::Record;
use crate::logging::LogRingBuffer;
use crate::session::{Role, Session};
use crate::ui::{self, table_view, MenuItem, Pane, ReportTab};

/// A row-action outcome routed back to the shell. The browser only runs the
/// callback; carrying out the effect (and re-fetching) happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Delete { kind: EntityKind, id: String },
    Block { kind: EntityKind, id: String },
    Unblock { kind: EntityKind, id: String },
}

impl Command {
    fn describe(&self) -> String {
        match self {
            Command::Delete { id, .. } => format!("delete {}", id),
            Command::Block { id, .. } => format!("block {}", id),
            Command::Unblock { id, .. } => format!("unblock {}", id),
        }
    }
}

type CommandQueue = Rc<RefCell<VecDeque<Command>>>;

enum Mode {
    Browse,
    Search,
    Reason { kind: EntityKind, id: String },
    Confirm(Command),
}

enum Flow {
    Continue,
    Quit,
}

/// The dashboard application: a session, a fetch boundary, and one
/// [`TabularBrowser`] per routed pane.
pub struct Dashboard {
    session: Session,
    backend: Box<dyn Backend>,
    config: Config,
    menu: Vec<MenuItem>,
    active_menu: usize,
    pane: Pane,
    browser: Option<TabularBrowser>,
    table_state: TableState,
    search: Input,
    reason: Input,
    mode: Mode,
    status: String,
    status_is_error: bool,
    commands: CommandQueue,
    logs: Option<LogRingBuffer>,
}

impl Dashboard {
    pub fn new(
        session: Session,
        backend: Box<dyn Backend>,
        config: Config,
        logs: Option<LogRingBuffer>,
    ) -> Result<Self> {
        let menu = ui::menu_for(session.role);
        let mut dashboard = Self {
            session,
            backend,
            config,
            menu,
            active_menu: 0,
            pane: Pane::Overview,
            browser: None,
            table_state: TableState::default(),
            search: Input::default(),
            reason: Input::default(),
            mode: Mode::Browse,
            status: String::new(),
            status_is_error: false,
            commands: Rc::new(RefCell::new(VecDeque::new())),
            logs,
        };
        dashboard.open_active_pane()?;
        Ok(dashboard)
    }

    /// Take over the terminal and run until the user quits.
    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if matches!(self.handle_key(key)?, Flow::Quit) {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = text.into();
        self.status_is_error = is_error;
    }

    fn open_active_pane(&mut self) -> Result<()> {
        let key = self.menu[self.active_menu].key;
        self.pane = ui::pane_for(self.session.role, key);
        self.search = Input::default();
        self.table_state.select(Some(0));
        info!("opening pane '{}'", key);
        self.build_browser()
    }

    /// Construct the pane's browser and hand it a freshly fetched
    /// collection. A fetch failure keeps the pane empty and puts the error
    /// on the status line; there is no retry here.
    fn build_browser(&mut self) -> Result<()> {
        self.browser = None;
        let list_size = self.config.behavior.list_page_size;
        let report_size = self.config.behavior.report_page_size;

        let built = match self.pane {
            Pane::Overview => None,
            Pane::EntityList(kind) => {
                let mut browser =
                    TabularBrowser::new(ui::entity_columns(kind), list_size)?
                        .with_empty_message(match kind {
                            EntityKind::Faculty => "No faculty",
                            EntityKind::Student => "No students yet",
                            EntityKind::Admin => "No admins",
                        });
                if matches!(self.session.role, Role::Admin | Role::SuperAdmin) {
                    browser = browser.with_actions(delete_provider(kind, self.commands.clone()));
                }
                Some((browser, self.backend.list_records(kind)))
            }
            Pane::UserManagement(kind) => {
                let browser = TabularBrowser::new(ui::user_columns(), report_size)?
                    .with_empty_message(format!("No {} records found.", kind.role_segment()))
                    .with_actions(user_actions_provider(kind, self.commands.clone()));
                Some((browser, self.backend.users(kind)))
            }
            Pane::Reports(tab) => {
                let (columns, fetched) = match tab {
                    ReportTab::Attendance => (
                        crate::reports::attendance_columns(),
                        self.backend.attendance_report(),
                    ),
                    ReportTab::Performance => (
                        crate::reports::performance_columns(),
                        self.backend.performance_report(),
                    ),
                    ReportTab::Registrations => (
                        crate::reports::registration_columns(),
                        self.backend.registrations_report(None, None),
                    ),
                };
                let browser = TabularBrowser::new(columns, report_size)?
                    .with_empty_message(match tab {
                        ReportTab::Attendance => "No attendance records found.",
                        ReportTab::Performance => "No performance records found.",
                        ReportTab::Registrations => "No students found in this date range.",
                    });
                Some((browser, fetched))
            }
            Pane::Profile => {
                let browser = TabularBrowser::new(ui::profile_columns(), report_size)?
                    .with_empty_message("No profile data loaded.");
                let fetched = self
                    .backend
                    .student_profile(&self.session.user_id)
                    .map(|profile| profile_rows(&profile));
                Some((browser, fetched))
            }
            Pane::MyAttendance => {
                let browser = TabularBrowser::new(ui::my_attendance_columns(), report_size)?
                    .with_empty_message("No attendance records");
                Some((browser, self.backend.student_attendance(&self.session.user_id)))
            }
            Pane::MyResults => {
                let browser = TabularBrowser::new(ui::my_results_columns(), report_size)?
                    .with_empty_message("No marks found");
                Some((browser, self.backend.student_results(&self.session.user_id)))
            }
        };

        if let Some((browser, fetched)) = built {
            match fetched {
                Ok(records) => {
                    self.browser = Some(browser.with_records(records));
                }
                Err(err) => {
                    warn!("fetch failed: {}", err);
                    self.browser = Some(browser);
                    self.set_status(err.to_string(), true);
                }
            }
        }
        Ok(())
    }

    /// Re-fetch the current pane's collection and re-supply it to the
    /// browser; query and page survive per the browser's clamping rules.
    fn refresh(&mut self) {
        let fetched = match self.pane {
            Pane::Overview => return,
            Pane::EntityList(kind) => self.backend.list_records(kind),
            Pane::UserManagement(kind) => self.backend.users(kind),
            Pane::Reports(ReportTab::Attendance) => self.backend.attendance_report(),
            Pane::Reports(ReportTab::Performance) => self.backend.performance_report(),
            Pane::Reports(ReportTab::Registrations) => {
                self.backend.registrations_report(None, None)
            }
            Pane::Profile => self
                .backend
                .student_profile(&self.session.user_id)
                .map(|profile| profile_rows(&profile)),
            Pane::MyAttendance => self.backend.student_attendance(&self.session.user_id),
            Pane::MyResults => self.backend.student_results(&self.session.user_id),
        };

        match (fetched, self.browser.as_mut()) {
            (Ok(records), Some(browser)) => browser.set_records(records),
            (Err(err), _) => {
                warn!("refresh failed: {}", err);
                self.set_status(err.to_string(), true);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        if key.kind != KeyEventKind::Press {
            return Ok(Flow::Continue);
        }

        if matches!(self.mode, Mode::Search) {
            self.handle_search_key(key);
        } else if matches!(self.mode, Mode::Reason { .. }) {
            self.handle_reason_key(key);
        } else if matches!(self.mode, Mode::Confirm(_)) {
            self.handle_confirm_key(key);
        } else {
            return self.handle_browse_key(key);
        }
        Ok(Flow::Continue)
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.mode = Mode::Browse;
            }
            _ => {
                self.search.handle_event(&Event::Key(key));
                let query = self.search.value().to_string();
                if let Some(browser) = self.browser.as_mut() {
                    browser.set_query(&query);
                }
                self.table_state.select(Some(0));
            }
        }
    }

    fn handle_reason_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.set_status("Cancelled", false);
            }
            KeyCode::Enter => {
                let reason = self.reason.value().trim().to_string();
                if reason.is_empty() {
                    self.set_status("Please provide a reason.", true);
                    return;
                }
                let Mode::Reason { kind, id } = std::mem::replace(&mut self.mode, Mode::Browse)
                else {
                    return;
                };
                match self.backend.block_user(kind, &id, &reason) {
                    Ok(()) => {
                        info!("blocked {} ({})", id, reason);
                        self.set_status(format!("{} has been blocked.", id), false);
                        self.refresh();
                    }
                    Err(err) => self.set_status(err.to_string(), true),
                }
            }
            _ => {
                self.reason.handle_event(&Event::Key(key));
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
        let Mode::Confirm(command) = std::mem::replace(&mut self.mode, Mode::Browse) else {
            return;
        };
        if confirmed {
            self.execute(command);
        } else {
            self.set_status("Cancelled", false);
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<Flow> {
        match key.code {
            KeyCode::Char('q') => return Ok(Flow::Quit),
            KeyCode::Tab => {
                self.active_menu = (self.active_menu + 1) % self.menu.len();
                self.open_active_pane()?;
            }
            KeyCode::BackTab => {
                self.active_menu = (self.active_menu + self.menu.len() - 1) % self.menu.len();
                self.open_active_pane()?;
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::PageDown | KeyCode::Char(']') => {
                if let Some(browser) = self.browser.as_mut() {
                    if browser.next_page() {
                        self.table_state.select(Some(0));
                    }
                }
            }
            KeyCode::PageUp | KeyCode::Char('[') => {
                if let Some(browser) = self.browser.as_mut() {
                    if browser.prev_page() {
                        self.table_state.select(Some(0));
                    }
                }
            }
            KeyCode::Char('/') => {
                if self.browser.is_some() {
                    self.mode = Mode::Search;
                }
            }
            KeyCode::Char('t') => self.cycle_tab()?,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('e') => self.export(false),
            KeyCode::Char('E') => self.export(true),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c.to_digit(10).unwrap() as usize - 1;
                self.invoke_row_action(index);
            }
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn cycle_tab(&mut self) -> Result<()> {
        match self.pane {
            Pane::Reports(tab) => {
                self.pane = Pane::Reports(tab.next());
                self.search = Input::default();
                self.table_state.select(Some(0));
                self.build_browser()?;
            }
            Pane::UserManagement(kind) => {
                let next = match kind {
                    EntityKind::Faculty => EntityKind::Student,
                    // the admins tab exists for super admins only
                    EntityKind::Student if self.session.role == Role::SuperAdmin => {
                        EntityKind::Admin
                    }
                    _ => EntityKind::Faculty,
                };
                self.pane = Pane::UserManagement(next);
                self.search = Input::default();
                self.table_state.select(Some(0));
                self.build_browser()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(browser) = &self.browser else { return };
        let count = browser.visible().len();
        if count == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, count as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn invoke_row_action(&mut self, action_index: usize) {
        let row = self.table_state.selected().unwrap_or(0);
        let invoked = match &self.browser {
            Some(browser) => browser.invoke_action(row, action_index),
            None => false,
        };
        if !invoked {
            return;
        }

        // The callback queued commands; the browser's collection is still
        // whatever it was. Effects and the re-fetch happen here.
        let queued: Vec<Command> = self.commands.borrow_mut().drain(..).collect();
        for command in queued {
            self.dispatch(command);
        }
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::Block { kind, id } => {
                self.reason = Input::default();
                self.set_status(format!("Reason for blocking {}:", id), false);
                self.mode = Mode::Reason { kind, id };
            }
            command if self.config.behavior.confirm_destructive => {
                self.set_status(format!("Press y to confirm: {}", command.describe()), false);
                self.mode = Mode::Confirm(command);
            }
            command => self.execute(command),
        }
    }

    fn execute(&mut self, command: Command) {
        let outcome = match &command {
            Command::Delete { kind, id } => self
                .backend
                .delete_record(*kind, id)
                .map(|_| format!("{} {} deleted", kind.label(), id)),
            Command::Unblock { kind, id } => self
                .backend
                .unblock_user(*kind, id)
                .map(|_| format!("{} has been unblocked.", id)),
            Command::Block { .. } => return,
        };

        match outcome {
            Ok(message) => {
                info!("{}", message);
                self.set_status(message, false);
                self.refresh();
            }
            Err(err) => self.set_status(err.to_string(), true),
        }
    }

    fn export(&mut self, as_json: bool) {
        let stem = export_stem(self.pane);
        let result = {
            let Some(browser) = &self.browser else { return };
            let records = browser.filtered();
            if as_json {
                Exporter::to_json_file(&records, browser.columns(), stem)
            } else {
                Exporter::to_csv_file(&records, browser.columns(), stem)
            }
        };
        match result {
            Ok(path) => {
                let message = format!("Exported to {}", path.display());
                info!("{}", message);
                self.set_status(message, false);
            }
            Err(err) => self.set_status(err.to_string(), true),
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(0)])
            .split(frame.area());
        self.draw_menu(frame, chunks[0]);
        self.draw_content(frame, chunks[1]);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .menu
            .iter()
            .map(|entry| ListItem::new(entry.label))
            .collect();

        let title = format!("{} · {}", self.session.role.title(), self.session.user_id);
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.active_menu));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_content(&mut self, frame: &mut Frame, area: Rect) {
        let log_height = if self.config.display.show_log_panel { 6 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(log_height),
            ])
            .split(area);

        self.draw_input_bar(frame, chunks[0]);
        self.draw_table(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
        self.draw_status(frame, chunks[3]);
        if log_height > 0 {
            self.draw_logs(frame, chunks[4]);
        }
    }

    fn draw_input_bar(&self, frame: &mut Frame, area: Rect) {
        let (title, text) = match &self.mode {
            Mode::Reason { id, .. } => (
                format!("Reason for blocking {}", id),
                self.reason.value().to_string(),
            ),
            _ => ("Search".to_string(), self.search.value().to_string()),
        };
        let style = match self.mode {
            Mode::Search | Mode::Reason { .. } => Style::default().fg(Color::Cyan),
            _ => Style::default(),
        };
        let bar = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(bar, area);
    }

    fn draw_table(&mut self, frame: &mut Frame, area: Rect) {
        let title = pane_title(self.pane);
        match &self.browser {
            None => {
                let text = overview_text(self.session.role);
                let overview = Paragraph::new(text)
                    .block(Block::default().borders(Borders::ALL).title(title));
                frame.render_widget(overview, area);
            }
            Some(browser) => {
                let view = browser.render();
                match &view.placeholder {
                    Some(placeholder) => {
                        let empty = Paragraph::new(placeholder.clone())
                            .style(Style::default().fg(Color::DarkGray))
                            .block(Block::default().borders(Borders::ALL).title(title));
                        frame.render_widget(empty, area);
                    }
                    None => {
                        let table = table_view::table_for(&view, title);
                        frame.render_stateful_widget(table, area, &mut self.table_state);
                    }
                }
            }
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.browser {
            Some(browser) => {
                table_view::footer_line(&browser.render(), self.config.display.show_totals)
            }
            None => String::new(),
        };
        frame.render_widget(
            Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let style = if self.status_is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        let hint = if self.status.is_empty() {
            "Tab: menu · /: search · [ ]: pages · 1-9: row actions · e/E: export · r: refresh · q: quit"
                .to_string()
        } else {
            self.status.clone()
        };
        frame.render_widget(Paragraph::new(hint).style(style), area);
    }

    fn draw_logs(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = match &self.logs {
            Some(buffer) => buffer
                .get_recent(4)
                .into_iter()
                .map(|entry| Line::from(entry.format_for_display()))
                .collect(),
            None => Vec::new(),
        };
        let panel = Paragraph::new(lines)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Log"));
        frame.render_widget(panel, area);
    }
}

fn delete_provider(kind: EntityKind, queue: CommandQueue) -> ActionProvider {
    Box::new(move |record: &Record| {
        let id = record.coerce("u_id");
        let queue = queue.clone();
        vec![RowAction::new("delete", move |_record: &Record| {
            queue
                .borrow_mut()
                .push_back(Command::Delete { kind, id: id.clone() });
        })]
    })
}

/// Blocked users get an unblock action, everyone else a block action.
fn user_actions_provider(kind: EntityKind, queue: CommandQueue) -> ActionProvider {
    Box::new(move |record: &Record| {
        let id = record.coerce("u_id");
        let blocked = record.coerce("status") == "blocked";
        let queue = queue.clone();
        if blocked {
            vec![RowAction::new("unblock", move |_record: &Record| {
                queue
                    .borrow_mut()
                    .push_back(Command::Unblock { kind, id: id.clone() });
            })]
        } else {
            vec![RowAction::new("block", move |_record: &Record| {
                queue
                    .borrow_mut()
                    .push_back(Command::Block { kind, id: id.clone() });
            })]
        }
    })
}

/// Flatten a profile record into field/value rows for display.
fn profile_rows(profile: &Record) -> Vec<Record> {
    let mut names: Vec<&str> = profile.field_names();
    names.sort_unstable();
    names
        .into_iter()
        .map(|name| {
            Record::new()
                .with_field("field", name)
                .with_field("value", profile.coerce(name))
        })
        .collect()
}

fn pane_title(pane: Pane) -> &'static str {
    match pane {
        Pane::Overview => "Overview",
        Pane::EntityList(EntityKind::Faculty) => "Faculty List",
        Pane::EntityList(EntityKind::Student) => "Student List",
        Pane::EntityList(EntityKind::Admin) => "Admins",
        Pane::UserManagement(kind) => match kind {
            EntityKind::Faculty => "User Management · Faculty",
            EntityKind::Student => "User Management · Students",
            EntityKind::Admin => "User Management · Admins",
        },
        Pane::Reports(tab) => tab.title(),
        Pane::Profile => "My Profile",
        Pane::MyAttendance => "My Attendance",
        Pane::MyResults => "My Marks",
    }
}

fn export_stem(pane: Pane) -> &'static str {
    match pane {
        Pane::Overview => "overview",
        Pane::EntityList(EntityKind::Faculty) => "faculty",
        Pane::EntityList(EntityKind::Student) => "students",
        Pane::EntityList(EntityKind::Admin) => "admins",
        Pane::UserManagement(_) => "users",
        Pane::Reports(ReportTab::Attendance) => "attendance_report",
        Pane::Reports(ReportTab::Performance) => "performance_report",
        Pane::Reports(ReportTab::Registrations) => "registrations_report",
        Pane::Profile => "profile",
        Pane::MyAttendance => "my_attendance",
        Pane::MyResults => "my_results",
    }
}

fn overview_text(role: Role) -> String {
    match role {
        Role::SuperAdmin | Role::Admin => {
            "Use the menu to manage faculty, students, and view system reports.".to_string()
        }
        Role::Faculty => "Use the menu to browse your student list.".to_string(),
        Role::Student => "Use Profile / Attendance / Results from the menu.".to_string(),
    }
}
