use anyhow::{anyhow, bail, Result};
use crossterm::style::Stylize;
use std::env;
use std::path::PathBuf;

mod table_print;

use sdms_cli::api_client::{Backend, EntityKind, HttpBackend};
use sdms_cli::config::Config;
use sdms_cli::logging;
use sdms_cli::reports;
use sdms_cli::session::{Role, Session};
use sdms_cli::snapshot::SnapshotBackend;
use sdms_cli::ui;
use sdms_cli::ui::dashboard::Dashboard;

fn print_help() {
    println!("{}", "sdms-cli - student data management dashboard".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  sdms-cli [OPTIONS]");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {}              - Show this help",
        "--help".green()
    );
    println!(
        "  {}   - Write an annotated default config file",
        "--generate-config".green()
    );
    println!(
        "  {} [FILE]    - Browse a local snapshot instead of a server",
        "--offline".green()
    );
    println!(
        "  {} URL        - Service base URL (overrides config)",
        "--server".green()
    );
    println!(
        "  {} ROLE         - super_admin | admin | faculty | student",
        "--role".green()
    );
    println!(
        "  {} ID           - Sign in as this user id (e.g. A_001)",
        "--user".green()
    );
    println!(
        "  {} TOKEN       - Bearer token for the service",
        "--token".green()
    );
    println!(
        "  {} VIEW        - Print one view and exit (students, faculty,",
        "--print".green()
    );
    println!("                         admins, attendance, performance, registrations)");
    println!();
    println!("{}", "Dashboard keys:".yellow());
    println!("  {}     - Cycle menu panes", "Tab".green());
    println!("  {}       - Edit the search query", "/".green());
    println!("  {}     - Previous / next page", "[ ]".green());
    println!("  {}     - Invoke a row action", "1-9".green());
    println!("  {}     - Export CSV / JSON", "e E".green());
    println!("  {}       - Quit", "q".green());
}

struct Options {
    offline: bool,
    snapshot_path: Option<PathBuf>,
    server: Option<String>,
    role: Role,
    user_id: Option<String>,
    token: Option<String>,
    print_view: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        offline: false,
        snapshot_path: None,
        server: None,
        role: Role::Admin,
        user_id: None,
        token: None,
        print_view: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--offline" => {
                options.offline = true;
                if i + 1 < args.len() && !args[i + 1].starts_with("--") {
                    i += 1;
                    options.snapshot_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--server" => {
                i += 1;
                options.server = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow!("--server requires a URL"))?
                        .clone(),
                );
            }
            "--role" => {
                i += 1;
                let text = args.get(i).ok_or_else(|| anyhow!("--role requires a value"))?;
                options.role =
                    Role::parse(text).ok_or_else(|| anyhow!("Unknown role: {}", text))?;
            }
            "--user" => {
                i += 1;
                options.user_id = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow!("--user requires an id"))?
                        .clone(),
                );
            }
            "--token" => {
                i += 1;
                options.token = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow!("--token requires a value"))?
                        .clone(),
                );
            }
            "--print" => {
                i += 1;
                options.print_view = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow!("--print requires a view name"))?
                        .clone(),
                );
            }
            other => bail!("Unknown argument: {}", other),
        }
        i += 1;
    }

    Ok(options)
}

fn default_user_id(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin | Role::Admin => "A_001",
        Role::Faculty => "F_001",
        Role::Student => "S_001",
    }
}

/// Classic one-shot mode: fetch a view, print it with comfy-table, exit.
fn print_view(backend: &dyn Backend, view: &str) -> Result<()> {
    let (records, columns) = match view {
        "students" => (
            backend.list_records(EntityKind::Student)?,
            ui::entity_columns(EntityKind::Student),
        ),
        "faculty" => (
            backend.list_records(EntityKind::Faculty)?,
            ui::entity_columns(EntityKind::Faculty),
        ),
        "admins" => (
            backend.list_records(EntityKind::Admin)?,
            ui::entity_columns(EntityKind::Admin),
        ),
        "attendance" => (backend.attendance_report()?, reports::attendance_columns()),
        "performance" => (
            backend.performance_report()?,
            reports::performance_columns(),
        ),
        "registrations" => (
            backend.registrations_report(None, None)?,
            reports::registration_columns(),
        ),
        other => bail!("Unknown view: {}", other),
    };

    let refs: Vec<&sdms_cli::data::record::Record> = records.iter().collect();
    table_print::print_records(&refs, &columns);
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--generate-config") {
        let path = Config::get_config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Config::create_default_with_comments())?;
        println!("Config written to {:?}", path);
        return Ok(());
    }

    let options = parse_args(&args)?;
    let config = Config::load().unwrap_or_default();

    let user_id = options
        .user_id
        .clone()
        .unwrap_or_else(|| default_user_id(options.role).to_string());
    let mut session = Session::new(options.role, user_id);
    if let Some(token) = &options.token {
        session = session.with_token(token.clone());
    }

    let backend: Box<dyn Backend> = if options.offline {
        match &options.snapshot_path {
            Some(path) => Box::new(SnapshotBackend::from_file(path)?),
            None => Box::new(SnapshotBackend::seeded()),
        }
    } else {
        let base_url = options
            .server
            .clone()
            .unwrap_or_else(|| config.server.base_url.clone());
        Box::new(HttpBackend::new(&base_url, &session))
    };

    if let Some(view) = &options.print_view {
        return print_view(backend.as_ref(), view);
    }

    let logs = logging::init_tracing();
    Dashboard::new(session, backend, config, Some(logs))?.run()
}
