#![forbid(unsafe_code)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level as TraceLevel, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;

use taskbar_filter::config::{self, JsonFileStore};
use taskbar_filter::filter::matcher::{below_size_guard, matching_rule};
use taskbar_filter::filter::{self, Criterion, LabeledRule, RuleFormat};
use taskbar_filter::window::WindowRecord;
use taskbar_filter::x11_utils::{self, CachedAtoms};

#[derive(Parser, Debug)]
#[command(name = "taskbar-filter", version, about = "List desktop windows, hiding the ones your filters exclude")]
struct Cli {
    /// Config file (default: $TASKBAR_FILTER_CONFIG or <config dir>/taskbar-filter/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn or error (default: $LOG_LEVEL or info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List windows on the X11 display that pass the filters
    List {
        /// Show every window with the reason it is shown or hidden
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Log windows entering and leaving the visible set as clients change
    Watch,
    /// Apply the filters to window records read from a JSON file
    Filter {
        windows: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show or edit the stored filters
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Validate a hand-edited labeled filters file
    Check { file: PathBuf },
    /// Convert a legacy filters file to the labeled format
    Migrate {
        file: PathBuf,
        /// Store the result as the active filters
        #[arg(long)]
        write: bool,
    },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    List,
    /// Add a filter from `property=value` criteria (all must match)
    Add {
        #[arg(required = true)]
        criteria: Vec<String>,
        #[arg(long)]
        label: Option<String>,
    },
    Remove { index: usize },
    Rename { index: usize, label: String },
}

fn parse_log_level(name: &str) -> TraceLevel {
    match name.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn open_store(path: Option<&Path>) -> Result<JsonFileStore> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(JsonFileStore::default_path);
    let store = JsonFileStore::open(path)?;
    debug!(path = %store.path().display(), "opened config");
    Ok(store)
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

fn print_windows(windows: &[&WindowRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(windows).context("Failed to serialize windows")?);
        return Ok(());
    }
    for window in windows {
        let id = window
            .window_number
            .map_or_else(|| "-".to_string(), |n| format!("{n:#010x}"));
        println!("{id}  {}", window.display_name());
    }
    Ok(())
}

fn print_verdicts(windows: &[WindowRecord], rules: &[LabeledRule], json: bool) -> Result<()> {
    let verdicts: Vec<(&WindowRecord, Option<String>)> = windows
        .iter()
        .map(|window| {
            let reason = if below_size_guard(window) {
                Some("smaller than the minimum size".to_string())
            } else {
                matching_rule(window, rules).map(|rule| rule.label.clone())
            };
            (window, reason)
        })
        .collect();

    if json {
        let entries: Vec<Value> = verdicts
            .iter()
            .map(|(window, reason)| {
                serde_json::json!({
                    "window": window,
                    "excluded": reason.is_some(),
                    "reason": reason,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries).context("Failed to serialize windows")?);
        return Ok(());
    }

    for (window, reason) in verdicts {
        match reason {
            Some(reason) => println!("hidden  {}  ({reason})", window.display_name()),
            None => println!("shown   {}", window.display_name()),
        }
    }
    Ok(())
}

fn print_rules(rules: &[LabeledRule]) {
    if rules.is_empty() {
        println!("no filters configured");
        return;
    }
    for (index, rule) in rules.iter().enumerate() {
        let criteria: Vec<String> = rule.body.iter().map(Criterion::to_string).collect();
        println!("{index:>3}  {}  [{}]", rule.label, criteria.join(" AND "));
    }
}

fn visible_by_id(windows: &[WindowRecord], rules: &[LabeledRule]) -> BTreeMap<i64, String> {
    filter::visible(windows, rules)
        .into_iter()
        .filter_map(|w| w.window_number.map(|id| (id, w.display_name())))
        .collect()
}

fn watch(config_path: Option<&Path>) -> Result<()> {
    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to the X11 display")?;
    let screen = &conn.setup().roots[screen_num];
    let atoms = CachedAtoms::new(&conn)?;

    conn.change_window_attributes(
        screen.root,
        &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
    )?;
    conn.flush()?;

    let mut rules = config::load_rules(&mut open_store(config_path)?);
    let mut shown = visible_by_id(&x11_utils::list_windows(&conn, screen, &atoms)?, &rules);
    info!(windows = shown.len(), filters = rules.len(), "watching client list");

    loop {
        let event = conn.wait_for_event()?;
        let Event::PropertyNotify(event) = event else {
            continue;
        };
        if event.atom != atoms.net_client_list {
            continue;
        }

        // Pick up edits made by `rules add/remove` from another process
        match open_store(config_path) {
            Ok(mut store) => rules = config::load_rules(&mut store),
            Err(e) => warn!(error = ?e, "keeping previous filters, config could not be reopened"),
        }

        let windows = match x11_utils::list_windows(&conn, screen, &atoms) {
            Ok(windows) => windows,
            Err(e) => {
                error!(error = ?e, "failed to enumerate windows");
                continue;
            }
        };
        let now = visible_by_id(&windows, &rules);
        for (id, name) in &now {
            if !shown.contains_key(id) {
                info!(window = id, name = %name, "window shown");
            }
        }
        for (id, name) in &shown {
            if !now.contains_key(id) {
                info!(window = id, name = %name, "window gone or hidden");
            }
        }
        shown = now;
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::List { all, json } => {
            let (conn, screen_num) =
                x11rb::connect(None).context("Failed to connect to the X11 display")?;
            let screen = &conn.setup().roots[screen_num];
            info!(screen = screen_num, "connected to x11");
            let atoms = CachedAtoms::new(&conn)?;

            let rules = config::load_rules(&mut open_store(config_path)?);
            let windows = x11_utils::list_windows(&conn, screen, &atoms)?;
            if all {
                print_verdicts(&windows, &rules, json)
            } else {
                print_windows(&filter::visible(&windows, &rules), json)
            }
        }
        Command::Watch => watch(config_path),
        Command::Filter { windows, json } => {
            let windows: Vec<WindowRecord> = serde_json::from_value(read_json(&windows)?)
                .context("Window file must be an array of window records")?;
            let rules = config::load_rules(&mut open_store(config_path)?);
            print_windows(&filter::visible(&windows, &rules), json)
        }
        Command::Rules { command } => {
            let mut store = open_store(config_path)?;
            match command {
                RulesCommand::List => print_rules(&config::load_rules(&mut store)),
                RulesCommand::Add { criteria, label } => {
                    let body = criteria
                        .iter()
                        .map(|raw| Criterion::parse_assignment(raw))
                        .collect::<Result<Vec<_>, _>>()?;
                    let rule = config::add_rule(&mut store, body, label)?;
                    println!("added: {}", rule.label);
                }
                RulesCommand::Remove { index } => {
                    let rule = config::remove_rule(&mut store, index)?;
                    println!("removed: {}", rule.label);
                }
                RulesCommand::Rename { index, label } => {
                    config::relabel_rule(&mut store, index, label)?;
                }
            }
            Ok(())
        }
        Command::Check { file } => {
            let raw = read_json(&file)?;
            let format = filter::detect(&raw);
            let valid = filter::is_valid(&raw);
            println!("format: {format}");
            if valid {
                println!("valid: {} filter(s)", raw.as_array().map_or(0, Vec::len));
                return Ok(());
            }
            println!("invalid");
            if format == RuleFormat::Legacy {
                println!("hint: this is the legacy format, run `taskbar-filter migrate {}`", file.display());
            }
            std::process::exit(1);
        }
        Command::Migrate { file, write } => {
            let raw = read_json(&file)?;
            let format = filter::detect(&raw);
            if format != RuleFormat::Legacy {
                bail!("{} is not a legacy filters file (detected: {format})", file.display());
            }
            let report = filter::migrate_with_report(&raw);
            println!(
                "{}",
                serde_json::to_string_pretty(&report.rules)
                    .context("Failed to serialize migrated filters")?
            );
            eprintln!(
                "migrated {} filter(s), skipped {}, dropped {} invalid criteria",
                report.rules.len(),
                report.skipped.len(),
                report.dropped_criteria
            );
            if write {
                config::save_rules(&mut open_store(config_path)?, &report.rules)?;
                info!("stored migrated filters");
            }
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_log_level(&log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rules_add() {
        let cli = Cli::parse_from(["taskbar-filter", "rules", "add", "ownerName=Dock", "windowName="]);
        match cli.command {
            Command::Rules {
                command: RulesCommand::Add { criteria, label },
            } => {
                assert_eq!(criteria, vec!["ownerName=Dock", "windowName="]);
                assert_eq!(label, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_log_level("bogus"), TraceLevel::INFO);
    }
}
