use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::io::paths;
use crate::io::recovery::{self, PRUNE_AGE_DAYS};
use crate::model::config::AppConfig;
use crate::model::todo::{Kind, TodoItem, TodoKey, parse_todo_time};
use crate::model::view::ViewMode;
use crate::ops::manager::MonthlyManager;
use crate::util::DateKey;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Shared state for one invocation
struct Ctx {
    data_dir: PathBuf,
    manager: MonthlyManager,
    config: AppConfig,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let data_dir = paths::resolve_data_dir(cli.data_dir.as_deref())
        .map_err(|e| format!("cannot prepare data directory: {}", e))?;
    let config = config_io::load_config(&data_dir)?;
    let manager = MonthlyManager::new(&data_dir);

    // Recovery reads its own log and migrate reports for itself
    if !matches!(cli.command, Commands::Migrate | Commands::Recovery(_)) {
        startup_migration(&manager);
    }

    let mut ctx = Ctx {
        data_dir,
        manager,
        config,
        json: cli.json,
    };

    match cli.command {
        // Read commands
        Commands::Day(args) => cmd_day(&mut ctx, args),
        Commands::Month(args) => cmd_month(&ctx, args),
        Commands::Months => cmd_months(&ctx),
        Commands::Remind(args) => cmd_remind(&ctx, args),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Done(args) => cmd_toggle(&ctx, args, |t, on| t.done = on),
        Commands::Star(args) => cmd_toggle(&ctx, args, |t, on| t.starred = on),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::Move(args) => cmd_move(&ctx, args),

        // Maintenance
        Commands::Migrate => cmd_migrate(&ctx),
        Commands::View(args) => cmd_view(&mut ctx, args),
        Commands::Recovery(args) => cmd_recovery(&ctx, args),
    }
}

/// Bring legacy months forward before anything reads them. Failure here
/// only costs the conversion, so it is reported and ignored.
fn startup_migration(manager: &MonthlyManager) {
    let has_legacy = match manager.get_all_months() {
        Ok(months) => months
            .iter()
            .any(|key| manager.store().legacy_path(*key).exists()),
        Err(_) => false,
    };
    if !has_legacy {
        return;
    }
    let _lock = match FileLock::acquire_default(manager.data_dir()) {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("warning: skipping migration: {}", e);
            return;
        }
    };
    if let Err(e) = manager.migrate_all_to_yaml() {
        eprintln!("warning: migration failed: {}", e);
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn parse_time(raw: &str) -> Result<NaiveDateTime, String> {
    parse_todo_time(raw).ok_or_else(|| format!("invalid time '{}' (expected YYYY-MM-DD HH:MM)", raw))
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    if raw == "today" {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", raw))
}

fn parse_month_arg(raw: &str) -> Result<DateKey, String> {
    raw.replace('-', "")
        .parse::<DateKey>()
        .map_err(|_| format!("invalid month '{}' (expected YYYYMM)", raw))
}

fn parse_kind(raw: &str) -> Result<Kind, String> {
    match raw {
        "event" => Ok(Kind::Event),
        "task" => Ok(Kind::Task),
        _ => Err(format!("unknown kind '{}' (expected: event, task)", raw)),
    }
}

fn parse_view(raw: Option<&str>, fallback: ViewMode) -> Result<ViewMode, String> {
    match raw {
        None => Ok(fallback),
        Some(s) => ViewMode::parse_mode(s).ok_or_else(|| {
            format!(
                "unknown view '{}' (expected: all, incomplete, complete, starred)",
                s
            )
        }),
    }
}

fn apply_fields(item: &mut TodoItem, fields: FieldArgs) -> Result<(), String> {
    if let Some(content) = fields.content {
        item.content = content;
    }
    if let Some(place) = fields.place {
        item.place = place;
    }
    if let Some(label) = fields.label {
        item.label = label;
    }
    if let Some(kind) = fields.kind {
        item.kind = parse_kind(&kind)?;
    }
    if let Some(level) = fields.level {
        if level > 3 {
            return Err(format!("level must be 0-3, got {}", level));
        }
        item.set_level(level);
    }
    if let Some(warn) = fields.warn {
        item.warn_time = warn;
    }
    Ok(())
}

/// Look up the todo named `name` at `at`.
fn find_todo(ctx: &Ctx, at: &str, name: &str) -> Result<TodoItem, Box<dyn std::error::Error>> {
    let time = parse_time(at)?;
    let key = TodoKey::new(time, name);
    let month = DateKey::of(&time);
    ctx.manager
        .get_todos_for_month(month.year(), month.month())?
        .into_iter()
        .find(|t| key.matches(t))
        .ok_or_else(|| format!("no todo named '{}' at {}", name, at).into())
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_day(ctx: &mut Ctx, args: DayArgs) -> CmdResult {
    let date = match args.date.as_deref() {
        Some(raw) => parse_day(raw)?,
        None => ctx.config.ui.current_date,
    };
    let view = parse_view(args.view.as_deref(), ctx.config.ui.view_mode)?;

    let day = ctx.manager.todos_for_day(date)?;
    let visible = view.filter(&day);

    if ctx.json {
        print_json(&DayJson {
            date: date.to_string(),
            view,
            todos: visible.iter().map(|t| todo_to_json(t)).collect(),
        })?;
    } else {
        println!("{}", format_day_header(date, view));
        for item in &visible {
            println!("{}", format_todo_line(item));
        }
    }

    // Remember where the user was looking
    if ctx.config.ui.current_date != date {
        ctx.config.ui.current_date = date;
        config_io::save_config(&ctx.data_dir, &ctx.config)?;
    }
    Ok(())
}

fn cmd_month(ctx: &Ctx, args: MonthArgs) -> CmdResult {
    let key = match args.month.as_deref() {
        Some(raw) => parse_month_arg(raw)?,
        None => DateKey::of_date(ctx.config.ui.current_date),
    };
    let view = parse_view(args.view.as_deref(), ctx.config.ui.view_mode)?;

    let todos = ctx.manager.get_todos_for_month(key.year(), key.month())?;
    let visible = view.filter(&todos);

    if ctx.json {
        print_json(&MonthJson {
            month: key.to_string(),
            view,
            todos: visible.iter().map(|t| todo_to_json(t)).collect(),
        })
    } else {
        for line in format_month_listing(key, view, &visible) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_months(ctx: &Ctx) -> CmdResult {
    let months = ctx.manager.get_all_months()?;
    if ctx.json {
        let keys: Vec<String> = months.iter().map(|k| k.to_string()).collect();
        return print_json(&keys);
    }
    for key in months {
        println!("{}", key);
    }
    Ok(())
}

fn cmd_remind(ctx: &Ctx, args: RemindArgs) -> CmdResult {
    let now = match args.now.as_deref() {
        Some(raw) => parse_time(raw)?,
        None => Local::now().naive_local(),
    };

    // A reminder window can reach back from the start of next month
    let this_month = DateKey::of(&now);
    let months = std::iter::once(this_month).chain(this_month.next());

    let mut due = Vec::new();
    for key in months {
        let todos = ctx.manager.get_todos_for_month(key.year(), key.month())?;
        due.extend(todos.into_iter().filter(|t| t.should_remind(now)));
    }
    due.sort_by_key(|t| t.todo_time);

    if ctx.json {
        let out: Vec<TodoJson> = due.iter().map(todo_to_json).collect();
        return print_json(&out);
    }
    for item in &due {
        println!("{} {}", item.todo_time.format("%Y-%m-%d"), format_todo_line(item));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Ctx, args: AddArgs) -> CmdResult {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let mut item = TodoItem::new(args.name, parse_time(&args.at)?);
    apply_fields(&mut item, args.fields)?;
    ctx.manager.add_todo(item)?;
    println!("{}", args.at);
    Ok(())
}

fn cmd_edit(ctx: &Ctx, args: EditArgs) -> CmdResult {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let original = find_todo(ctx, &args.at, &args.name)?;
    let original_key = original.key();

    let mut item = original;
    if let Some(name) = args.rename {
        item.name = name;
    }
    if let Some(time) = args.time.as_deref() {
        item.todo_time = parse_time(time)?;
        // A moved item has no place in its new day's order yet
        if item.todo_time.date() != original_key.time.date() {
            item.order = 0;
        }
    }
    apply_fields(&mut item, args.fields)?;

    ctx.manager.replace_todo(&original_key, item)?;
    Ok(())
}

fn cmd_toggle(ctx: &Ctx, args: ToggleArgs, set: fn(&mut TodoItem, bool)) -> CmdResult {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let mut item = find_todo(ctx, &args.at, &args.name)?;
    let original_time = item.todo_time;
    set(&mut item, !args.undo);
    ctx.manager.update_todo(item, original_time)?;
    Ok(())
}

fn cmd_rm(ctx: &Ctx, args: RmArgs) -> CmdResult {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let times = args
        .at
        .iter()
        .map(|raw| parse_time(raw))
        .collect::<Result<Vec<_>, _>>()?;
    match times.as_slice() {
        [single] => ctx.manager.remove_todo(*single)?,
        _ => ctx.manager.remove_todos(&times)?,
    }
    Ok(())
}

fn cmd_move(ctx: &Ctx, args: MoveArgs) -> CmdResult {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let time = parse_time(&args.at)?;
    let key = TodoKey::new(time, args.name.clone());
    let day = time.date();

    if ctx.manager.reorder_in_day(day, &key, args.by)? {
        let month = DateKey::of_date(day);
        ctx.manager.commit_month(month.year(), month.month())?;
    } else {
        // Nothing moved: still an error when the todo is not there at all
        find_todo(ctx, &args.at, &args.name)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

fn cmd_migrate(ctx: &Ctx) -> CmdResult {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let report = ctx.manager.migrate_all_to_yaml()?;
    if ctx.json {
        return print_json(&migration_to_json(&report));
    }
    for line in format_migration(&report) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_view(ctx: &mut Ctx, args: ViewArgs) -> CmdResult {
    if let Some(raw) = args.mode.as_deref() {
        let mode = if raw == "next" {
            ctx.config.ui.view_mode.next()
        } else {
            parse_view(Some(raw), ctx.config.ui.view_mode)?
        };
        ctx.config.ui.view_mode = mode;
        config_io::save_config(&ctx.data_dir, &ctx.config)?;
    }

    let mode = ctx.config.ui.view_mode;
    if ctx.json {
        print_json(&mode)
    } else {
        println!("{} ({})", mode.as_str(), mode.label());
        Ok(())
    }
}

fn cmd_recovery(ctx: &Ctx, args: RecoveryCmd) -> CmdResult {
    match args.action {
        Some(RecoveryAction::Path) => {
            let path = recovery::recovery_log_path(&ctx.data_dir);
            println!("{}", absolute(&path).display());
            Ok(())
        }
        Some(RecoveryAction::Prune(prune)) => {
            let before = if prune.all {
                None
            } else {
                Some(match prune.before.as_deref() {
                    Some(raw) => parse_since(raw)?,
                    None => Utc::now() - Duration::days(PRUNE_AGE_DAYS),
                })
            };
            let removed = recovery::prune_recovery(&ctx.data_dir, before, prune.all)?;
            println!("pruned {} entries", removed);
            Ok(())
        }
        None => {
            let since = args.since.as_deref().map(parse_since).transpose()?;
            let mut entries = recovery::read_recovery_entries(&ctx.data_dir, None);
            if let Some(cutoff) = since {
                entries.retain(|e| e.timestamp > cutoff);
            }
            entries.truncate(args.limit.unwrap_or(10));

            if ctx.json {
                let out: Vec<RecoveryEntryJson> = entries.iter().map(recovery_to_json).collect();
                return print_json(&out);
            }
            if entries.is_empty() {
                println!("recovery log is empty");
            }
            for entry in &entries {
                for line in format_recovery_entry(entry) {
                    println!("{}", line);
                }
            }
            Ok(())
        }
    }
}

fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| format!("invalid timestamp '{}' (expected RFC 3339)", raw))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
