use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mtodo", about = concat!("mtodo v", env!("CARGO_PKG_VERSION"), " - todos filed by month"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory (default: data/ next to the executable)
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List one day's todos in display order
    Day(DayArgs),
    /// List a month's todos, newest first
    Month(MonthArgs),
    /// List every month that has data
    Months,
    /// Add a todo
    Add(AddArgs),
    /// Change an existing todo
    Edit(EditArgs),
    /// Mark a todo done (or not done with --undo)
    Done(ToggleArgs),
    /// Star a todo (or unstar with --undo)
    Star(ToggleArgs),
    /// Remove todos by time
    Rm(RmArgs),
    /// Move a todo up or down within its day
    Move(MoveArgs),
    /// Show todos whose reminder window is open
    Remind(RemindArgs),
    /// Convert legacy month files to the structured format
    Migrate,
    /// Show or change the view mode
    View(ViewArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DayArgs {
    /// Day to show as YYYY-MM-DD, or "today" (default: last viewed day)
    pub date: Option<String>,
    /// View mode for this listing (all, incomplete, complete, starred)
    #[arg(long)]
    pub view: Option<String>,
}

#[derive(Args)]
pub struct MonthArgs {
    /// Month as YYYYMM or YYYY-MM (default: month of the last viewed day)
    pub month: Option<String>,
    /// View mode for this listing (all, incomplete, complete, starred)
    #[arg(long)]
    pub view: Option<String>,
}

#[derive(Args)]
pub struct RemindArgs {
    /// Check against this time instead of now (YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub now: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Todo name
    pub name: String,
    /// When it is due (YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub at: String,
    #[command(flatten)]
    pub fields: FieldArgs,
}

/// Optional fields shared by add and edit
#[derive(Args, Default)]
pub struct FieldArgs {
    /// Free text details
    #[arg(long)]
    pub content: Option<String>,
    /// Where it happens
    #[arg(long)]
    pub place: Option<String>,
    /// Short label
    #[arg(long)]
    pub label: Option<String>,
    /// event or task
    #[arg(long)]
    pub kind: Option<String>,
    /// Priority 0 (low) to 3 (urgent)
    #[arg(long)]
    pub level: Option<u8>,
    /// Minutes before the due time to remind (0 = no reminder)
    #[arg(long)]
    pub warn: Option<u32>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Current due time of the todo (YYYY-MM-DD HH:MM)
    pub at: String,
    /// Current name of the todo
    pub name: String,
    /// New name
    #[arg(long = "rename")]
    pub rename: Option<String>,
    /// New due time; may move the todo to another month
    #[arg(long = "time")]
    pub time: Option<String>,
    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Due time of the todo (YYYY-MM-DD HH:MM)
    pub at: String,
    /// Name of the todo
    pub name: String,
    /// Clear the flag instead of setting it
    #[arg(long)]
    pub undo: bool,
}

#[derive(Args)]
pub struct RmArgs {
    /// Due times of the todos to remove (YYYY-MM-DD HH:MM)
    #[arg(required = true)]
    pub at: Vec<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Due time of the todo (YYYY-MM-DD HH:MM)
    pub at: String,
    /// Name of the todo
    pub name: String,
    /// Positions to move: negative moves up, positive moves down
    #[arg(allow_negative_numbers = true)]
    pub by: isize,
}

#[derive(Args)]
pub struct ViewArgs {
    /// New mode (all, incomplete, complete, starred) or "next" to cycle
    pub mode: Option<String>,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Show entries after this timestamp (RFC 3339)
    #[arg(long)]
    pub since: Option<String>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
