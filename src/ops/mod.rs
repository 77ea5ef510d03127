pub mod manager;
pub mod ordering;

pub use manager::{MigrationOutcome, MigrationReport, MonthlyManager, TodoError};
