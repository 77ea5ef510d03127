pub mod config;
pub mod todo;
pub mod view;

pub use config::*;
pub use todo::*;
pub use view::*;
