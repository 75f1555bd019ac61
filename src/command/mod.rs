mod commands;
mod history;

pub use commands::EditCommand;
pub use history::{CommandHistory, Transaction};
