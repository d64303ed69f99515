mod bus;
mod terminal;

pub use bus::{BusFault, ParseError, ScriptedBus, parse_script};
pub use terminal::run_interactive_terminal;
