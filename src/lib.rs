pub mod audio;
pub mod commands;
pub mod config;
pub mod engine;
pub mod interrupt;
pub mod player;
pub mod session;
pub mod telemetry;

pub use commands::{Command, CommandAction, CommandTable, KeywordSpec};
pub use interrupt::InterruptSignal;
pub use session::{DispatchOutcome, Mode, Session, SessionConfig};
