//! HEXREALM CLI support - script runner and summaries shared by the binary
//! and its integration tests

pub mod inspect;
pub mod script;

pub use script::{execute, parse_script, run_script, Command};
