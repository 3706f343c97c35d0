pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod install;
pub mod output;
pub mod prompt;
pub mod registry;
pub mod util;
pub mod validate;
