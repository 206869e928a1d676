pub mod types;
pub mod tokenizer;

pub use types::*;
pub use tokenizer::{log_command_args, parse_log, LogTokenizer, LOG_PRETTY_FORMAT};
