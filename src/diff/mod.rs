pub mod types;
pub mod parser;
pub mod buggy;
pub mod attribution;

pub use types::*;
pub use parser::{parse_diff, parse_hunk_header};
pub use buggy::BuggyLineIndex;
pub use attribution::{attribute_commits, attribute_lines, AttributionJob};
