//! Source row wrapper

use serde::{Deserialize, Serialize};

/// A parsed record together with the 1-based line it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow<T> {
    pub line: u64,
    pub record: T,
}

impl<T> SourceRow<T> {
    pub fn new(line: u64, record: T) -> Self {
        Self { line, record }
    }
}
