use std::path::PathBuf;

use clap::Parser;

/// Line-oriented sidecar serving the course content index on stdin/stdout.
#[derive(Debug, Clone, Parser)]
#[command(name = "coursed", version)]
pub struct Config {
    /// tracing filter directive, e.g. `info` or `coursed=debug`.
    #[arg(long, env = "COURSED_LOG", default_value = "info")]
    pub log_filter: String,

    /// JSON-lines file of requests replayed before reading stdin.
    #[arg(long, env = "COURSED_SEED")]
    pub seed: Option<PathBuf>,

    /// Default `limit` for `performance.top`.
    #[arg(long, env = "COURSED_TOP_LIMIT", default_value_t = 10)]
    pub top_limit: usize,

    /// Cap on search result lists when the request sets no `limit`.
    #[arg(long, env = "COURSED_SEARCH_LIMIT", default_value_t = 50)]
    pub search_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub top_limit: usize,
    pub search_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            top_limit: 10,
            search_limit: 50,
        }
    }
}

impl Config {
    pub fn limits(&self) -> Limits {
        Limits {
            top_limit: self.top_limit,
            search_limit: self.search_limit,
        }
    }
}
