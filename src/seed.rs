use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::ipc;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub applied: usize,
    pub rejected: usize,
}

/// Replays a JSON-lines request file through the router.
///
/// Blank lines are skipped. A line that is not a request aborts the replay;
/// requests the router rejects are logged and counted.
pub fn replay(state: &mut ipc::AppState, path: &Path) -> anyhow::Result<SeedReport> {
    let file = File::open(path).with_context(|| format!("open seed file {}", path.display()))?;
    let mut report = SeedReport::default();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read {}:{}", path.display(), lineno + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let req: ipc::Request = serde_json::from_str(&line)
            .with_context(|| format!("parse {}:{}", path.display(), lineno + 1))?;
        let resp = ipc::handle_request(state, req);
        if resp.get("ok").and_then(|v| v.as_bool()) == Some(true) {
            report.applied += 1;
        } else {
            report.rejected += 1;
            warn!(line = lineno + 1, error = %resp["error"], "seed request rejected");
        }
    }
    info!(
        path = %path.display(),
        applied = report.applied,
        rejected = report.rejected,
        "seed replayed"
    );
    Ok(report)
}
