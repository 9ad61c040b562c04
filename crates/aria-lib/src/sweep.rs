//! Retention sweep — reclaims audio files older than the retention window.
//!
//! The output directory is shared mutable state: requests create and
//! delete artifacts while a sweep runs. Entries vanishing mid-sweep are
//! expected, so per-entry failures are skipped and excluded from the
//! count, never escalated.

use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

/// Default retention window: 24 hours.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Delete entries in `dir` whose age strictly exceeds `max_age`. Returns
/// the number actually deleted. A missing directory sweeps nothing.
pub async fn sweep(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    let mut deleted = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        // A future timestamp has no meaningful age; leave the entry alone.
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };
        if age > max_age {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    deleted += 1;
                    debug!(path = %path.display(), "swept stale artifact");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to sweep entry");
                }
            }
        }
    }

    Ok(deleted)
}
