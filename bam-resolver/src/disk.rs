//! `.resolver_cache/` on-disk format: one file per cache key, named by the
//! sha256 content address of its canonical path, holding a single JSON
//! object. Corrupt or unreadable entries are treated as a cache miss
//! rather than a hard error — the resolver always has a working fallback
//! (the live remote lookup).

use std::path::Path;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::trace;

use crate::Timestamped;

#[derive(Serialize, Deserialize)]
struct DiskEntry {
    value: i64,
    #[serde(with = "time::serde::rfc3339")]
    inserted_at: OffsetDateTime,
}

pub(crate) fn read(cache_dir: &Path, address: &str) -> Option<Timestamped<i64>> {
    let path = cache_dir.join(address);
    let bytes = std::fs::read(&path).ok()?;
    match serde_json::from_slice::<DiskEntry>(&bytes) {
        Ok(entry) => Some(Timestamped { value: entry.value, inserted_at: entry.inserted_at }),
        Err(err) => {
            trace!(?err, path = %path.display(), "ignoring unreadable resolver cache entry");
            None
        }
    }
}

pub(crate) fn write(cache_dir: &Path, address: &str, entry: Timestamped<i64>) -> std::io::Result<()> {
    let path = cache_dir.join(address);
    let on_disk = DiskEntry { value: entry.value, inserted_at: entry.inserted_at };
    let bytes = serde_json::to_vec(&on_disk)?;
    std::fs::write(path, bytes)
}
