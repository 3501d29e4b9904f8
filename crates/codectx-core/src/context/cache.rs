// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use moka::sync::Cache;
use parking_lot::Mutex;
use thiserror::Error;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// text encodings tried in this order when decoding a file
pub const DECODE_ORDER: &[Encoding] = &[
    Encoding::Utf8,
    Encoding::Utf16Le,
    Encoding::Utf16Be,
    Encoding::Latin1,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Latin1 => "latin-1",
        }
    }

    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => {
                let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            // utf-16 is only attempted with a byte order mark
            Encoding::Utf16Le => {
                decode_utf16(bytes.strip_prefix(&[0xFF, 0xFE])?, u16::from_le_bytes)
            }
            Encoding::Utf16Be => {
                decode_utf16(bytes.strip_prefix(&[0xFE, 0xFF])?, u16::from_be_bytes)
            }
            // latin-1 maps every byte, so reject anything that looks binary
            Encoding::Latin1 => {
                if bytes.contains(&0) {
                    None
                } else {
                    Some(bytes.iter().map(|&b| b as char).collect())
                }
            }
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// decode raw file bytes with the first encoding in `DECODE_ORDER` that accepts them
pub fn decode(bytes: &[u8]) -> Option<(String, Encoding)> {
    DECODE_ORDER
        .iter()
        .find_map(|&encoding| encoding.decode(bytes).map(|text| (text, encoding)))
}

/// why a single file could not be loaded. always recoverable: the builder
/// skips the file and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("no supported text encoding for {}", .0.display())]
    DecodeFailed(PathBuf),

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl ReadError {
    fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => ReadError::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => ReadError::PermissionDenied(path.to_path_buf()),
            _ => ReadError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentCacheEntry {
    pub path: PathBuf,
    pub content: Arc<str>,
    pub encoding_used: Encoding,
    pub cached_at: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// an entry is stale once it outlives the ttl or the file changed after it
/// was cached. a missing mtime only leaves the ttl check.
pub fn is_stale(
    cached_at: SystemTime,
    now: SystemTime,
    file_mtime: Option<SystemTime>,
    ttl: Duration,
) -> bool {
    let expired = now
        .duration_since(cached_at)
        .map(|age| age > ttl)
        .unwrap_or(false);
    let modified = file_mtime.is_some_and(|mtime| mtime > cached_at);
    expired || modified
}

/// decoded file contents keyed by absolute path.
///
/// shared between overlapping builds. a miss re-reads the file and
/// overwrites the entry; two builds loading the same path at the same mtime
/// write identical content, so last writer wins and no lock is held across
/// file io. moka evicts on ttl and capacity in wall-clock time, and `get`
/// re-checks `is_stale` against the caller's clock so a file edited since it
/// was cached is never served.
pub struct FileContentCache {
    ttl: Duration,
    entries: Cache<PathBuf, ContentCacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    last_sweep: Mutex<Option<SystemTime>>,
}

impl Default for FileContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl FileContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries.max(1))
            .time_to_live(ttl)
            .build();

        Self {
            ttl,
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            last_sweep: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, path: &Path) -> Result<Arc<str>, ReadError> {
        self.get_at(path, SystemTime::now())
    }

    pub(crate) fn get_at(&self, path: &Path, now: SystemTime) -> Result<Arc<str>, ReadError> {
        self.sweep_if_due(now);

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                self.invalidate(path);
                return Err(ReadError::from_io(path, e));
            }
        };
        let mtime = metadata.modified().ok();

        if let Some(entry) = self.entries.get(path) {
            if !is_stale(entry.cached_at, now, mtime, self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(entry.content);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let entry = match load(path, now) {
            Ok(entry) => entry,
            Err(e) => {
                self.invalidate(path);
                return Err(e);
            }
        };
        tracing::debug!(
            "cached {} ({}, {} bytes)",
            path.display(),
            entry.encoding_used.as_str(),
            entry.content.len()
        );
        let content = Arc::clone(&entry.content);
        self.entries.insert(path.to_path_buf(), entry);
        Ok(content)
    }

    /// purge expired entries at most once per ttl of the caller's clock
    fn sweep_if_due(&self, now: SystemTime) {
        let mut last = self.last_sweep.lock();
        let due = match *last {
            None => {
                *last = Some(now);
                false
            }
            Some(at) => now
                .duration_since(at)
                .map(|elapsed| elapsed > self.ttl)
                .unwrap_or(false),
        };
        if due {
            *last = Some(now);
            drop(last);
            let purged = self.purge_expired(now);
            if purged > 0 {
                tracing::debug!("swept {} expired cache entries", purged);
            }
        }
    }

    pub fn entry(&self, path: &Path) -> Option<ContentCacheEntry> {
        self.entries.get(path)
    }

    pub fn invalidate(&self, path: &Path) {
        self.entries.invalidate(path);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// drop entries older than the ttl, returning how many were removed
    pub fn purge_expired(&self, now: SystemTime) -> usize {
        let expired: Vec<Arc<PathBuf>> = self
            .entries
            .iter()
            .filter(|(_, entry)| is_stale(entry.cached_at, now, None, self.ttl))
            .map(|(path, _)| path)
            .collect();
        for path in &expired {
            self.entries.invalidate(path.as_path());
        }
        self.entries.run_pending_tasks();
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn load(path: &Path, now: SystemTime) -> Result<ContentCacheEntry, ReadError> {
    let bytes = std::fs::read(path).map_err(|e| ReadError::from_io(path, e))?;
    let (text, encoding_used) =
        decode(&bytes).ok_or_else(|| ReadError::DecodeFailed(path.to_path_buf()))?;
    Ok(ContentCacheEntry {
        path: path.to_path_buf(),
        content: Arc::from(text),
        encoding_used,
        cached_at: now,
    })
}
