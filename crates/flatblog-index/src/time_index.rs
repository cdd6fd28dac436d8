use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use flatblog_types::{DataLayout, DayKey, PostId};

use crate::error::{IndexError, IndexResult};

const ENTRY_SIZE: usize = PostId::ENCODED_LEN;

/// Secondary index from calendar day to the posts created that day.
///
/// Appends open the day file in append mode and write each entry with a
/// single `write` call, so concurrent readers see either the old or the new
/// length but never a rewritten prefix.
#[derive(Clone, Debug)]
pub struct TimeIndex {
    dir: PathBuf,
}

impl TimeIndex {
    /// Open (or create) a time index rooted at `dir`.
    pub fn open(dir: &Path) -> IndexResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Open the time index of a data root.
    pub fn from_layout(layout: &DataLayout) -> IndexResult<Self> {
        Self::open(&layout.time_index_dir())
    }

    /// File holding the entries for `day`.
    pub fn path_for(&self, day: &DayKey) -> PathBuf {
        self.dir.join(day.to_string())
    }

    /// Append `id` to the file of the day containing `day`.
    pub fn append(&self, id: PostId, day: impl Into<DayKey>) -> IndexResult<()> {
        let day = day.into();
        let path = self.path_for(&day);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| IndexError::Append { day, source })?;
        file.write_all(&id.to_be_bytes())
            .map_err(|source| IndexError::Append { day, source })?;

        debug!(%id, %day, "time index append");
        Ok(())
    }

    /// Identifiers filed under `day`, in append order.
    ///
    /// A day without a file has no posts.
    pub fn ids_on_day(&self, day: impl Into<DayKey>) -> IndexResult<Vec<PostId>> {
        let day = day.into();
        let path = self.path_for(&day);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.len() % ENTRY_SIZE != 0 {
            warn!(path = %path.display(), len = bytes.len(), "time index length is not entry-aligned");
            return Err(IndexError::Corruption {
                path,
                len: bytes.len() as u64,
                width: ENTRY_SIZE,
            });
        }

        Ok(decode_entries(&bytes))
    }

    /// Identifiers filed between two days.
    ///
    /// Range queries are not supported yet; this always yields nothing.
    pub fn ids_in_range(&self, _from: impl Into<DayKey>, _to: impl Into<DayKey>) -> IndexResult<Vec<PostId>> {
        Ok(Vec::new())
    }

    /// All days that have an index file, oldest first.
    pub fn days(&self) -> IndexResult<Vec<DayKey>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut days = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            match name.to_str().map(DayKey::parse) {
                Some(Ok(day)) => days.push(day),
                _ => debug!(name = ?name, "skipping non-day entry in time index"),
            }
        }
        days.sort();
        Ok(days)
    }
}

fn decode_entries(bytes: &[u8]) -> Vec<PostId> {
    bytes
        .chunks_exact(ENTRY_SIZE)
        .map(|chunk| {
            let mut raw = [0u8; ENTRY_SIZE];
            raw.copy_from_slice(chunk);
            PostId::from_be_bytes(raw)
        })
        .collect()
}
