//! Durable company-id → [`LocationRecord`] map.
//!
//! Writes are idempotent upserts: the last write for a company id wins. Records are stored
//! as fresh resolutions and reported as cached by the resolver. Resolution errors are
//! rejected with [`LocationCacheError::NotCacheable`].
//!
//! Backends are synchronous and may block on disk; async callers go through
//! `spawn_blocking`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use moka::sync::Cache;
use parking_lot::RwLock;
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use tracing::debug;

use super::error::LocationCacheError;
use crate::model::{CompanyId, LocationRecord};

const RKYV_EXTENSION: &str = "rkyv";
const TEMP_EXTENSION: &str = "tmp";
const SHARD_COUNT: u64 = 256;

/// Key-value store for resolved locations, shared by every incentive worker.
pub trait LocationCache: Send + Sync {
    fn get(&self, company_id: CompanyId) -> Result<Option<LocationRecord>, LocationCacheError>;

    fn put(&self, record: &LocationRecord) -> Result<(), LocationCacheError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, LocationCacheError>;

    fn is_empty(&self) -> Result<bool, LocationCacheError> {
        Ok(self.len()? == 0)
    }
}

/// One `rkyv` file per company under `<root>/<shard>/<id>.rkyv`, fronted by an in-memory LRU.
pub struct DiskLocationCache {
    root: PathBuf,
    front: Cache<CompanyId, LocationRecord>,
}

impl std::fmt::Debug for DiskLocationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskLocationCache")
            .field("root", &self.root)
            .field("front_entries", &self.front.entry_count())
            .finish()
    }
}

impl DiskLocationCache {
    /// Opens (creating if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, front_capacity: u64) -> Result<Self, LocationCacheError> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)
                .map_err(|_| LocationCacheError::StorageUnavailable { path: root.clone() })?;
        }

        Ok(Self {
            root,
            front: Cache::builder().max_capacity(front_capacity).build(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn shard_dir(&self, company_id: CompanyId) -> PathBuf {
        self.root.join(format!("{:02x}", company_id % SHARD_COUNT))
    }

    fn record_path(&self, company_id: CompanyId) -> PathBuf {
        self.shard_dir(company_id).join(format!("{}.{}", company_id, RKYV_EXTENSION))
    }

    fn read_record(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<LocationRecord>, LocationCacheError> {
        let path = self.record_path(company_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);

        let record = rkyv::from_bytes::<LocationRecord, RkyvError>(&aligned).map_err(|e| {
            LocationCacheError::Corrupt {
                company_id,
                reason: e.to_string(),
            }
        })?;

        if record.company_id != company_id {
            return Err(LocationCacheError::Corrupt {
                company_id,
                reason: format!("file holds company {}", record.company_id),
            });
        }

        Ok(Some(record))
    }
}

impl LocationCache for DiskLocationCache {
    fn get(&self, company_id: CompanyId) -> Result<Option<LocationRecord>, LocationCacheError> {
        if let Some(record) = self.front.get(&company_id) {
            return Ok(Some(record));
        }

        let record = self.read_record(company_id)?;
        if let Some(ref record) = record {
            self.front.insert(company_id, record.clone());
        }
        Ok(record)
    }

    fn put(&self, record: &LocationRecord) -> Result<(), LocationCacheError> {
        ensure_cacheable(record)?;
        let record = record.clone().for_storage();
        let company_id = record.company_id;

        let bytes = rkyv::to_bytes::<RkyvError>(&record).map_err(|e| {
            LocationCacheError::Corrupt {
                company_id,
                reason: e.to_string(),
            }
        })?;

        let shard = self.shard_dir(company_id);
        fs::create_dir_all(&shard)?;

        // Unique temp name so concurrent writers of the same id never share a temp file.
        let temp_path = shard.join(format!(
            "{}.{}.{}",
            company_id,
            uuid::Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ));
        let final_path = self.record_path(company_id);

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(company_id, status = %record.status, "Stored location record");
        self.front.insert(company_id, record);
        Ok(())
    }

    fn len(&self) -> Result<usize, LocationCacheError> {
        let mut count = 0;
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?.path();
            if !shard.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&shard)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == RKYV_EXTENSION) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

/// Process-local cache for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryLocationCache {
    records: RwLock<HashMap<CompanyId, LocationRecord>>,
}

impl MemoryLocationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationCache for MemoryLocationCache {
    fn get(&self, company_id: CompanyId) -> Result<Option<LocationRecord>, LocationCacheError> {
        Ok(self.records.read().get(&company_id).cloned())
    }

    fn put(&self, record: &LocationRecord) -> Result<(), LocationCacheError> {
        ensure_cacheable(record)?;
        self.records
            .write()
            .insert(record.company_id, record.clone().for_storage());
        Ok(())
    }

    fn len(&self) -> Result<usize, LocationCacheError> {
        Ok(self.records.read().len())
    }
}

fn ensure_cacheable(record: &LocationRecord) -> Result<(), LocationCacheError> {
    if record.is_cacheable() {
        Ok(())
    } else {
        Err(LocationCacheError::NotCacheable {
            company_id: record.company_id,
        })
    }
}
