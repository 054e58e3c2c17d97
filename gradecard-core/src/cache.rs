use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Version constants for cache invalidation
pub mod versions {
    pub const GRADECARD_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// Bump whenever extraction output changes for the same input
    pub const EXTRACTION_VERSION: &str = "1.0.0";
}

/// Cache key (document content + config -> ParseResult)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResultCacheKey {
    pub content_hash: String,
    pub config_hash: String,
    pub gradecard_version: String,
    pub extraction_version: String,
}

impl ResultCacheKey {
    pub fn new(content_hash: String, config_hash: String) -> Self {
        Self {
            content_hash,
            config_hash,
            gradecard_version: versions::GRADECARD_VERSION.to_string(),
            extraction_version: versions::EXTRACTION_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.content_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.gradecard_version);
        hasher.update(&self.extraction_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Bookkeeping stored next to a cached result. `created_at` is the only
/// clock-dependent value and never enters the `ParseResult` itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheMeta {
    pub filename: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCacheValue {
    pub result: ParseResult,
    pub meta: CacheMeta,
}

impl ResultCacheValue {
    pub fn new(result: ParseResult, filename: &str, key: &ResultCacheKey, processing_time_ms: u64) -> Self {
        Self {
            result,
            meta: CacheMeta {
                filename: filename.to_string(),
                hash: key.to_cache_hash(),
                created_at: Utc::now(),
                processing_time_ms,
                cache_version: versions::GRADECARD_VERSION.to_string(),
            },
        }
    }
}

/// One line of the cached-results listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheIndexEntry {
    pub hash: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub student_count: usize,
    pub institution_count: usize,
    pub program: String,
    pub semester: String,
    pub scheme: String,
    pub examination: String,
}

impl From<&ResultCacheValue> for CacheIndexEntry {
    fn from(value: &ResultCacheValue) -> Self {
        let result = &value.result;
        let institutions: BTreeSet<&str> = result.students.iter().map(|s| s.college.as_str()).collect();
        Self {
            hash: value.meta.hash.clone(),
            filename: value.meta.filename.clone(),
            created_at: value.meta.created_at,
            student_count: result.students.len(),
            institution_count: institutions.len(),
            program: result.exam_info.program.clone(),
            semester: result.exam_info.semester.clone(),
            scheme: result.exam_info.scheme.clone(),
            examination: result.exam_info.examination.clone(),
        }
    }
}
