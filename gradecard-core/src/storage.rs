use crate::cache::{CacheIndexEntry, ResultCacheKey, ResultCacheValue};
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Storage abstraction for caching parse results
pub trait ResultStorage {
    fn get_result(&self, cache_key: &ResultCacheKey) -> Result<Option<ResultCacheValue>>;
    fn store_result(&self, cache_key: &ResultCacheKey, cache_value: &ResultCacheValue) -> Result<()>;

    /// Summaries of every stored result, newest first
    fn list_index(&self) -> Result<Vec<CacheIndexEntry>>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        fs::create_dir_all(format!("{cache_dir}/results"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn results_dir(&self) -> String {
        format!("{}/results", self.cache_dir)
    }

    fn result_path(&self, cache_key: &ResultCacheKey) -> String {
        format!("{}/{}.json", self.results_dir(), cache_key.to_cache_hash())
    }

    fn read_value(path: &Path) -> Result<ResultCacheValue> {
        let json_str = fs::read_to_string(path)?;
        serde_json::from_str(&json_str)
            .map_err(|e| anyhow!("Failed to deserialize cached result {}: {}", path.display(), e))
    }
}

impl ResultStorage for FileStorage {
    fn get_result(&self, cache_key: &ResultCacheKey) -> Result<Option<ResultCacheValue>> {
        let path = self.result_path(cache_key);
        if Path::new(&path).exists() {
            Ok(Some(Self::read_value(Path::new(&path))?))
        } else {
            Ok(None)
        }
    }

    fn store_result(&self, cache_key: &ResultCacheKey, cache_value: &ResultCacheValue) -> Result<()> {
        let path = self.result_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize ResultCacheValue: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }

    fn list_index(&self) -> Result<Vec<CacheIndexEntry>> {
        let mut entries = Vec::new();

        for dir_entry in fs::read_dir(self.results_dir())? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_value(&path) {
                Ok(value) => entries.push(CacheIndexEntry::from(&value)),
                // A stale or half-written entry must not hide the rest
                Err(e) => log::warn!("⚠️  Skipping cache entry: {}", e),
            }
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

/// SHA-256 over the complete document bytes
pub fn calculate_content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Calculate hash for configuration data (part of the cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// No-op storage implementation that disables all caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl ResultStorage for NoOpStorage {
    fn get_result(&self, _cache_key: &ResultCacheKey) -> Result<Option<ResultCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_result(&self, _cache_key: &ResultCacheKey, _cache_value: &ResultCacheValue) -> Result<()> {
        Ok(()) // No-op
    }

    fn list_index(&self) -> Result<Vec<CacheIndexEntry>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsingConfig;
    use crate::types::*;
    use chrono::{Duration, Utc};

    fn sample_result(program: &str, colleges: &[&str]) -> ParseResult {
        let students = colleges
            .iter()
            .enumerate()
            .map(|(i, college)| Student {
                seat_no: format!("131107{i}"),
                name: "STUDENT".to_string(),
                status: EnrollmentStatus::Regular,
                gender: Gender::Male,
                ern: String::new(),
                college: college.to_string(),
                subjects: Vec::new(),
                total_marks: 0,
                max_marks: 0,
                cgpa: 0.0,
                result: Outcome::Failed,
                branch: None,
            })
            .collect();

        ParseResult {
            exam_info: ExamInfo {
                program: program.to_string(),
                ..ExamInfo::default()
            },
            course_metadata: Catalog::new(),
            students,
            statistics: Statistics::default(),
            max_marks: 0,
            unparsed_blocks: 0,
        }
    }

    #[test]
    fn test_content_hash_consistency() {
        let data = b"{\"pages\":[]}";
        assert_eq!(calculate_content_hash(data), calculate_content_hash(data));
        assert_ne!(calculate_content_hash(data), calculate_content_hash(b"{\"pages\":[{}]}"));
    }

    #[test]
    fn test_config_hash_tracks_changes() {
        let default = ParsingConfig::default();
        let mut narrowed = ParsingConfig::default();
        narrowed.grade_average.max = 4.0;

        assert_eq!(
            calculate_config_hash(&default).unwrap(),
            calculate_config_hash(&ParsingConfig::default()).unwrap()
        );
        assert_ne!(
            calculate_config_hash(&default).unwrap(),
            calculate_config_hash(&narrowed).unwrap()
        );
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = std::env::temp_dir().join("gradecard_test_cache_roundtrip");
        std::fs::remove_dir_all(&temp_dir).ok();
        let storage = FileStorage::new(temp_dir.to_str().unwrap()).unwrap();

        let key = ResultCacheKey::new("content".to_string(), "config".to_string());
        assert!(storage.get_result(&key).unwrap().is_none());

        let value = ResultCacheValue::new(sample_result("BE", &["A"]), "sem1.json", &key, 12);
        storage.store_result(&key, &value).unwrap();

        let cached = storage.get_result(&key).unwrap().unwrap();
        assert_eq!(cached.result, value.result);
        assert_eq!(cached.meta, value.meta);

        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_index_is_newest_first() {
        let temp_dir = std::env::temp_dir().join("gradecard_test_cache_index");
        std::fs::remove_dir_all(&temp_dir).ok();
        let storage = FileStorage::new(temp_dir.to_str().unwrap()).unwrap();

        let old_key = ResultCacheKey::new("old".to_string(), "cfg".to_string());
        let mut old = ResultCacheValue::new(sample_result("Old", &["A", "A"]), "old.json", &old_key, 1);
        old.meta.created_at = Utc::now() - Duration::hours(2);
        storage.store_result(&old_key, &old).unwrap();

        let new_key = ResultCacheKey::new("new".to_string(), "cfg".to_string());
        let new = ResultCacheValue::new(sample_result("New", &["A", "B", "B"]), "new.json", &new_key, 1);
        storage.store_result(&new_key, &new).unwrap();

        std::fs::write(temp_dir.join("results").join("broken.json"), "{").unwrap();

        let index = storage.list_index().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].filename, "new.json");
        assert_eq!(index[0].student_count, 3);
        assert_eq!(index[0].institution_count, 2);
        assert_eq!(index[0].hash, new_key.to_cache_hash());
        assert_eq!(index[1].program, "Old");
        assert_eq!(index[1].institution_count, 1);

        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_noop_storage_always_misses() {
        let storage = NoOpStorage::new();
        let key = ResultCacheKey::new("content".to_string(), "config".to_string());
        let value = ResultCacheValue::new(sample_result("BE", &[]), "x.json", &key, 0);

        storage.store_result(&key, &value).unwrap();
        assert!(storage.get_result(&key).unwrap().is_none());
        assert!(storage.list_index().unwrap().is_empty());
    }
}
