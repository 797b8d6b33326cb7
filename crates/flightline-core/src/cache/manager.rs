use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{CustomField, Member};

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

const MEMBERS_CACHE: &str = "members";
const FIELDS_CACHE: &str = "fields";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Negative ages come from clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// JSON snapshots of the last roster fetch, for startup and offline use.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        debug!(cache = name, "Saved cache");
        Ok(())
    }

    // ===== Members =====

    pub fn load_members(&self) -> Result<Option<CachedData<Vec<Member>>>> {
        self.load(MEMBERS_CACHE)
    }

    pub fn save_members(&self, members: &[Member]) -> Result<()> {
        self.save(MEMBERS_CACHE, &members)
    }

    // ===== Custom Fields =====

    pub fn load_fields(&self) -> Result<Option<CachedData<Vec<CustomField>>>> {
        self.load(FIELDS_CACHE)
    }

    pub fn save_fields(&self, fields: &[CustomField]) -> Result<()> {
        self.save(FIELDS_CACHE, &fields)
    }

    // ===== Cache Age Information =====

    /// Age of the member snapshot, or "never".
    pub fn members_age(&self) -> String {
        match self.load_members() {
            Ok(Some(cached)) => cached.age_display(),
            Ok(None) => "never".to_string(),
            Err(e) => {
                debug!(error = %e, "Failed to load member cache for age display");
                "never".to_string()
            }
        }
    }

    /// Whether the member snapshot is missing, unreadable or older than an hour.
    pub fn is_stale(&self) -> bool {
        match self.load_members() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true,
            Err(e) => {
                debug!(error = %e, "Failed to load member cache for staleness check");
                true
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
