//! LRU cache of fitted models
//!
//! Models are keyed by backend variant, fitting parameters and dataset
//! fingerprint, so a dataset reload with different contents or a backend with
//! different parameters never serves a stale model.

use crate::dataset::{Dataset, DatasetVersion};
use crate::error::{PredictorError, Result};
use crate::training::{Backend, FittedModel, ModelType};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Identifies one fitted model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub model_type: ModelType,
    /// [`Backend::params_tag`] of the backend that fits the model
    pub params: String,
    pub version: DatasetVersion,
}

impl CacheKey {
    pub fn new(backend: &Backend, version: DatasetVersion) -> Self {
        Self {
            model_type: backend.model_type(),
            params: backend.params_tag(),
            version,
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

struct CacheEntry {
    model: Arc<FittedModel>,
    last_used: u64,
}

struct Inner {
    entries: HashMap<CacheKey, CacheEntry>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            debug!(model = %key.model_type, version = key.version.short(), "Evicting cached model");
            self.entries.remove(&key);
        }
    }
}

/// Thread-safe cache of fitted models with least-recently-used eviction
pub struct ModelCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl ModelCache {
    /// Create a cache holding at most `capacity` models
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PredictorError::Config(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                clock: 0,
                hits: 0,
                misses: 0,
            }),
        })
    }

    /// Look up a model without training; counts as a hit or a miss
    pub fn get(&self, key: &CacheKey) -> Option<Arc<FittedModel>> {
        let mut inner = self.inner.lock();
        let now = inner.tick();
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = now;
                let model = Arc::clone(&entry.model);
                inner.hits += 1;
                Some(model)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Return the cached model for this backend and dataset, training on a miss.
    ///
    /// Training runs without holding the lock. When two callers miss on the
    /// same key concurrently, the first model stored wins and both receive it.
    /// Failed training leaves the cache untouched.
    pub fn get_or_train(&self, backend: &Backend, dataset: &Dataset) -> Result<Arc<FittedModel>> {
        let key = CacheKey::new(backend, dataset.version().clone());

        if let Some(model) = self.get(&key) {
            debug!(model = %key.model_type, version = key.version.short(), "Model cache hit");
            return Ok(model);
        }
        debug!(model = %key.model_type, version = key.version.short(), "Model cache miss");

        let (x, y) = dataset.split()?;
        let model = Arc::new(backend.train(&x, &y)?);

        Ok(self.insert(key, model))
    }

    /// Store a model, returning whichever model ends up cached under `key`
    pub fn insert(&self, key: CacheKey, model: Arc<FittedModel>) -> Arc<FittedModel> {
        let mut inner = self.inner.lock();
        let now = inner.tick();

        if let Some(existing) = inner.entries.get_mut(&key) {
            existing.last_used = now;
            return Arc::clone(&existing.model);
        }

        if inner.entries.len() >= self.capacity {
            inner.evict_lru();
        }
        inner.entries.insert(
            key,
            CacheEntry {
                model: Arc::clone(&model),
                last_used: now,
            },
        );
        model
    }

    /// Drop every model trained on `version`; returns how many were removed
    pub fn invalidate(&self, version: &DatasetVersion) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| &key.version != version);
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(version = version.short(), removed, "Invalidated cached models");
        }
        removed
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all models and reset statistics
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::TrainingConfig;
    use polars::prelude::*;

    fn dataset(scale: f64) -> Dataset {
        let df = df!(
            "StudentID" => &[1i64, 2, 3, 4, 5],
            "Age" => &[15.0, 16.0, 17.0, 18.0, 15.0],
            "StudyTimeWeekly" => &[2.0, 9.5, 4.0, 12.0, 7.0],
            "GradeClass" => &[4.0 * scale, 1.0, 3.0, 0.0, 2.0]
        )
        .unwrap();
        Dataset::from_frame(df, "StudentID", "GradeClass").unwrap()
    }

    fn small_forest() -> Backend {
        Backend::new(ModelType::RandomForest, TrainingConfig::default().with_n_estimators(5))
    }

    #[test]
    fn test_hit_returns_same_model() {
        let cache = ModelCache::new(4).unwrap();
        let data = dataset(1.0);

        let first = cache.get_or_train(&Backend::linear(), &data).unwrap();
        let second = cache.get_or_train(&Backend::linear(), &data).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_variants_cached_separately() {
        let cache = ModelCache::new(4).unwrap();
        let data = dataset(1.0);

        let linear = cache.get_or_train(&Backend::linear(), &data).unwrap();
        let forest = cache.get_or_train(&small_forest(), &data).unwrap();

        assert_eq!(linear.model_type(), ModelType::LinearRegression);
        assert_eq!(forest.model_type(), ModelType::RandomForest);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_parameters_cached_separately() {
        let cache = ModelCache::new(4).unwrap();
        let data = dataset(1.0);

        let small = cache.get_or_train(&small_forest(), &data).unwrap();
        let full = cache.get_or_train(&Backend::ensemble(), &data).unwrap();

        assert!(!Arc::ptr_eq(&small, &full));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_new_version_misses() {
        let cache = ModelCache::new(4).unwrap();
        let a = dataset(1.0);
        let b = dataset(0.5);
        assert_ne!(a.version(), b.version());

        let first = cache.get_or_train(&Backend::linear(), &a).unwrap();
        let second = cache.get_or_train(&Backend::linear(), &b).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = ModelCache::new(2).unwrap();
        let a = dataset(1.0);
        let b = dataset(0.5);

        cache.get_or_train(&Backend::linear(), &a).unwrap();
        cache.get_or_train(&small_forest(), &a).unwrap();
        // Touch the linear model so the forest is the oldest
        cache.get_or_train(&Backend::linear(), &a).unwrap();
        cache.get_or_train(&Backend::linear(), &b).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&CacheKey::new(&Backend::linear(), a.version().clone())));
        assert!(!cache.contains(&CacheKey::new(&small_forest(), a.version().clone())));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = ModelCache::new(4).unwrap();
        let a = dataset(1.0);
        let b = dataset(0.5);

        cache.get_or_train(&Backend::linear(), &a).unwrap();
        cache.get_or_train(&small_forest(), &a).unwrap();
        cache.get_or_train(&Backend::linear(), &b).unwrap();

        assert_eq!(cache.invalidate(a.version()), 2);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits + cache.stats().misses, 0);
    }

    #[test]
    fn test_training_error_not_cached() {
        let cache = ModelCache::new(4).unwrap();
        let data = dataset(1.0);
        let broken = Backend::new(
            ModelType::RandomForest,
            TrainingConfig::default().with_n_estimators(0),
        );

        assert!(cache.get_or_train(&broken, &data).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(ModelCache::new(0), Err(PredictorError::Config(_))));
    }
}
