//! Caching of fitted models

mod model_cache;

pub use model_cache::{CacheKey, CacheStats, ModelCache};
