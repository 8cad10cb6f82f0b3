mod cache_redis;

pub use cache_redis::*;
