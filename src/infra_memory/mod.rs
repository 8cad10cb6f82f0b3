mod account_store_memory;
mod cache_memory;
mod refresh_token_store_memory;

pub use account_store_memory::*;
pub use cache_memory::*;
pub use refresh_token_store_memory::*;
