// store

mod ephemeral_cache;
mod store_error;

pub use ephemeral_cache::*;
pub use store_error::*;

// repo

mod account_store;
mod refresh_token_store;

pub use account_store::*;
pub use refresh_token_store::*;

// time

mod clock;

pub use clock::*;
