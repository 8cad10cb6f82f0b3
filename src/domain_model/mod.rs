mod account;
mod cache_key;
mod lockout;
mod role;
mod session;

pub use account::*;
pub use cache_key::*;
pub use lockout::*;
pub use role::*;
pub use session::*;
