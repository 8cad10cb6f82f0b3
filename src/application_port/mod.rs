mod admin_service;
mod refresh_service;
mod sign_in_service;

pub use admin_service::*;
pub use refresh_service::*;
pub use sign_in_service::*;
