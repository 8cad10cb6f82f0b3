mod admin_service_impl;
mod credential_verifier_impl;
mod login_throttle;
mod token_service_impl;

pub use admin_service_impl::*;
pub use credential_verifier_impl::*;
pub use login_throttle::*;
pub use token_service_impl::*;
