use super::Email;

/// Ephemeral cache keys derived from an account email.
pub struct CacheKey;

impl CacheKey {
    pub fn failed(email: &Email) -> String {
        format!("{}:failed", email)
    }

    pub fn token(email: &Email) -> String {
        format!("{}:token", email)
    }

    pub fn roles(email: &Email) -> String {
        format!("{}:roles", email)
    }
}
