//! Credential resolution seam.
//!
//! Channels resolve their secrets through this single call per send, so the
//! core never holds plaintext credentials. Decryption of stored secrets
//! happens behind the resolver (out of scope here).

use std::collections::HashMap;

/// Resolves a named credential, or reports it absent.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Resolver backed by process environment variables. Empty values count as
/// absent so a blank `TELEGRAM_BOT_TOKEN=` line doesn't pass for a token.
pub struct EnvCredentials;

impl CredentialResolver for EnvCredentials {
    fn resolve(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed in-memory resolver for tests and local experiments.
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }
}

impl CredentialResolver for StaticCredentials {
    fn resolve(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resolver() {
        let creds = StaticCredentials::empty().with("TOKEN", "abc");
        assert_eq!(creds.resolve("TOKEN").as_deref(), Some("abc"));
        assert_eq!(creds.resolve("MISSING"), None);
    }

    #[test]
    fn test_env_resolver_treats_empty_as_absent() {
        // Safety: test-only env mutation, name is unique to this test.
        unsafe { std::env::set_var("RELAY_TEST_EMPTY_CRED", "") };
        assert_eq!(EnvCredentials.resolve("RELAY_TEST_EMPTY_CRED"), None);
        unsafe { std::env::remove_var("RELAY_TEST_EMPTY_CRED") };
    }
}
