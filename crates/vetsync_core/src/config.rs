//! Store configuration.

/// Configuration for a [`DurableStore`](crate::DurableStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Prefix prepended to every backend key.
    ///
    /// Lets several stores share one backend without seeing each other's
    /// user scopes.
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "vetsync:".to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend key prefix.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub(crate) fn user_key(&self, user: &str) -> String {
        format!("{}user:{}", self.key_prefix, user)
    }

    /// Inverse of `user_key`; `None` for keys this store did not write.
    pub(crate) fn user_from_key<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.key_prefix.as_str())?
            .strip_prefix("user:")
    }
}
