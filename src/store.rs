use crate::error::Result;

/// Remote holder of named secret blobs, already scoped to one region.
pub trait SecretStore {
    /// Returns the current string content of `name`.
    fn get_secret(&self, name: &str) -> Result<String>;

    /// Creates `name`; fails if the store already holds a secret under that name.
    fn create_secret(&self, name: &str, blob: &str) -> Result<()>;

    /// Replaces the content of an existing secret.
    fn put_secret(&self, name: &str, blob: &str) -> Result<()>;
}

#[cfg(test)]
pub use memory::MemoryStore;
