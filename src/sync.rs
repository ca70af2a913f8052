//! Moving mappings between local `.env` files and remote secrets.
//!
//! Every operation does all local work and every remote read before its single
//! remote write, so a failure leaves the remote secret untouched.
//!
//! Merge and upsert are get-modify-put sequences with no version check: a
//! concurrent writer that lands between the fetch and the put is overwritten
//! (last writer wins).

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::envfile;
use crate::error::{EnvsyncError, Result};
use crate::keygen;
use crate::model::{EnvMapping, SecretContent};
use crate::store::SecretStore;

/// Whether a publish creates a new secret or upserts into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    Create,
    Update,
}

/// A key that was generated and stored; `value` should be shown to the user once.
#[derive(Debug)]
pub struct Published {
    pub mode: PublishMode,
    pub value: SecretString,
}

/// Fetches `name` and decodes it, refusing plaintext secrets.
pub fn fetch_mapping<S: SecretStore>(store: &S, name: &str) -> Result<EnvMapping> {
    let blob = store.get_secret(name)?;
    SecretContent::decode(&blob).into_mapping(name)
}

/// Overwrites `dest` with the remote mapping. Nothing is written locally if
/// the fetch or decode fails.
pub fn pull_to_file<S: SecretStore>(store: &S, name: &str, dest: &Path) -> Result<usize> {
    let mapping = fetch_mapping(store, name)?;
    let written = envfile::write_env_file(dest, &mapping)?;
    info!(secret = name, keys = written, path = %dest.display(), "pulled secret");
    Ok(written)
}

/// Upserts every entry of the local file into the existing secret.
pub fn push_merge_from_file<S: SecretStore>(
    store: &S,
    name: &str,
    path: &Path,
) -> Result<Vec<String>> {
    let local = envfile::parse(path)?;
    let mut remote = fetch_mapping(store, name)?;

    remote.merge_from(&local);
    debug!(secret = name, local = local.len(), merged = remote.len(), "merged mappings");
    store.put_secret(name, &remote.to_json()?)?;

    info!(secret = name, keys = local.len(), "merged env file into secret");
    Ok(local.keys().map(str::to_string).collect())
}

/// Creates a new secret holding exactly the local file's entries.
pub fn push_create_from_file<S: SecretStore>(
    store: &S,
    name: &str,
    path: &Path,
) -> Result<Vec<String>> {
    let local = envfile::parse(path)?;
    store.create_secret(name, &local.to_json()?)?;

    info!(secret = name, keys = local.len(), "created secret from env file");
    Ok(local.keys().map(str::to_string).collect())
}

pub fn create_pair<S: SecretStore>(store: &S, name: &str, key: &str, value: &str) -> Result<()> {
    validate_key_name(key)?;

    let mut mapping = EnvMapping::new();
    mapping.insert(key, value);
    store.create_secret(name, &mapping.to_json()?)?;

    info!(secret = name, key, "created secret");
    Ok(())
}

pub fn upsert_pair<S: SecretStore>(store: &S, name: &str, key: &str, value: &str) -> Result<()> {
    validate_key_name(key)?;

    let mut mapping = fetch_mapping(store, name)?;
    mapping.insert(key, value);
    store.put_secret(name, &mapping.to_json()?)?;

    info!(secret = name, key, "updated secret");
    Ok(())
}

/// Generates a key of `length` characters and stores it under `key` in `name`.
pub fn generate_and_publish<S: SecretStore>(
    store: &S,
    name: &str,
    key: &str,
    length: usize,
    mode: PublishMode,
) -> Result<Published> {
    validate_key_name(key)?;
    let value = keygen::generate(length)?;

    match mode {
        PublishMode::Create => create_pair(store, name, key, value.expose_secret())?,
        PublishMode::Update => upsert_pair(store, name, key, value.expose_secret())?,
    }

    Ok(Published { mode, value })
}

fn validate_key_name(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(EnvsyncError::Validation("secret key cannot be empty".to_string()));
    }
    Ok(())
}
