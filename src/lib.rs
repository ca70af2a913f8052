//! Keeps local `.env` files and AWS Secrets Manager secrets in sync.
//!
//! A secret is expected to hold a flat JSON object of string values; the
//! same mapping is written locally as `KEY="VALUE"` lines. Plaintext secrets
//! are left alone.

pub mod aws;
pub mod cli;
pub mod envfile;
pub mod error;
pub mod keygen;
pub mod model;
pub mod store;
pub mod sync;
