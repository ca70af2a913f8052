//! Reading and writing dotenv-style `KEY="VALUE"` files.
//!
//! Values are written inside double quotes with no escaping, so a value that
//! itself contains `"` or a newline will not survive a write/parse cycle.
//! Keys that the parser would read back differently (empty, leading `#`,
//! containing `=` or a line break, surrounding whitespace) are refused before
//! the file is touched.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{EnvsyncError, Result};
use crate::model::EnvMapping;

pub const ENV_FILE_NAME: &str = ".env";

pub fn parse(path: &Path) -> Result<EnvMapping> {
    let contents = fs::read_to_string(path).map_err(|err| EnvsyncError::file(path, err))?;
    let mapping = parse_str(&contents, path)?;
    debug!(path = %path.display(), keys = mapping.len(), "parsed env file");
    Ok(mapping)
}

/// Parses file contents; `path` is only used in error messages.
pub fn parse_str(contents: &str, path: &Path) -> Result<EnvMapping> {
    let mut mapping = EnvMapping::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let invalid = || EnvsyncError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            content: line.to_string(),
        };

        let (key, value) = line.split_once('=').ok_or_else(invalid)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid());
        }

        mapping.insert(key, strip_quotes(value.trim()));
    }

    Ok(mapping)
}

fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

pub fn serialize<W: Write>(mapping: &EnvMapping, mut writer: W) -> std::io::Result<()> {
    for (key, value) in mapping {
        writeln!(writer, "{key}=\"{value}\"")?;
    }
    writer.flush()
}

/// Truncates or creates `path` and writes `mapping` into it. An existing file
/// is left as it was if any key cannot be represented.
pub fn write_env_file(path: &Path, mapping: &EnvMapping) -> Result<usize> {
    if let Some(key) = mapping.keys().find(|key| !is_writable_key(key)) {
        return Err(EnvsyncError::Validation(format!(
            "key {key:?} cannot be written to an env file"
        )));
    }

    let file = File::create(path).map_err(|err| EnvsyncError::file(path, err))?;
    serialize(mapping, BufWriter::new(file)).map_err(|err| EnvsyncError::file(path, err))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|err| EnvsyncError::file(path, err))?;
    }

    debug!(path = %path.display(), keys = mapping.len(), "wrote env file");
    Ok(mapping.len())
}

fn is_writable_key(key: &str) -> bool {
    !key.is_empty()
        && key.trim() == key
        && !key.starts_with('#')
        && !key.contains(['=', '\n', '\r'])
}
