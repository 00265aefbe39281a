//! Locating and reading configuration files.
//!
//! Files are parsed with `serde_json5`, so both JSON5 (comments, unquoted
//! keys, trailing commas) and plain JSON are accepted.
//!
//! Lookup order:
//!
//! 1. `$GHTOOLS_CONFIG`, when it names an existing file
//! 2. `./ghtools.json5`, then `./ghtools.json`
//! 3. `~/.config/ghtools/config.json5`, then `~/.config/ghtools/config.json`

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

const LOCAL_FILE_NAMES: &[&str] = &["ghtools.json5", "ghtools.json"];

const USER_DIR_NAME: &str = "ghtools";

const USER_FILE_NAMES: &[&str] = &["config.json5", "config.json"];

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "GHTOOLS_CONFIG";

/// Returns the first configuration file found, if any.
///
/// # Examples
///
/// ```no_run
/// use ghtools_config::persistence::find_config_file;
///
/// match find_config_file() {
///     Some(path) => println!("using {}", path.display()),
///     None => println!("using built-in defaults"),
/// }
/// ```
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let user_dir = dirs::config_dir().map(|dir| dir.join(USER_DIR_NAME));

    find_config_file_in(explicit, Path::new("."), user_dir.as_deref())
}

/// Same lookup as [`find_config_file`], against the given locations.
///
/// A missing explicit path is skipped rather than reported.
fn find_config_file_in(
    explicit: Option<PathBuf>,
    local_dir: &Path,
    user_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| p.exists()) {
        return Some(path);
    }

    let local = LOCAL_FILE_NAMES.iter().map(|name| local_dir.join(name));
    let user = user_dir
        .into_iter()
        .flat_map(|dir| USER_FILE_NAMES.iter().map(move |name| dir.join(name)));

    local.chain(user).find(|path| path.exists())
}

/// Reads `path` and deserializes it as JSON5.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFile`] if the file cannot be read and
/// [`ConfigError::ParseJson5`] if its content does not deserialize into `T`.
pub fn read_config_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json5::from_str(&content).map_err(ConfigError::from)
}
