//! Well-known locations: configuration file and token cache.

use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the standard locations.
pub const CONFIG_FILE_NAME: &str = "playsync.conf";

/// Returns the user configuration directory (`~/.config/playsync`), or None
/// if the user's home cannot be resolved.
pub fn try_config_dir() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("PLAYSYNC_CONFIG_DIR") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".config").join("playsync"))
}

/// Configuration file candidates, in lookup order.
///
/// `./playsync.conf`, then `~/.config/playsync/playsync.conf`, then
/// `/etc/playsync/playsync.conf`.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = try_config_dir() {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }
    paths.push(Path::new("/etc/playsync").join(CONFIG_FILE_NAME));
    paths
}

/// Default token cache location: `~/.cache/playsync/token`.
pub fn default_token_cache() -> PathBuf {
    home_dir()
        .map(|h| h.join(".cache").join("playsync"))
        .unwrap_or_else(|| PathBuf::from(".playsync"))
        .join("token")
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/var/cache/t"), PathBuf::from("/var/cache/t"));
        assert_eq!(expand_tilde("rel/t"), PathBuf::from("rel/t"));
    }

    #[test]
    fn test_search_paths_start_with_working_dir() {
        let paths = config_search_paths();
        assert_eq!(paths[0], PathBuf::from(CONFIG_FILE_NAME));
        assert!(paths.last().unwrap().starts_with("/etc/playsync"));
    }
}
