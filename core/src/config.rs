//! Resolution of the supervisor's on-disk locations.
//!
//! The registry file location is the only external configuration input:
//! `$TDK_CONFIG_DIR` overrides the directory, which otherwise defaults to
//! `$HOME/.config/termdeck`.

use std::path::PathBuf;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "TDK_CONFIG_DIR";

/// Name of the terminal application the production adapter drives.
pub const HOST_APP: &str = "iTerm2";

/// Resolve the config directory.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config").join("termdeck")
}

/// Path of the persisted registry document.
pub fn registry_path() -> PathBuf {
    config_dir().join("registry.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_path_is_under_config_dir() {
        let p = registry_path();
        assert!(p.ends_with("registry.json"));
        assert!(p.starts_with(config_dir()));
    }
}
