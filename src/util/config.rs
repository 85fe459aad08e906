use std::{
    env, fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use log::{debug, warn};

use crate::{
    error::{Error, Result},
    structs::config::AppConfig,
};

pub const API_KEY_ENV: &str = "CURSEFORGE_API_KEY";

impl AppConfig {
    /// `$XDG_CONFIG_HOME/mcserver/config.json`, `~/.config/mcserver/config.json` if unset
    pub fn path() -> Result<PathBuf> {
        let dirs = BaseDirs::new().ok_or_else(|| Error::Other("Could not determine your home directory".into()))?;
        Ok(dirs.config_dir().join("mcserver").join("config.json"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(AppConfig::default());
        }

        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_string_pretty(self)? + "\n")?;
        restrict_permissions(path);
        debug!("saved config to {}", path.display());
        Ok(())
    }

    /// The api key to use, the environment wins over the stored one
    pub fn api_key(&self) -> Option<String> {
        pick_api_key(env::var(API_KEY_ENV).ok(), self.curseforge_api_key.clone())
    }
}

fn pick_api_key(from_env: Option<String>, stored: Option<String>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or(stored.filter(|k| !k.trim().is_empty()))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!("could not restrict permissions of {}: {err}", path.display());
    }
}

#[cfg(not(unix))]
fn restrict_permissions(path: &Path) {
    warn!("not restricting permissions of {} on this platform", path.display());
}

pub fn mask_secret(value: Option<&str>) -> String {
    match value {
        None | Some("") => "(not set)".into(),
        Some(v) if v.chars().count() <= 6 => "***".into(),
        Some(v) => {
            let chars: Vec<char> = v.chars().collect();
            let head: String = chars[..2].iter().collect();
            let tail: String = chars[chars.len() - 2..].iter().collect();
            format!("{head}***{tail}")
        }
    }
}
