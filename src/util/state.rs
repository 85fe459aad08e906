use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::debug;

use crate::{
    error::Result,
    structs::state::{ServerState, STATE_DIRNAME, STATE_FILENAME},
};

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`
pub fn utc_now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl ServerState {
    pub fn path(server_dir: &Path) -> PathBuf {
        server_dir.join(STATE_DIRNAME).join(STATE_FILENAME)
    }

    /// `None` when the directory has no manifest yet, a broken manifest is an error
    pub fn load(server_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(server_dir);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let state = serde_json::from_str(&content)?;
        debug!("loaded state from {}", path.display());
        Ok(Some(state))
    }

    pub fn save(&mut self, server_dir: &Path) -> Result<()> {
        let path = Self::path(server_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.last_updated_at.is_none() {
            self.last_updated_at = Some(utc_now_iso());
        }

        fs::write(&path, serde_json::to_string_pretty(self)? + "\n")?;
        debug!("saved state to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use lazy_regex::regex_is_match;
    use tempfile::tempdir;

    use crate::{error::Error, structs::state::ServerState};

    #[test]
    fn missing_manifest_loads_as_none() {
        let dir = tempdir().unwrap();
        assert!(ServerState::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn missing_fields_get_defaults() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".mcserver")).unwrap();
        fs::write(dir.path().join(".mcserver/state.json"), r#"{"packId": 123}"#).unwrap();

        let state = ServerState::load(dir.path()).unwrap().unwrap();
        assert_eq!(state.provider, "curseforge");
        assert_eq!(state.channel, "latest");
        assert_eq!(state.pack_id, Some(123));
        assert_eq!(state.installed_file_id, None);
        assert_eq!(state.last_updated_at, None);
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".mcserver")).unwrap();
        fs::write(dir.path().join(".mcserver/state.json"), "{ not json").unwrap();

        assert!(matches!(ServerState::load(dir.path()), Err(Error::Json(_))));
    }

    #[test]
    fn save_stamps_time_and_uses_stable_keys() {
        let dir = tempdir().unwrap();
        let mut state = ServerState {
            pack_id: Some(42),
            installed_file_id: Some(4242),
            installed_display_name: Some("Pack 1.0".into()),
            ..Default::default()
        };
        state.save(dir.path()).unwrap();

        let stamp = state.last_updated_at.clone().unwrap();
        assert!(regex_is_match!(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$", &stamp));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(".mcserver/state.json")).unwrap()).unwrap();
        assert_eq!(raw["provider"], "curseforge");
        assert_eq!(raw["packId"], 42);
        assert_eq!(raw["installedFileId"], 4242);
        assert_eq!(raw["installedDisplayName"], "Pack 1.0");
        assert_eq!(raw["channel"], "latest");
        assert_eq!(raw["lastUpdatedAt"], stamp.as_str());

        assert_eq!(ServerState::load(dir.path()).unwrap(), Some(state));
    }

    #[test]
    fn save_keeps_caller_timestamp() {
        let dir = tempdir().unwrap();
        let mut state = ServerState {
            last_updated_at: Some("2020-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        state.save(dir.path()).unwrap();

        let loaded = ServerState::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.last_updated_at.as_deref(), Some("2020-01-01T00:00:00Z"));
    }
}
