use serde::{Deserialize, Serialize};

pub const STATE_DIRNAME: &str = ".mcserver";
pub const STATE_FILENAME: &str = "state.json";

/// What is installed in a server directory, kept in `.mcserver/state.json`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub pack_id: Option<i32>,
    pub installed_file_id: Option<i32>,
    pub installed_display_name: Option<String>,
    #[serde(default = "default_channel")]
    pub channel: String,
    pub last_updated_at: Option<String>,
}

fn default_provider() -> String {
    "curseforge".into()
}

// only "latest" is tracked for now
fn default_channel() -> String {
    "latest".into()
}

impl Default for ServerState {
    fn default() -> Self {
        ServerState {
            provider: default_provider(),
            pack_id: None,
            installed_file_id: None,
            installed_display_name: None,
            channel: default_channel(),
            last_updated_at: None,
        }
    }
}
