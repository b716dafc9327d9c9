use serde::{Deserialize, Serialize};

/// The signed-in user, as far as the weigh-in flow cares about them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    /// Feet and inches joined by an underscore, e.g. `5_10`.
    pub height: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<String>,
    #[serde(default)]
    pub athlete_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Endpoint that accepts weigh-in records. Without one, records are printed instead.
    pub url: Option<String>,
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub backend: BackendConfig,
}
