use serde::{Deserialize, Serialize};

/// Root macaroon request to the store ACL endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AclRequest<'a> {
    pub permissions: &'a [String],
}

/// Root macaroon response
#[derive(Debug, Clone, Deserialize)]
pub struct AclResponse {
    pub macaroon: String,
}

/// Ubuntu One discharge request
#[derive(Serialize)]
pub struct DischargeRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub caveat_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<&'a str>,
}

/// Ubuntu One discharge response
#[derive(Debug, Clone, Deserialize)]
pub struct DischargeResponse {
    pub discharge_macaroon: String,
}

/// Ubuntu One error response
#[derive(Debug, Clone, Deserialize)]
pub struct SsoErrorResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Store `snaps/info/{name}` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SnapInfo {
    pub name: String,
    pub snap_id: String,
    #[serde(default)]
    pub channel_map: Vec<ChannelMapEntry>,
    #[serde(default)]
    pub default_track: Option<String>,
    #[serde(default)]
    pub snap: Option<SnapDetails>,
}

impl SnapInfo {
    /// Channel map entry for `channel` (e.g. `latest/stable`, or `stable` for the default track)
    /// and `architecture`
    pub fn release(&self, channel: &str, architecture: &str) -> Option<&ChannelMapEntry> {
        self.channel_map
            .iter()
            .find(|entry| entry.channel.matches(channel) && entry.channel.architecture == architecture)
    }
}

/// One released revision in the channel map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelMapEntry {
    pub channel: Channel,
    pub revision: u64,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "type")]
    pub snap_type: Option<String>,
    #[serde(default)]
    pub confinement: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub download: Option<Download>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Channel {
    pub architecture: String,
    pub name: String,
    #[serde(default)]
    pub risk: Option<String>,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub released_at: Option<String>,
}

impl Channel {
    /// Whether this is the channel called `channel`, with or without its track
    pub fn matches(&self, channel: &str) -> bool {
        if self.name == channel {
            return true;
        }
        match (&self.track, &self.risk) {
            (Some(track), Some(risk)) => channel == format!("{}/{}", track, risk),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Download {
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "sha3-384")]
    pub sha3_384: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SnapDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub store_url: Option<String>,
    #[serde(default)]
    pub publisher: Option<Publisher>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Publisher {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub validation: Option<String>,
}
