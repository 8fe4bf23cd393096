use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who can see a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Unlisted,
    ShareLink,
    VisitorAuth,
    InCollection,
    Private,
}

/// Links to a space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceUrls {
    /// The space in the GitBook app
    pub app: String,
}

/// A GitBook space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub title: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub urls: SpaceUrls,
}
