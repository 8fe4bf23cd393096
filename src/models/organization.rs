use serde::{Deserialize, Serialize};

/// An organization the user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub title: String,
}
