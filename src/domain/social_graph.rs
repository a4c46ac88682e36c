use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Friend {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FriendStatus {
    Exists,
    Created,
    Other(String),
}

impl FriendStatus {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "exists" => Self::Exists,
            "created" => Self::Created,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendRequestOutcome {
    pub status: FriendStatus,
    pub message: Option<String>,
}
