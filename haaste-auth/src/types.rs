use serde::{Deserialize, Serialize};
use std::fmt::Display;

//--------------------------------------------------------------------------------------------------

// Both are opaque to this crate, nothing checks their format

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Self {
        Username(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Username(name.to_string())
    }
}

impl From<String> for Username {
    fn from(name: String) -> Self {
        Username(name)
    }
}

//--------------------------------------------------------------------------------------------------
