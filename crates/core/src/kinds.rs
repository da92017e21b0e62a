#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Project,
    Requirement,
}

impl NodeType {
    pub const ALL: [NodeType; 2] = [NodeType::Project, NodeType::Requirement];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Project => "Project",
            NodeType::Requirement => "Requirement",
        }
    }

    /// Integer code used in the `Node.Type` column.
    pub fn code(self) -> i64 {
        match self {
            NodeType::Project => 1,
            NodeType::Requirement => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    Administrator,
    User,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Administrator, UserType::User];

    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Administrator => "Administrator",
            UserType::User => "User",
        }
    }

    pub fn code(self) -> i64 {
        match self {
            UserType::Administrator => 1,
            UserType::User => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
