//! Model types

use super::mapper::string_or_number;
use crate::pagination::Item;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account as it appears in relational lists, likes and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Numeric account id
    #[serde(alias = "pk", deserialize_with = "string_or_number")]
    pub id: String,
    /// Handle
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_private: bool,
}

impl Item for Account {
    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Reference to the account that owns a media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A post in a timeline, hashtag or location feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Short code used in post URLs
    #[serde(default, alias = "code")]
    pub shortcode: Option<String>,
    /// Unix seconds
    #[serde(default, alias = "taken_at")]
    pub taken_at_timestamp: Option<i64>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    edge_media_to_caption: CaptionEdges,
}

impl Media {
    /// Caption text, if the post has one
    pub fn caption(&self) -> Option<&str> {
        self.edge_media_to_caption
            .edges
            .first()
            .map(|edge| edge.node.text.as_str())
    }
}

impl Item for Media {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at_timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CaptionEdges {
    #[serde(default)]
    edges: Vec<CaptionEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CaptionEdge {
    node: CaptionNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CaptionNode {
    text: String,
}

/// A comment on a media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Unix seconds
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub owner: Option<Account>,
}

impl Item for Comment {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// A direct-message thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(deserialize_with = "string_or_number")]
    pub thread_id: String,
    #[serde(default)]
    pub thread_title: Option<String>,
    #[serde(default)]
    pub users: Vec<Account>,
    /// Unix microseconds
    #[serde(default)]
    pub last_activity_at: Option<i64>,
    #[serde(default)]
    pub is_group: bool,
}

impl Item for Thread {
    fn id(&self) -> String {
        self.thread_id.clone()
    }
}
