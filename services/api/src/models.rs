//! API Models
//!
//! Request and response shapes of the JSON API, annotated for OpenAPI
//! generation with `utoipa`. Core types are converted into these at the edge.

use clearpath_core::{CommandReply, StateSnapshot, Topic};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct TopicView {
    #[schema(example = "Variables")]
    pub title: String,
    #[schema(example = "Names that refer to values.")]
    pub summary: String,
    #[schema(example = "x = 5")]
    pub example: String,
}

impl From<Topic> for TopicView {
    fn from(topic: Topic) -> Self {
        Self {
            title: topic.title,
            summary: topic.summary,
            example: topic.example,
        }
    }
}

/// Snapshot of the voice navigation state as polled by the web page.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct StateResponse {
    #[schema(example = "Python")]
    pub course: Option<String>,
    pub index: usize,
    /// Number of topics in the active course.
    pub total: usize,
    pub content: TopicView,
}

impl From<StateSnapshot> for StateResponse {
    fn from(snapshot: StateSnapshot) -> Self {
        Self {
            course: snapshot.course,
            index: snapshot.index,
            total: snapshot.total_topics,
            content: snapshot.content.into(),
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct NavigatePayload {
    /// `repeat`, `next`, `previous`, `stop`, or `select <course>` while idle.
    #[schema(example = "next")]
    #[serde(default)]
    pub command: String,
}

/// Result of an injected navigation command.
#[derive(Serialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum NavigateResponse {
    State(StateResponse),
    Stopped {
        #[schema(example = "stop")]
        command: String,
    },
    Error {
        #[schema(example = "No course selected")]
        error: String,
    },
}

impl From<CommandReply> for NavigateResponse {
    fn from(reply: CommandReply) -> Self {
        match reply {
            CommandReply::State(snapshot) => NavigateResponse::State(snapshot.into()),
            CommandReply::Stopped { command } => NavigateResponse::Stopped { command },
            CommandReply::Error { error } => NavigateResponse::Error { error },
        }
    }
}

#[derive(Deserialize, IntoParams, Debug)]
pub struct TopicQuery {
    /// Zero-based topic position, defaults to the first topic.
    #[serde(default)]
    pub topic_index: usize,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
