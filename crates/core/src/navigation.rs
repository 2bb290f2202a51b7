//! Navigation State Machine
//!
//! Tracks which course is active and which of its topics the learner is on.
//! The machine has two states: `Idle` (no course) and `Browsing(course, index)`.
//! Every transition reports an [`Outcome`] so callers can decide what to say
//! or return without re-inspecting the state.

use crate::{catalog::Catalog, topic::Topic};
use serde::Serialize;
use std::{fmt, str::FromStr, sync::Arc};

/// A navigation command available while browsing a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Repeat,
    Next,
    Previous,
    Stop,
}

impl NavCommand {
    /// Finds a command inside a free-form transcript.
    ///
    /// Keywords are checked in the order repeat, next, previous, stop, so
    /// "next, no, stop" resolves to `Next`.
    pub fn detect(transcript: &str) -> Option<Self> {
        let transcript = transcript.to_lowercase();
        [Self::Repeat, Self::Next, Self::Previous, Self::Stop]
            .into_iter()
            .find(|command| transcript.contains(command.keyword()))
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Repeat => "repeat",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for NavCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Error returned when a string is not exactly one of the navigation keywords.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown navigation command: '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for NavCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "repeat" => Ok(Self::Repeat),
            "next" => Ok(Self::Next),
            "previous" => Ok(Self::Previous),
            "stop" => Ok(Self::Stop),
            _ => Err(UnknownCommand(s.to_string())),
        }
    }
}

/// What a transition did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A course was selected and browsing starts at its first topic.
    Selected { course: String },
    /// The selection named no known, non-empty course. State unchanged.
    InvalidCourse,
    /// The index moved to a new topic.
    Moved { index: usize },
    Repeated,
    /// `next` on the last topic. State unchanged.
    NoMoreTopics,
    /// `previous` on the first topic. State unchanged.
    AlreadyAtFirst,
    Stopped,
    /// A navigation command arrived while idle. State unchanged.
    NoCourse,
}

/// The active course, the learner's position in it and the course's topics.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    active_course: Option<String>,
    topic_index: usize,
    topics: Option<Arc<[Topic]>>,
}

impl NavigationState {
    /// Creates an idle state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.active_course.is_none()
    }

    pub fn course(&self) -> Option<&str> {
        self.active_course.as_deref()
    }

    pub fn index(&self) -> usize {
        self.topic_index
    }

    pub fn topics(&self) -> &[Topic] {
        self.topics.as_deref().unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.topics().len()
    }

    pub fn current_topic(&self) -> Option<&Topic> {
        self.topics().get(self.topic_index)
    }

    /// Starts browsing `course_name` at its first topic.
    ///
    /// The name must be an exact catalog key with at least one topic; callers
    /// holding free-form input should go through [`Catalog::resolve`] first.
    /// An invalid name leaves the state untouched.
    pub fn select(&mut self, catalog: &Catalog, course_name: &str) -> Outcome {
        match catalog.shared_topics(course_name) {
            Some(topics) if !topics.is_empty() => {
                self.active_course = Some(course_name.to_string());
                self.topic_index = 0;
                self.topics = Some(topics);
                Outcome::Selected {
                    course: course_name.to_string(),
                }
            }
            _ => Outcome::InvalidCourse,
        }
    }

    /// Applies a navigation command.
    pub fn apply(&mut self, command: NavCommand) -> Outcome {
        if self.is_idle() {
            return Outcome::NoCourse;
        }
        match command {
            NavCommand::Repeat => Outcome::Repeated,
            NavCommand::Next if self.topic_index + 1 < self.total() => {
                self.topic_index += 1;
                Outcome::Moved {
                    index: self.topic_index,
                }
            }
            NavCommand::Next => Outcome::NoMoreTopics,
            NavCommand::Previous if self.topic_index > 0 => {
                self.topic_index -= 1;
                Outcome::Moved {
                    index: self.topic_index,
                }
            }
            NavCommand::Previous => Outcome::AlreadyAtFirst,
            NavCommand::Stop => {
                self.reset();
                Outcome::Stopped
            }
        }
    }

    /// Returns to `Idle`.
    pub fn reset(&mut self) {
        self.active_course = None;
        self.topic_index = 0;
        self.topics = None;
    }

    /// A read-only copy of the state as the web client sees it.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            course: self.active_course.clone(),
            index: self.topic_index,
            total_topics: self.total(),
            content: self
                .current_topic()
                .cloned()
                .unwrap_or_else(Topic::placeholder),
        }
    }
}

/// Point-in-time view of the navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub course: Option<String>,
    pub index: usize,
    #[serde(rename = "total")]
    pub total_topics: usize,
    pub content: Topic,
}
