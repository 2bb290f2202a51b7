//! Shared Navigation State
//!
//! The one mutation point for the process-wide [`NavigationState`]. Both the
//! voice session and the HTTP API go through [`SharedNavigation`]; every access
//! holds the lock only for the duration of the read or write, never across
//! speech I/O.
//!
//! Voice sessions hold a [`SessionTicket`]. Starting a new session or stopping
//! through the API invalidates older tickets, and a stale ticket can no longer
//! touch the state.

use crate::{
    catalog::Catalog,
    navigation::{NavCommand, NavigationState, Outcome, StateSnapshot},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Proof that a voice session was started at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket(u64);

#[derive(Debug, Default)]
struct Guarded {
    state: NavigationState,
    generation: u64,
}

/// Cloneable handle to the guarded navigation state.
#[derive(Debug, Clone, Default)]
pub struct SharedNavigation {
    inner: Arc<Mutex<Guarded>>,
}

/// Reply to a command injected through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    State(StateSnapshot),
    Stopped { command: String },
    Error { error: String },
}

pub const NO_COURSE_SELECTED: &str = "No course selected";
pub const INVALID_COURSE: &str = "Invalid course";
const NO_SUMMARY: &str = "No summary available";

impl SharedNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        self.inner.lock().await.state.snapshot()
    }

    /// Resets to `Idle` and issues a fresh ticket, invalidating all earlier ones.
    pub async fn begin_session(&self) -> SessionTicket {
        let mut guarded = self.inner.lock().await;
        guarded.generation += 1;
        guarded.state.reset();
        debug!(generation = guarded.generation, "Issued voice session ticket");
        SessionTicket(guarded.generation)
    }

    /// Invalidates all outstanding tickets without touching the state.
    pub async fn cancel_sessions(&self) {
        let mut guarded = self.inner.lock().await;
        guarded.generation += 1;
    }

    pub async fn is_current(&self, ticket: SessionTicket) -> bool {
        self.inner.lock().await.generation == ticket.0
    }

    /// Runs `f` against the state if `ticket` is still current.
    ///
    /// Returns `None` when the ticket has been superseded; the state is then
    /// left untouched.
    pub async fn with_session<R>(
        &self,
        ticket: SessionTicket,
        f: impl FnOnce(&mut NavigationState) -> R,
    ) -> Option<R> {
        let mut guarded = self.inner.lock().await;
        if guarded.generation != ticket.0 {
            return None;
        }
        Some(f(&mut guarded.state))
    }

    /// Applies a command arriving from the web client.
    ///
    /// While browsing, `repeat`/`next`/`previous` move as usual and `stop`
    /// returns to `Idle` and cancels any running voice session. Reaching the
    /// last topic never ends browsing on this path. While idle, only a
    /// selection (`select <course>` or a bare course name) is accepted.
    pub async fn apply_command(&self, catalog: &Catalog, command: &str) -> CommandReply {
        let command = command.trim().to_lowercase();
        let mut guarded = self.inner.lock().await;

        if guarded.state.is_idle() {
            let requested = command.strip_prefix("select ").map(str::trim);
            let name = requested.unwrap_or(&command);
            let Some(course) = catalog.resolve(name).filter(|course| {
                requested.is_some() || course.eq_ignore_ascii_case(name)
            }) else {
                let error = if requested.is_some() {
                    INVALID_COURSE
                } else {
                    NO_COURSE_SELECTED
                };
                return CommandReply::Error {
                    error: error.to_string(),
                };
            };
            guarded.state.select(catalog, course);
            info!(course, "Course selected through the API");
            return CommandReply::State(api_snapshot(&guarded.state));
        }

        let Ok(nav) = command.parse::<NavCommand>() else {
            return CommandReply::State(api_snapshot(&guarded.state));
        };
        let outcome = guarded.state.apply(nav);
        debug!(command = %nav, ?outcome, "Applied API navigation command");

        if outcome == Outcome::Stopped {
            guarded.generation += 1;
            info!("Course stopped through the API");
            return CommandReply::Stopped {
                command: NavCommand::Stop.to_string(),
            };
        }
        CommandReply::State(api_snapshot(&guarded.state))
    }
}

fn api_snapshot(state: &NavigationState) -> StateSnapshot {
    let mut snapshot = state.snapshot();
    if snapshot.content.summary.is_empty() {
        snapshot.content.summary = NO_SUMMARY.to_string();
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{
                "Python": [
                    {"title": "Intro", "summary": "Basics"},
                    {"title": "Loops", "summary": ""}
                ],
                "Java": [{"title": "Classes", "summary": "Objects"}]
            }"#,
        )
        .unwrap()
    }

    fn index_of(reply: &CommandReply) -> usize {
        match reply {
            CommandReply::State(snapshot) => snapshot.index,
            other => panic!("Expected state reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_idle_navigation_returns_error_without_mutation() {
        let shared = SharedNavigation::new();
        let catalog = catalog();
        for command in ["next", "previous", "repeat", "stop", "ruby"] {
            let reply = shared.apply_command(&catalog, command).await;
            assert_eq!(
                reply,
                CommandReply::Error {
                    error: NO_COURSE_SELECTED.to_string()
                }
            );
        }
        assert_eq!(shared.snapshot().await, NavigationState::new().snapshot());
    }

    #[tokio::test]
    async fn test_select_through_api() {
        let shared = SharedNavigation::new();
        let catalog = catalog();

        let reply = shared.apply_command(&catalog, "select ruby").await;
        assert_eq!(
            reply,
            CommandReply::Error {
                error: INVALID_COURSE.to_string()
            }
        );
        assert!(shared.snapshot().await.course.is_none());

        let reply = shared.apply_command(&catalog, "Python").await;
        assert_eq!(index_of(&reply), 0);
        assert_eq!(shared.snapshot().await.course.as_deref(), Some("Python"));
    }

    #[tokio::test]
    async fn test_next_reply_matches_snapshot() {
        let shared = SharedNavigation::new();
        let catalog = catalog();
        shared.apply_command(&catalog, "select python").await;

        let reply = shared.apply_command(&catalog, "next").await;
        assert_eq!(index_of(&reply), 1);
        assert_eq!(shared.snapshot().await.index, 1);

        // The API path stays on the last topic instead of ending the course.
        let reply = shared.apply_command(&catalog, "next").await;
        assert_eq!(index_of(&reply), 1);
        assert_eq!(shared.snapshot().await.course.as_deref(), Some("Python"));
    }

    #[tokio::test]
    async fn test_empty_summary_falls_back() {
        let shared = SharedNavigation::new();
        let catalog = catalog();
        shared.apply_command(&catalog, "select python").await;
        match shared.apply_command(&catalog, "next").await {
            CommandReply::State(snapshot) => {
                assert_eq!(snapshot.content.summary, "No summary available")
            }
            other => panic!("Expected state reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_resets_and_cancels_sessions() {
        let shared = SharedNavigation::new();
        let catalog = catalog();
        let ticket = shared.begin_session().await;
        shared
            .with_session(ticket, |state| state.select(&catalog, "Java"))
            .await
            .unwrap();

        let reply = shared.apply_command(&catalog, "STOP").await;
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            serde_json::json!({"command": "stop"})
        );
        assert!(!shared.is_current(ticket).await);
        assert_eq!(shared.snapshot().await.content.title, "No content");
    }

    #[tokio::test]
    async fn test_unknown_command_while_browsing_keeps_state() {
        let shared = SharedNavigation::new();
        let catalog = catalog();
        shared.apply_command(&catalog, "java").await;
        let reply = shared.apply_command(&catalog, "dance").await;
        assert_eq!(index_of(&reply), 0);
        assert_eq!(shared.snapshot().await.course.as_deref(), Some("Java"));
    }

    #[tokio::test]
    async fn test_stale_ticket_cannot_mutate() {
        let shared = SharedNavigation::new();
        let catalog = catalog();
        let old = shared.begin_session().await;
        let new = shared.begin_session().await;

        assert!(shared.with_session(old, |state| state.select(&catalog, "Python")).await.is_none());
        assert!(shared.snapshot().await.course.is_none());
        assert!(shared.with_session(new, |state| state.select(&catalog, "Python")).await.is_some());

        shared.cancel_sessions().await;
        assert!(!shared.is_current(new).await);
        assert_eq!(shared.snapshot().await.course.as_deref(), Some("Python"));
    }
}
