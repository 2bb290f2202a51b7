//! Voice Session Registry
//!
//! Keeps at most one voice session alive. Starting a session invalidates the
//! previous one's ticket; the old task notices at its next safe point and
//! exits on its own.

use clearpath_core::{Catalog, SessionEnd, SessionTicket, SharedNavigation, SpeechIo, VoiceSession};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub struct SessionRegistry {
    speech: Arc<dyn SpeechIo>,
    catalog: Arc<Catalog>,
    navigation: SharedNavigation,
    /// Ticket and task of the most recent session.
    current: Mutex<Option<(SessionTicket, JoinHandle<SessionEnd>)>>,
}

impl SessionRegistry {
    pub fn new(speech: Arc<dyn SpeechIo>, catalog: Arc<Catalog>, navigation: SharedNavigation) -> Self {
        Self {
            speech,
            catalog,
            navigation,
            current: Mutex::new(None),
        }
    }

    /// Resets navigation to idle and spawns a fresh voice session in place of
    /// any running one.
    pub async fn start(&self) -> SessionTicket {
        // Held across ticket issue and spawn so the stored task always owns the newest ticket.
        let mut current = self.current.lock().await;
        let ticket = self.navigation.begin_session().await;
        let session_id = Uuid::new_v4();
        let session = VoiceSession::new(
            self.speech.clone(),
            self.catalog.clone(),
            self.navigation.clone(),
            ticket,
        );
        let handle = tokio::spawn(
            session
                .run()
                .instrument(info_span!("voice_session", %session_id)),
        );
        info!(%session_id, "Started voice session");

        // The replaced task holds a stale ticket and winds down by itself.
        current.replace((ticket, handle));
        ticket
    }

    /// Cancels the running session and waits for its task to go away.
    pub async fn shutdown(&self) {
        let mut current = self.current.lock().await;
        self.navigation.cancel_sessions().await;
        if let Some((_, handle)) = current.take() {
            handle.abort();
            let _ = handle.await;
            info!("Voice session shut down");
        }
    }

    #[cfg(test)]
    async fn take_current(&self) -> Option<(SessionTicket, JoinHandle<SessionEnd>)> {
        self.current.lock().await.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearpath_core::ScriptedSpeech;

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::from_json(r#"{"Python": [{"title":"Intro","summary":"Basics"}]}"#).unwrap())
    }

    #[tokio::test]
    async fn test_session_runs_script_to_the_end() {
        let speech = Arc::new(ScriptedSpeech::new(["python", "stop"]));
        let navigation = SharedNavigation::new();
        let registry = SessionRegistry::new(speech.clone(), catalog(), navigation.clone());

        let ticket = registry.start().await;
        assert!(navigation.is_current(ticket).await);

        let (current, handle) = registry.take_current().await.unwrap();
        assert_eq!(current, ticket);
        let end = handle.await.unwrap();
        assert_eq!(end, SessionEnd::Stopped);
        assert!(speech.spoken().contains(&"Starting Python course.".to_string()));
        assert!(navigation.snapshot().await.course.is_none());
    }

    #[tokio::test]
    async fn test_new_session_supersedes_previous_ticket() {
        let speech = Arc::new(ScriptedSpeech::new(Vec::<String>::new()));
        let navigation = SharedNavigation::new();
        let registry = SessionRegistry::new(speech, catalog(), navigation.clone());

        let first = registry.start().await;
        let second = registry.start().await;
        assert_ne!(first, second);
        assert!(!navigation.is_current(first).await);
        assert!(navigation.is_current(second).await);
        registry.shutdown().await;
        assert!(!navigation.is_current(second).await);
        assert!(registry.take_current().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_keep_newest_session() {
        let speech = Arc::new(ScriptedSpeech::new(Vec::<String>::new()));
        let navigation = SharedNavigation::new();
        let registry = Arc::new(SessionRegistry::new(speech, catalog(), navigation.clone()));

        let starts: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.start().await })
            })
            .collect();
        for start in starts {
            start.await.unwrap();
        }

        let (stored, handle) = registry.take_current().await.unwrap();
        assert!(navigation.is_current(stored).await);
        handle.abort();
    }
}
