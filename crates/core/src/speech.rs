//! Speech I/O
//!
//! The voice flow only needs two capabilities: say something and wait until it
//! has been said, and ask something and get back what the learner answered.
//! Both are infallible from the caller's side; implementations contain their
//! own failures and degrade to "nothing was said" / an empty transcript.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Defines the contract for any speech backend the voice session can drive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechIo: Send + Sync {
    /// Synthesizes `text` and returns once playback has finished.
    ///
    /// Failures are logged by the implementation and treated as a no-op.
    async fn speak(&self, text: &str);

    /// Speaks `prompt`, records one bounded utterance and returns its
    /// lower-cased transcript, or an empty string if nothing usable was heard.
    async fn listen(&self, prompt: &str) -> String;
}

/// Returns true if the answer contains a spoken "yes".
pub fn is_affirmative(transcript: &str) -> bool {
    transcript
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| matches!(word.to_lowercase().as_str(), "yes" | "yeah" | "yep" | "yup"))
}

/// A deterministic `SpeechIo` for development and integration testing.
///
/// Answers come from a fixed script. Once the script runs out every further
/// `listen` answers `stop`, so a voice session driven by it always ends.
/// Everything spoken, prompts included, is recorded in order.
#[derive(Debug, Default)]
pub struct ScriptedSpeech {
    answers: Mutex<VecDeque<String>>,
    spoken: Mutex<Vec<String>>,
}

impl ScriptedSpeech {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// Everything spoken so far.
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.spoken).clone()
    }

    /// Number of scripted answers not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.answers).len()
    }
}

#[async_trait]
impl SpeechIo for ScriptedSpeech {
    async fn speak(&self, text: &str) {
        lock(&self.spoken).push(text.to_string());
    }

    async fn listen(&self, prompt: &str) -> String {
        self.speak(prompt).await;
        lock(&self.answers)
            .pop_front()
            .map(|answer| answer.to_lowercase())
            .unwrap_or_else(|| "stop".to_string())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("Yeah I am"));
        assert!(is_affirmative("yep."));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yesterday"));
        assert!(!is_affirmative(""));
    }

    #[tokio::test]
    async fn test_scripted_speech_records_prompts_and_answers() {
        let speech = ScriptedSpeech::new(["Python", "next"]);
        speech.speak("Welcome").await;
        assert_eq!(speech.listen("Which course?").await, "python");
        assert_eq!(speech.listen("What now?").await, "next");
        assert_eq!(speech.remaining(), 0);
        assert_eq!(speech.listen("What now?").await, "stop");
        assert_eq!(
            speech.spoken(),
            vec!["Welcome", "Which course?", "What now?", "What now?"]
        );
    }

    #[tokio::test]
    async fn test_mock_speech_through_trait_object() {
        let mut mock = MockSpeechIo::new();
        mock.expect_listen()
            .withf(|prompt| prompt.contains("visually impaired"))
            .times(1)
            .returning(|_| "yes".to_string());

        let speech: Box<dyn SpeechIo> = Box::new(mock);
        let answer = speech.listen("Are you visually impaired?").await;
        assert!(is_affirmative(&answer));
    }
}
