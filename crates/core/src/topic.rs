use serde::{Deserialize, Serialize};

/// A single unit of course content.
///
/// Topics are read from the catalog files and never change afterwards. The
/// `example` field is optional in the source documents and defaults to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub example: String,
}

impl Topic {
    /// Creates a topic with no example.
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            example: String::new(),
        }
    }

    /// Attaches an example to the topic.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    /// The content shown while no course is active.
    pub fn placeholder() -> Self {
        Self::new("No content", "Please navigate using voice.")
    }

    /// Checks if the topic carries an example worth reading out.
    pub fn has_example(&self) -> bool {
        !self.example.trim().is_empty()
    }

    /// Renders the topic the way it is read aloud to the learner.
    pub fn narration(&self) -> String {
        let mut text = format!("Topic: {}. Summary: {}", self.title, self.summary);
        if self.has_example() {
            text.push_str(&format!(" Example: {}", self.example));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_defaults_to_empty() {
        let topic: Topic = serde_json::from_str(r#"{"title":"Intro","summary":"Basics"}"#).unwrap();
        assert_eq!(topic.example, "");
        assert!(!topic.has_example());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let topic: Topic =
            serde_json::from_str(r#"{"title":"Intro","summary":"Basics","video":"intro.mp4"}"#)
                .unwrap();
        assert_eq!(topic, Topic::new("Intro", "Basics"));
    }

    #[test]
    fn test_narration_includes_example_only_when_present() {
        let plain = Topic::new("Loops", "Repeat work");
        assert_eq!(plain.narration(), "Topic: Loops. Summary: Repeat work");

        let with_example = plain.with_example("for i in range(3)");
        assert_eq!(
            with_example.narration(),
            "Topic: Loops. Summary: Repeat work Example: for i in range(3)"
        );
    }

    #[test]
    fn test_placeholder_content() {
        let placeholder = Topic::placeholder();
        assert_eq!(placeholder.title, "No content");
        assert_eq!(placeholder.summary, "Please navigate using voice.");
        assert_eq!(placeholder.example, "");
    }
}
