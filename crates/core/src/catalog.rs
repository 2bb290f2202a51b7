//! Course Catalog
//!
//! A catalog maps course names to their ordered topic lists. It is loaded once
//! from a JSON document at startup and is read-only afterwards. A missing or
//! malformed document is a startup error; lookups for unknown courses are not
//! errors and simply yield nothing.

use crate::topic::Topic;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Errors raised while loading a catalog document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Catalog {origin} contains invalid JSON: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The static, course-name-keyed set of topic sequences.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: BTreeMap<String, Arc<[Topic]>>,
}

impl Catalog {
    /// Loads a catalog from a JSON file shaped like `{"Course": [{title, summary, example?}]}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&raw, path.display().to_string())?;
        info!(
            path = %path.display(),
            courses = catalog.courses.len(),
            "Course catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses a catalog from an in-memory JSON document.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Self::parse(raw, "<inline>".to_string())
    }

    fn parse(raw: &str, origin: String) -> Result<Self, CatalogError> {
        let courses: BTreeMap<String, Vec<Topic>> =
            serde_json::from_str(raw).map_err(|source| CatalogError::Parse { origin, source })?;
        Ok(Self {
            courses: courses
                .into_iter()
                .map(|(name, topics)| (name, Arc::from(topics)))
                .collect(),
        })
    }

    /// Returns the topics of a course, or an empty slice for an unknown course.
    pub fn get_topics(&self, course_name: &str) -> &[Topic] {
        self.courses
            .get(course_name)
            .map(|topics| topics.as_ref())
            .unwrap_or(&[])
    }

    /// Returns the shared topic list of a course.
    pub(crate) fn shared_topics(&self, course_name: &str) -> Option<Arc<[Topic]>> {
        self.courses.get(course_name).cloned()
    }

    /// Returns a single topic, or `None` if the course is unknown or the index is out of range.
    pub fn topic(&self, course_name: &str, index: usize) -> Option<&Topic> {
        self.get_topics(course_name).get(index)
    }

    pub fn course_names(&self) -> impl Iterator<Item = &str> {
        self.courses.keys().map(String::as_str)
    }

    /// Maps a spoken or typed answer onto a selectable course name.
    ///
    /// An exact, case-insensitive match wins. Otherwise the first course whose
    /// name appears as whole words inside the answer is chosen. Courses without
    /// topics are never selectable.
    pub fn resolve(&self, answer: &str) -> Option<&str> {
        let answer = normalize(answer);
        if answer.is_empty() {
            return None;
        }
        let selectable = || {
            self.courses
                .iter()
                .filter(|(_, topics)| !topics.is_empty())
                .map(|(name, _)| name.as_str())
        };

        if let Some(name) = selectable().find(|name| normalize(name) == answer) {
            return Some(name);
        }

        let padded = format!(" {answer} ");
        selectable().find(|name| {
            let needle = normalize(name);
            !needle.is_empty() && padded.contains(&format!(" {needle} "))
        })
    }

    /// Joins course names for a spoken prompt, e.g. "Java or Python".
    pub fn spoken_course_list(&self) -> String {
        let names: Vec<&str> = self
            .courses
            .iter()
            .filter(|(_, topics)| !topics.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        match names.split_last() {
            None => String::new(),
            Some((last, [])) => last.to_string(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        }
    }
}

/// Lower-cases and collapses everything but letters and digits into single spaces.
fn normalize(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
