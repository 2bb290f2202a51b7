//! Voice Session Controller
//!
//! Drives the navigation state machine from spoken commands: asks for a course,
//! reads topics aloud and reacts to repeat/next/previous/stop until the learner
//! stops, walks off the end of the course, or the session is superseded.
//!
//! All state access goes through [`SharedNavigation::with_session`] so a
//! superseded session can never mutate state, and the ticket is re-checked
//! after every `listen` and before every `speak`.

use crate::{
    catalog::Catalog,
    navigation::{NavCommand, NavigationState, Outcome},
    shared::{SessionTicket, SharedNavigation},
    speech::SpeechIo,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NAVIGATION_PROMPT: &str =
    "What would you like to do? Say repeat, next, previous, or stop.";
pub const NO_MORE_TOPICS: &str = "No more topics. Say repeat, previous, or stop.";
pub const ALREADY_AT_FIRST: &str = "Already at the first topic. Say repeat, next, or stop.";
pub const STOPPING: &str = "Stopping the course. Goodbye.";
pub const ALL_TOPICS_COVERED: &str = "All topics covered. Goodbye.";
pub const NO_COURSES: &str = "There are no courses available right now. Goodbye.";

/// How a voice session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The learner said "stop", or the course was cleared elsewhere.
    Stopped,
    /// The learner walked off the end of the course.
    Completed,
    /// A newer session or an API stop took over.
    Cancelled,
}

/// Marker for a session whose ticket has been superseded.
struct Cancelled;

/// One learner's voice-navigation interaction.
pub struct VoiceSession {
    speech: Arc<dyn SpeechIo>,
    catalog: Arc<Catalog>,
    navigation: SharedNavigation,
    ticket: SessionTicket,
}

impl VoiceSession {
    pub fn new(
        speech: Arc<dyn SpeechIo>,
        catalog: Arc<Catalog>,
        navigation: SharedNavigation,
        ticket: SessionTicket,
    ) -> Self {
        Self {
            speech,
            catalog,
            navigation,
            ticket,
        }
    }

    /// Runs the session to completion.
    pub async fn run(self) -> SessionEnd {
        let end = match self.drive().await {
            Ok(end) => end,
            Err(Cancelled) => SessionEnd::Cancelled,
        };
        info!(?end, "Voice session ended");
        end
    }

    async fn drive(&self) -> Result<SessionEnd, Cancelled> {
        let courses = self.catalog.spoken_course_list();
        if courses.is_empty() {
            warn!("Voice session started without any selectable course");
            self.say(NO_COURSES).await?;
            return Ok(SessionEnd::Stopped);
        }

        self.say(&format!("Welcome! Please say {courses} to start a course."))
            .await?;
        let Some(course) = self.choose_course(&courses).await? else {
            self.say(STOPPING).await?;
            self.mutate(NavigationState::reset).await?;
            return Ok(SessionEnd::Stopped);
        };
        self.say(&format!("Starting {course} course.")).await?;
        self.browse().await
    }

    /// Prompts until a known course is heard or the learner says stop.
    /// A course selected through the API while waiting is taken over as is.
    /// There is no retry limit.
    async fn choose_course(&self, courses: &str) -> Result<Option<String>, Cancelled> {
        let prompt = format!("Which course? Say {courses}.");
        loop {
            let answer = self.ask(&prompt).await?;
            if let Some(course) = self
                .mutate(|state| state.course().map(str::to_owned))
                .await?
            {
                info!(%course, "Course already selected elsewhere");
                return Ok(Some(course));
            }
            if answer.is_empty() {
                continue;
            }
            if let Some(name) = self.catalog.resolve(&answer) {
                let outcome = self
                    .mutate(|state| state.select(&self.catalog, name))
                    .await?;
                if let Outcome::Selected { course } = outcome {
                    info!(%course, "Course selected by voice");
                    return Ok(Some(course));
                }
            }
            if NavCommand::detect(&answer) == Some(NavCommand::Stop) {
                return Ok(None);
            }
            debug!(%answer, "Answer did not name a course");
            self.say(&format!("Invalid course. Please say {courses}."))
                .await?;
        }
    }

    async fn browse(&self) -> Result<SessionEnd, Cancelled> {
        let mut walk_off_pending = false;
        loop {
            let Some(topic) = self.mutate(|state| state.current_topic().cloned()).await? else {
                return Ok(SessionEnd::Stopped);
            };
            self.say(&topic.narration()).await?;

            loop {
                let answer = self.ask(NAVIGATION_PROMPT).await?;
                let Some(command) = NavCommand::detect(&answer) else {
                    continue;
                };

                if command == NavCommand::Stop {
                    self.say(STOPPING).await?;
                    self.mutate(NavigationState::reset).await?;
                    return Ok(SessionEnd::Stopped);
                }

                match self.mutate(|state| state.apply(command)).await? {
                    Outcome::Moved { index } => {
                        debug!(index, %command, "Moved to topic");
                        walk_off_pending = false;
                        break;
                    }
                    Outcome::Repeated => {
                        walk_off_pending = false;
                        break;
                    }
                    Outcome::NoMoreTopics if walk_off_pending => {
                        self.say(ALL_TOPICS_COVERED).await?;
                        self.mutate(NavigationState::reset).await?;
                        return Ok(SessionEnd::Completed);
                    }
                    Outcome::NoMoreTopics => {
                        walk_off_pending = true;
                        self.say(NO_MORE_TOPICS).await?;
                    }
                    Outcome::AlreadyAtFirst => {
                        walk_off_pending = false;
                        self.say(ALREADY_AT_FIRST).await?;
                    }
                    Outcome::NoCourse => return Ok(SessionEnd::Stopped),
                    other => warn!(?other, "Unexpected navigation outcome"),
                }
            }
        }
    }

    async fn ensure_live(&self) -> Result<(), Cancelled> {
        if self.navigation.is_current(self.ticket).await {
            Ok(())
        } else {
            Err(Cancelled)
        }
    }

    async fn say(&self, text: &str) -> Result<(), Cancelled> {
        self.ensure_live().await?;
        self.speech.speak(text).await;
        Ok(())
    }

    async fn ask(&self, prompt: &str) -> Result<String, Cancelled> {
        self.ensure_live().await?;
        let answer = self.speech.listen(prompt).await;
        self.ensure_live().await?;
        Ok(answer)
    }

    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut NavigationState) -> R,
    ) -> Result<R, Cancelled> {
        self.navigation
            .with_session(self.ticket, f)
            .await
            .ok_or(Cancelled)
    }
}
