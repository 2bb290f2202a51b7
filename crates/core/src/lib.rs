pub mod catalog;
pub mod navigation;
pub mod shared;
pub mod speech;
pub mod topic;
pub mod voice;

pub use catalog::{Catalog, CatalogError};
pub use navigation::{NavCommand, NavigationState, Outcome, StateSnapshot};
pub use shared::{CommandReply, SessionTicket, SharedNavigation};
pub use speech::{ScriptedSpeech, SpeechIo, is_affirmative};
pub use topic::Topic;
pub use voice::{SessionEnd, VoiceSession};
