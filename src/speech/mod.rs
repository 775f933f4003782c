//! Press-and-hold to hear a text read aloud.
//!
//! - [`SpeechTrigger`] filters pointer events down to deliberate long presses
//! - [`direct_text`] extracts the text an element owns, without nested elements
//! - [`Speaker`] performs the synthesis; [`CommandSpeaker`] shells out to one

mod speaker;
mod text;
mod trigger;

pub use speaker::{CommandSpeaker, SpeechError, Speaker};
pub use text::direct_text;
pub use trigger::{SpeechRequest, SpeechTrigger};
