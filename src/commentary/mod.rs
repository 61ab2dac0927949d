//! Characters, their speech templates and the selector deciding who talks.

mod cast;
mod character;
mod character_registry;
mod commentary_selector;
mod pronunciation;
mod template;
mod utterance;


pub use cast::default_cast;
pub use character::{
    Character, CharacterConfig, Personality, PhaseTarget, SpeechTemplate, TemplateConfig,
};
pub use character_registry::{CharacterRegistry, RegistryError};
pub use commentary_selector::{
    CharacterStatus, CommentarySelector, CooldownPolicy, LikelihoodDraw, RngDraw,
};
pub use pronunciation::{phonetic, spoken_altitude, spoken_heading, spoken_speed};
pub use template::{RenderContext, render};
pub use utterance::Utterance;
