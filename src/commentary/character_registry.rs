use super::character::{Character, CharacterConfig};
use crate::flight_control::FlightPhase;
use std::collections::HashMap;

/// Data-integrity failures of the registry seed. Any of these is fatal at
/// startup: a registry that cannot be trusted would silently mute the
/// selector.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("character registry is empty")]
    Empty,
    #[error("character at position {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate character id `{0}`")]
    DuplicateId(String),
    #[error("character `{0}` has no speech templates")]
    NoTemplates(String),
    #[error("template {index} of character `{id}` targets no flight phase")]
    TemplateWithoutPhase { id: String, index: usize },
    #[error("character `{id}` has response likelihood {value} outside [0, 1]")]
    LikelihoodOutOfRange { id: String, value: f64 },
    #[error("character `{id}` has professional level {value} outside 1..=10")]
    LevelOutOfRange { id: String, value: u8 },
    #[error("no character with id `{0}`")]
    NotFound(String),
}

/// Read-only collection of characters in registration order.
///
/// Loaded once at startup and shared behind an `Arc` afterwards; nothing in
/// here is mutable.
#[derive(Debug, Clone)]
pub struct CharacterRegistry {
    characters: Vec<Character>,
    by_id: HashMap<String, usize>,
}

impl CharacterRegistry {
    /// Validates `configs` and builds the registry, failing fast on the first
    /// integrity problem.
    pub fn load(configs: Vec<CharacterConfig>) -> Result<Self, RegistryError> {
        if configs.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut characters = Vec::with_capacity(configs.len());
        let mut by_id = HashMap::with_capacity(configs.len());
        for (position, mut config) in configs.into_iter().enumerate() {
            config.id = config.id.trim().to_string();
            Self::validate(position, &config)?;
            if by_id.insert(config.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicateId(config.id));
            }
            characters.push(Character::from_config(config));
        }
        Ok(Self { characters, by_id })
    }

    fn validate(position: usize, config: &CharacterConfig) -> Result<(), RegistryError> {
        let id = config.id.as_str();
        if id.is_empty() {
            return Err(RegistryError::EmptyId(position));
        }
        if config.templates.is_empty() {
            return Err(RegistryError::NoTemplates(id.to_string()));
        }
        if let Some(index) = config.templates.iter().position(|t| t.phases.is_empty()) {
            return Err(RegistryError::TemplateWithoutPhase { id: id.to_string(), index });
        }
        if !(0.0..=1.0).contains(&config.response_likelihood) {
            return Err(RegistryError::LikelihoodOutOfRange {
                id: id.to_string(),
                value: config.response_likelihood,
            });
        }
        if !(1..=10).contains(&config.professional_level) {
            return Err(RegistryError::LevelOutOfRange {
                id: id.to_string(),
                value: config.professional_level,
            });
        }
        Ok(())
    }

    /// Characters with at least one template for `phase`, in registration
    /// order.
    pub fn all_for_phase(&self, phase: FlightPhase) -> Vec<&Character> {
        self.characters.iter().filter(|c| c.speaks_in(phase)).collect()
    }

    pub fn by_id(&self, id: &str) -> Result<&Character, RegistryError> {
        self.by_id
            .get(id)
            .map(|index| &self.characters[*index])
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> { self.characters.iter() }

    pub fn len(&self) -> usize { self.characters.len() }

    pub fn is_empty(&self) -> bool { self.characters.is_empty() }
}
