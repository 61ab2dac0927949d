/// Voice the bot-platform clients answer chat messages in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub response_style: &'static str,
    pub aviation_knowledge: &'static str,
}

const PERSONAS: [Persona; 5] = [
    Persona {
        id: "friendly_helper",
        name: "Friendly Helper",
        description: "Helpful and cheerful assistant",
        response_style: "casual_friendly",
        aviation_knowledge: "basic",
    },
    Persona {
        id: "dublin_control",
        name: "Dublin Control",
        description: "Professional ATC-style responses",
        response_style: "professional_atc",
        aviation_knowledge: "expert",
    },
    Persona {
        id: "aviation_expert",
        name: "Aviation Expert",
        description: "Technical aviation knowledge specialist",
        response_style: "technical_professional",
        aviation_knowledge: "expert",
    },
    Persona {
        id: "captain_murphy",
        name: "Captain Murphy",
        description: "Veteran pilot with stories and wisdom",
        response_style: "experienced_storyteller",
        aviation_knowledge: "expert",
    },
    Persona {
        id: "sarah_spotter",
        name: "Sarah (Aviation Enthusiast)",
        description: "Excited aircraft spotter",
        response_style: "enthusiastic_casual",
        aviation_knowledge: "intermediate",
    },
];

pub fn persona(id: &str) -> Option<&'static Persona> { PERSONAS.iter().find(|p| p.id == id) }

pub fn personas() -> &'static [Persona] { &PERSONAS }
