//! Skill categories shared by tutors, sessions, transactions and programs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Programming,
    Languages,
    Music,
    Design,
    Fitness,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Programming,
        Self::Languages,
        Self::Music,
        Self::Design,
        Self::Fitness,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Programming => "programming",
            Self::Languages => "languages",
            Self::Music => "music",
            Self::Design => "design",
            Self::Fitness => "fitness",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| EngineError::InvalidInput(format!("invalid category: {value}")))
    }
}
