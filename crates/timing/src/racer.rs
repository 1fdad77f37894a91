//! Racer models: participants, relay groups and relay team rosters.
//!
//! A `Racer` is anything the clock engine times independently: an individual
//! participant, or a relay group whose `TeamRoster` rotates students through
//! consecutive passages.

use std::fmt;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::{COLOR_NAMES, COLOR_PALETTE, UNKNOWN_COLOR_NAME};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque identifier of a racer (participant or relay group).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub struct RacerId(String);

impl RacerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identifier (128 bits, lowercase hex).
    pub fn generate() -> Self {
        Self(random_hex_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RacerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RacerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 32 lowercase hex digits drawn from the thread-local RNG.
pub fn random_hex_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

// =============================================================================
// Errors
// =============================================================================

/// Rejected racer construction. Nothing is built when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RacerError {
    /// The display name was empty or whitespace-only.
    EmptyName,
    /// Auto-numbered racers start at 1.
    InvalidNumber(u32),
}

impl fmt::Display for RacerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RacerError::EmptyName => write!(f, "Racer name cannot be empty"),
            RacerError::InvalidNumber(n) => {
                write!(f, "Racer number must be 1 or greater, got {n}")
            }
        }
    }
}

impl std::error::Error for RacerError {}

// =============================================================================
// Race mode
// =============================================================================

/// How passages are credited.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum RaceMode {
    /// Each racer is one person; passages carry no student index.
    #[default]
    Individual,
    /// Each racer is a relay group; passages rotate through its roster.
    Relay,
}

// =============================================================================
// Racer
// =============================================================================

/// A tracked racer: a participant in individual mode, a group in relay mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Racer {
    pub id: RacerId,
    pub name: String,
    pub color: String,
}

impl Racer {
    /// A named participant. The name is trimmed and must not be empty.
    pub fn participant(name: &str, color: Option<&str>) -> Result<Self, RacerError> {
        let name = non_empty(name)?;
        Ok(Self {
            id: RacerId::generate(),
            name,
            color: color.unwrap_or(COLOR_PALETTE[0]).to_string(),
        })
    }

    /// An auto-named participant ("Student 1", "Student 2", ...), coloured
    /// by its number.
    pub fn numbered_participant(number: u32) -> Result<Self, RacerError> {
        if number == 0 {
            return Err(RacerError::InvalidNumber(number));
        }
        Ok(Self {
            id: RacerId::generate(),
            name: format!("Student {number}"),
            color: palette_color(number as usize - 1).to_string(),
        })
    }

    /// A named relay group. The name is trimmed and must not be empty.
    pub fn relay_group(name: &str, color: Option<&str>) -> Result<Self, RacerError> {
        let name = non_empty(name)?;
        Ok(Self {
            id: RacerId::generate(),
            name,
            color: color.unwrap_or(COLOR_PALETTE[0]).to_string(),
        })
    }

    /// An auto-named relay group for a 0-based `index` ("Group 1", ...).
    pub fn numbered_group(index: usize, color: Option<&str>) -> Self {
        Self {
            id: RacerId::generate(),
            name: format!("Group {}", index + 1),
            color: color.unwrap_or(palette_color(index)).to_string(),
        }
    }

    /// Build a racer with a caller-chosen id (restoring from storage, tests).
    pub fn with_id(id: RacerId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }
}

fn non_empty(name: &str) -> Result<String, RacerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(RacerError::EmptyName)
    } else {
        Ok(trimmed.to_string())
    }
}

fn palette_color(index: usize) -> &'static str {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

/// Name of a palette colour, case-insensitive. Unknown colours get a generic name.
pub fn color_name(hex: Option<&str>) -> &'static str {
    let Some(hex) = hex else {
        return UNKNOWN_COLOR_NAME;
    };
    COLOR_PALETTE
        .iter()
        .position(|c| c.eq_ignore_ascii_case(hex))
        .map(|i| COLOR_NAMES[i])
        .unwrap_or(UNKNOWN_COLOR_NAME)
}

// =============================================================================
// Relay roster
// =============================================================================

/// One member of a relay group, running in `order` (0-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct RelayStudent {
    pub id: String,
    pub name: String,
    pub order: u32,
}

impl RelayStudent {
    /// Students are not timed on their own, so an empty name falls back to
    /// "Student {order + 1}" instead of being rejected.
    pub fn new(name: &str, order: u32) -> Self {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            format!("Student {}", order + 1)
        } else {
            trimmed.to_string()
        };
        Self {
            id: random_hex_id(),
            name,
            order,
        }
    }

    pub fn numbered(number: u32, order: u32) -> Self {
        Self::new(&format!("Student {}", number.max(1)), order)
    }
}

/// Ordered list of students composing one relay group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TeamRoster {
    students: Vec<RelayStudent>,
}

impl TeamRoster {
    pub fn new(mut students: Vec<RelayStudent>) -> Self {
        students.sort_by_key(|s| s.order);
        Self { students }
    }

    pub fn students(&self) -> &[RelayStudent] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Rotation modulus for student indices; never zero.
    pub fn team_size(&self) -> usize {
        self.students.len().max(1)
    }

    pub fn student(&self, index: usize) -> Option<&RelayStudent> {
        self.students.get(index)
    }
}
