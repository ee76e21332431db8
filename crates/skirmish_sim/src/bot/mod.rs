//! # Bot AI
//!
//! Bots are ordinary actors driven by a decision function instead of a
//! socket. Each tick a bot:
//!
//! 1. gathers a [`Perception`] (targets and the worst incoming bullet),
//! 2. asks its archetype's decision function for a [`BotIntent`],
//! 3. has the simulation apply the intent (teleport or move, then shoot).
//!
//! Decisions only read shared state; every write happens in the simulation.

mod decide;
mod perception;
mod settings;

pub use decide::{aim, decide, BotContext, BotIntent, Movement};
pub use perception::{Perception, Threat};
pub use settings::{BotSettings, BotTuning};

use serde::{Deserialize, Serialize};

/// Bot behaviour profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotArchetype {
    /// Walks straight at whatever it sees, wanders otherwise.
    Dumb,
    /// Dodges bullets, strafes around visible targets.
    Simple,
    /// Runs for cover when shot at.
    Seeking,
    /// Blinks away from bullets and behind targets.
    Teleporting,
    /// Fast, hard-hitting chaser that also takes cover.
    Danger,
    /// Fastest, hardest-hitting chaser.
    Monsters,
}

impl BotArchetype {
    /// Every archetype, in the order bots are created.
    pub const ALL: [Self; 6] = [
        Self::Dumb,
        Self::Simple,
        Self::Seeking,
        Self::Teleporting,
        Self::Danger,
        Self::Monsters,
    ];

    /// Lowercase name used in ids, names and config keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dumb => "dumb",
            Self::Simple => "simple",
            Self::Seeking => "seeking",
            Self::Teleporting => "teleporting",
            Self::Danger => "danger",
            Self::Monsters => "monsters",
        }
    }

    /// Built-in display color.
    #[must_use]
    pub const fn default_color(self) -> u32 {
        match self {
            Self::Dumb => 0x6E7B8B,
            Self::Simple => 0x00CCFF,
            Self::Seeking => 0x22C55E,
            Self::Teleporting => 0xA855F7,
            Self::Danger => 0xF97316,
            Self::Monsters => 0xEF4444,
        }
    }
}

impl std::fmt::Display for BotArchetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scratch state a bot keeps between ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct BotState {
    /// Behaviour profile.
    pub archetype: BotArchetype,
    /// When the wander heading is re-rolled next (ms).
    pub next_wander_change_at: u64,
    /// Current wander heading in the XZ plane (unit length).
    pub wander_direction: (f32, f32),
    /// Last successful teleport (ms).
    pub last_teleport_at: u64,
}

impl BotState {
    /// Fresh state: heading +X, everything due immediately.
    #[must_use]
    pub const fn new(archetype: BotArchetype) -> Self {
        Self {
            archetype,
            next_wander_change_at: 0,
            wander_direction: (1.0, 0.0),
            last_teleport_at: 0,
        }
    }
}
