//! Per-archetype tactical numbers.

use super::BotArchetype;
use serde::{Deserialize, Serialize};

/// Lower bound on both bullet multipliers.
const MIN_MULTIPLIER: f32 = 0.25;

/// Resolved settings for one archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BotSettings {
    /// Distance moved per tick.
    pub move_speed: f32,
    /// Planar range within which the bot fires.
    pub shoot_distance: f32,
    /// Minimum time between shots (>= 25).
    pub shoot_cooldown_ms: u64,
    /// Bullets closer than this are considered threats.
    pub dodge_distance: f32,
    /// How far a cover candidate is from the bot.
    pub cover_distance: f32,
    /// Time between teleports.
    pub teleport_cooldown_ms: u64,
    /// Distance behind a target for a flanking teleport.
    pub teleport_distance: f32,
    /// Distance of an evasive teleport.
    pub teleport_away_distance: f32,
    /// Bullet speed multiplier (>= 0.25).
    pub bullet_speed_multiplier: f32,
    /// Bullet damage multiplier (>= 0.25).
    pub bullet_damage_multiplier: f32,
}

impl BotSettings {
    const BASE: Self = Self {
        move_speed: 0.23,
        shoot_distance: 40.0,
        shoot_cooldown_ms: 100,
        dodge_distance: 14.0,
        cover_distance: 6.0,
        teleport_cooldown_ms: 550,
        teleport_distance: 6.2,
        teleport_away_distance: 12.0,
        bullet_speed_multiplier: 1.0,
        bullet_damage_multiplier: 1.0,
    };

    /// Built-in settings for `archetype`.
    #[must_use]
    pub const fn defaults(archetype: BotArchetype) -> Self {
        match archetype {
            BotArchetype::Dumb => Self {
                move_speed: 0.14,
                shoot_distance: 28.0,
                shoot_cooldown_ms: 420,
                dodge_distance: 10.0,
                ..Self::BASE
            },
            BotArchetype::Simple => Self::BASE,
            BotArchetype::Seeking => Self {
                move_speed: 0.28,
                shoot_distance: 48.0,
                shoot_cooldown_ms: 90,
                dodge_distance: 16.0,
                ..Self::BASE
            },
            BotArchetype::Teleporting => Self {
                move_speed: 0.2,
                shoot_distance: 52.0,
                dodge_distance: 16.0,
                teleport_distance: 6.4,
                ..Self::BASE
            },
            BotArchetype::Danger => Self {
                move_speed: 0.38,
                shoot_distance: 60.0,
                shoot_cooldown_ms: 75,
                dodge_distance: 18.0,
                bullet_speed_multiplier: 1.8,
                bullet_damage_multiplier: 1.5,
                ..Self::BASE
            },
            BotArchetype::Monsters => Self {
                move_speed: 0.45,
                shoot_distance: 65.0,
                shoot_cooldown_ms: 60,
                dodge_distance: 20.0,
                bullet_speed_multiplier: 2.4,
                bullet_damage_multiplier: 2.0,
                ..Self::BASE
            },
        }
    }

    /// Defaults for `archetype` with `tuning` applied and floors enforced.
    #[must_use]
    pub fn resolve(archetype: BotArchetype, tuning: &BotTuning) -> Self {
        let base = Self::defaults(archetype);
        Self {
            move_speed: tuning.move_speed.unwrap_or(base.move_speed).max(0.0),
            shoot_distance: tuning.shoot_distance.unwrap_or(base.shoot_distance).max(0.0),
            shoot_cooldown_ms: tuning.shoot_cooldown_ms.unwrap_or(base.shoot_cooldown_ms).max(25),
            dodge_distance: tuning.dodge_distance.unwrap_or(base.dodge_distance).max(0.0),
            cover_distance: tuning.seek_cover_distance.unwrap_or(base.cover_distance).max(0.5),
            teleport_cooldown_ms: tuning.teleport_cooldown_ms.unwrap_or(base.teleport_cooldown_ms),
            teleport_distance: tuning.teleport_distance.unwrap_or(base.teleport_distance),
            teleport_away_distance: tuning.teleport_away_distance.unwrap_or(base.teleport_away_distance),
            bullet_speed_multiplier: tuning
                .bullet_speed_multiplier
                .unwrap_or(base.bullet_speed_multiplier)
                .max(MIN_MULTIPLIER),
            bullet_damage_multiplier: tuning
                .bullet_damage_multiplier
                .unwrap_or(base.bullet_damage_multiplier)
                .max(MIN_MULTIPLIER),
        }
    }

    /// Cooldown of the flanking teleport (>= 100 ms).
    #[must_use]
    pub fn flank_cooldown_ms(&self) -> u64 {
        self.teleport_cooldown_ms.max(100)
    }

    /// Cooldown of the evasive teleport (>= 120 ms).
    #[must_use]
    pub fn escape_cooldown_ms(&self) -> u64 {
        self.teleport_cooldown_ms.max(120)
    }

    /// Flanking distance behind the target (>= 3).
    #[must_use]
    pub fn flank_distance(&self) -> f32 {
        self.teleport_distance.max(3.0)
    }

    /// Evasive teleport distance (>= 8).
    #[must_use]
    pub fn escape_distance(&self) -> f32 {
        self.teleport_away_distance.max(8.0)
    }
}

/// Config overrides for one archetype. Unset fields keep the defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    /// Distance moved per tick.
    pub move_speed: Option<f32>,
    /// Planar firing range.
    pub shoot_distance: Option<f32>,
    /// Time between shots.
    pub shoot_cooldown_ms: Option<u64>,
    /// Threat detection radius.
    pub dodge_distance: Option<f32>,
    /// Cover candidate distance.
    pub seek_cover_distance: Option<f32>,
    /// Time between teleports.
    pub teleport_cooldown_ms: Option<u64>,
    /// Flanking distance.
    pub teleport_distance: Option<f32>,
    /// Evasive distance.
    pub teleport_away_distance: Option<f32>,
    /// Bullet speed multiplier.
    pub bullet_speed_multiplier: Option<f32>,
    /// Bullet damage multiplier.
    pub bullet_damage_multiplier: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_defaults() {
        let dumb = BotSettings::defaults(BotArchetype::Dumb);
        assert_eq!(dumb.shoot_cooldown_ms, 420);
        assert_eq!(dumb.shoot_distance, 28.0);

        let monsters = BotSettings::defaults(BotArchetype::Monsters);
        assert_eq!(monsters.bullet_speed_multiplier, 2.4);
        assert_eq!(monsters.bullet_damage_multiplier, 2.0);

        let teleporting = BotSettings::defaults(BotArchetype::Teleporting);
        assert_eq!(teleporting.teleport_cooldown_ms, 550);
        assert_eq!(teleporting.escape_distance(), 12.0);
    }

    #[test]
    fn test_overrides_and_floors() {
        let tuning = BotTuning {
            move_speed: Some(0.5),
            shoot_cooldown_ms: Some(5),
            bullet_damage_multiplier: Some(0.0),
            teleport_cooldown_ms: Some(10),
            teleport_away_distance: Some(2.0),
            ..BotTuning::default()
        };
        let settings = BotSettings::resolve(BotArchetype::Teleporting, &tuning);
        assert_eq!(settings.move_speed, 0.5);
        assert_eq!(settings.shoot_distance, 52.0);
        assert_eq!(settings.shoot_cooldown_ms, 25);
        assert_eq!(settings.bullet_damage_multiplier, 0.25);
        assert_eq!(settings.flank_cooldown_ms(), 100);
        assert_eq!(settings.escape_cooldown_ms(), 120);
        assert_eq!(settings.escape_distance(), 8.0);
    }
}
