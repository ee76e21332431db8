//! # Game Configuration
//!
//! One typed config for the whole server, loaded once from an optional TOML
//! file. Every section has defaults, so an empty file (or no file) is a valid
//! config. [`GameConfig::validated`] is the only place values are clamped.
//!
//! ```toml
//! log_level = "debug"
//!
//! [arena]
//! half_size = 120
//!
//! [bots.counts]
//! simple = 4
//! monsters = 1
//!
//! [bots.settings.monsters]
//! move_speed = 0.5
//! ```

use crate::bot::{BotArchetype, BotTuning};
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use skirmish_shared::constants::{ACTOR_HEIGHT, ACTOR_RADIUS, GROUND_Y};
use skirmish_shared::{clamp, BROADCAST_RATE, DEFAULT_BIND, TICK_RATE};
use skirmish_world::WorldConfig;
use std::path::{Path, PathBuf};

/// Top-level server configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Arena size and ground level.
    pub arena: ArenaConfig,
    /// Actor shape and health.
    pub player: PlayerConfig,
    /// Bullets and shooting.
    pub combat: CombatConfig,
    /// Client input settings echoed in `joinResponse`.
    pub input: InputConfig,
    /// Automatic respawn.
    pub respawn: RespawnConfig,
    /// Rates, addresses and snapshot limits.
    pub network: NetworkConfig,
    /// Kill log persistence.
    pub kill_log: KillLogConfig,
    /// World generation tunables.
    pub world: WorldConfig,
    /// Bot population and tactics.
    pub bots: BotsConfig,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            player: PlayerConfig::default(),
            combat: CombatConfig::default(),
            input: InputConfig::default(),
            respawn: RespawnConfig::default(),
            network: NetworkConfig::default(),
            kill_log: KillLogConfig::default(),
            world: WorldConfig::default(),
            bots: BotsConfig::default(),
            log_level: "info".to_owned(),
        }
    }
}

/// Arena section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Requested half-size. The generated arena may be larger.
    pub half_size: f32,
    /// Ground height actors stand on.
    pub spawn_y: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            half_size: 80.0,
            spawn_y: GROUND_Y,
        }
    }
}

/// Player section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Health on spawn.
    pub max_health: f32,
    /// Collision radius.
    pub radius: f32,
    /// Collision height.
    pub height: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            radius: ACTOR_RADIUS,
            height: ACTOR_HEIGHT,
        }
    }
}

/// Combat section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Distance a bullet travels per tick.
    pub bullet_speed: f32,
    /// Damage per hit before multipliers.
    pub bullet_damage: f32,
    /// Minimum time between two shots of one player.
    pub shoot_cooldown_ms: u64,
    /// Ticks before a bullet expires.
    pub bullet_max_age: u32,
    /// A bullet hits an actor whose feet are closer than this.
    pub bullet_hit_distance: f32,
    /// Bullets leave this far above the shooter's feet.
    pub muzzle_height: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            bullet_speed: 1.0,
            bullet_damage: 25.0,
            shoot_cooldown_ms: 100,
            bullet_max_age: 300,
            bullet_hit_distance: 2.0,
            muzzle_height: 0.6,
        }
    }
}

/// Input section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Mouse look sensitivity, radians per pixel.
    pub look_sensitivity: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { look_sensitivity: 0.006 }
    }
}

/// Respawn section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    /// Respawn dead actors after `auto_respawn_secs`.
    pub auto_respawn: bool,
    /// Delay before an automatic respawn.
    pub auto_respawn_secs: f32,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            auto_respawn: true,
            auto_respawn_secs: 3.0,
        }
    }
}

impl RespawnConfig {
    /// Delay in milliseconds, or `None` when auto-respawn is off.
    #[must_use]
    pub fn delay_ms(&self) -> Option<u64> {
        self.auto_respawn
            .then(|| (self.auto_respawn_secs.max(0.0) * 1000.0).round() as u64)
    }
}

/// Network section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Game listener address.
    pub bind: String,
    /// Debug listener address. Disabled when unset.
    pub debug_bind: Option<String>,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Snapshots per second (never above `tick_rate`).
    pub broadcast_rate: u32,
    /// Decimal places kept in snapshots. 0 disables rounding.
    pub snapshot_precision: u32,
    /// Newest bullets per snapshot. 0 means all.
    pub max_bullets_per_state: usize,
    /// Newest kills per snapshot.
    pub max_kills_per_state: usize,
    /// Cell edge of the bullet hit broadphase.
    pub collision_grid_cell_size: f32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_owned(),
            debug_bind: None,
            tick_rate: TICK_RATE,
            broadcast_rate: BROADCAST_RATE,
            snapshot_precision: 2,
            max_bullets_per_state: 256,
            max_kills_per_state: 20,
            collision_grid_cell_size: 8.0,
        }
    }
}

/// Kill log section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillLogConfig {
    /// Write kills to `path`.
    pub enabled: bool,
    /// JSON-lines file.
    pub path: PathBuf,
    /// Interval after which the file and the in-memory kill list are cleared.
    pub reset_secs: u64,
}

impl Default for KillLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("kills.log"),
            reset_secs: 60 * 60,
        }
    }
}

/// One value per bot archetype.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerArchetype<T> {
    /// Dumb bots.
    pub dumb: T,
    /// Simple bots.
    pub simple: T,
    /// Cover-seeking bots.
    pub seeking: T,
    /// Teleporting bots.
    pub teleporting: T,
    /// Danger bots.
    pub danger: T,
    /// Monsters.
    pub monsters: T,
}

impl<T> PerArchetype<T> {
    /// Value for one archetype.
    #[must_use]
    pub fn get(&self, archetype: BotArchetype) -> &T {
        match archetype {
            BotArchetype::Dumb => &self.dumb,
            BotArchetype::Simple => &self.simple,
            BotArchetype::Seeking => &self.seeking,
            BotArchetype::Teleporting => &self.teleporting,
            BotArchetype::Danger => &self.danger,
            BotArchetype::Monsters => &self.monsters,
        }
    }
}

/// A color given as a number or as `"#RRGGBB"` / `"0xRRGGBB"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigColor {
    /// Packed `0xRRGGBB`.
    Number(i64),
    /// Hex text.
    Text(String),
}

impl ConfigColor {
    /// Packed RGB, or `None` if the text is not a six-digit hex color.
    #[must_use]
    pub fn rgb(&self) -> Option<u32> {
        match self {
            Self::Number(value) => u32::try_from((*value).max(0)).ok().map(|v| v & 0x00FF_FFFF),
            Self::Text(text) => {
                let trimmed = text.trim();
                let digits = trimmed
                    .strip_prefix('#')
                    .or_else(|| trimmed.strip_prefix("0x"))
                    .unwrap_or(trimmed);
                if digits.len() != 6 {
                    return None;
                }
                u32::from_str_radix(digits, 16).ok()
            }
        }
    }
}

/// Bots section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotsConfig {
    /// Bots spawned per archetype at startup.
    pub counts: PerArchetype<u32>,
    /// Color overrides per archetype.
    pub colors: PerArchetype<Option<ConfigColor>>,
    /// Tactical overrides per archetype.
    pub settings: PerArchetype<BotTuning>,
}

impl Default for BotsConfig {
    fn default() -> Self {
        Self {
            counts: PerArchetype {
                dumb: 1,
                simple: 2,
                seeking: 1,
                teleporting: 1,
                danger: 1,
                monsters: 0,
            },
            colors: PerArchetype::default(),
            settings: PerArchetype::default(),
        }
    }
}

impl BotsConfig {
    /// Color for an archetype: the configured one if it parses, else the built-in one.
    #[must_use]
    pub fn color(&self, archetype: BotArchetype) -> u32 {
        self.colors
            .get(archetype)
            .as_ref()
            .and_then(ConfigColor::rgb)
            .unwrap_or_else(|| archetype.default_color())
    }
}

impl GameConfig {
    /// Loads `path` if given, otherwise the defaults. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> SimResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default().validated());
        };
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not valid TOML for this config.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.validated())
    }

    /// Returns a copy with every value forced into its documented range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.arena.half_size = self.arena.half_size.max(20.0);

        self.player.max_health = self.player.max_health.max(1.0);
        self.player.radius = clamp(self.player.radius, 0.3, 3.0);
        self.player.height = clamp(self.player.height, 1.0, 4.0);

        let combat = &mut self.combat;
        combat.bullet_speed = combat.bullet_speed.max(0.05);
        combat.bullet_damage = combat.bullet_damage.max(0.0);
        combat.shoot_cooldown_ms = combat.shoot_cooldown_ms.max(25);
        combat.bullet_max_age = combat.bullet_max_age.max(1);
        combat.bullet_hit_distance = combat.bullet_hit_distance.max(0.1);
        combat.muzzle_height = clamp(combat.muzzle_height, 0.0, self.player.height);

        self.respawn.auto_respawn_secs = self.respawn.auto_respawn_secs.max(0.0);

        let network = &mut self.network;
        network.tick_rate = network.tick_rate.clamp(1, 240);
        network.broadcast_rate = network.broadcast_rate.clamp(1, network.tick_rate);
        network.snapshot_precision = network.snapshot_precision.min(6);
        network.collision_grid_cell_size = network.collision_grid_cell_size.max(2.0);

        self.kill_log.reset_secs = self.kill_log.reset_secs.max(1);
        self.world = self.world.validated();
        if self.log_level.trim().is_empty() {
            self.log_level = "info".to_owned();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config, GameConfig::default().validated());
        assert_eq!(config.combat.shoot_cooldown_ms, 100);
        assert_eq!(config.network.broadcast_rate, 30);
        assert_eq!(config.bots.counts.simple, 2);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            log_level = "debug"

            [combat]
            bullet_damage = 40

            [bots.counts]
            monsters = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.combat.bullet_damage, 40.0);
        assert_eq!(config.combat.bullet_speed, 1.0);
        assert_eq!(config.bots.counts.monsters, 2);
        assert_eq!(config.bots.counts.simple, 0);
    }

    #[test]
    fn test_validation_clamps() {
        let mut config = GameConfig::default();
        config.combat.shoot_cooldown_ms = 1;
        config.network.tick_rate = 20;
        config.network.broadcast_rate = 90;
        config.network.collision_grid_cell_size = 0.5;
        config.arena.half_size = 3.0;
        let config = config.validated();
        assert_eq!(config.combat.shoot_cooldown_ms, 25);
        assert_eq!(config.network.broadcast_rate, 20);
        assert_eq!(config.network.collision_grid_cell_size, 2.0);
        assert_eq!(config.arena.half_size, 20.0);
    }

    #[test]
    fn test_respawn_delay() {
        let mut respawn = RespawnConfig::default();
        assert_eq!(respawn.delay_ms(), Some(3000));
        respawn.auto_respawn = false;
        assert_eq!(respawn.delay_ms(), None);
    }

    #[test]
    fn test_config_colors() {
        assert_eq!(ConfigColor::Text("#ff0000".into()).rgb(), Some(0xFF0000));
        assert_eq!(ConfigColor::Text("0x00FF00".into()).rgb(), Some(0x00FF00));
        assert_eq!(ConfigColor::Text("red".into()).rgb(), None);
        assert_eq!(ConfigColor::Number(255).rgb(), Some(255));

        let config = GameConfig::from_toml_str(
            r##"
            [bots.colors]
            dumb = "#123456"
            simple = "nope"
            "##,
        )
        .unwrap();
        assert_eq!(config.bots.color(BotArchetype::Dumb), 0x123456);
        assert_eq!(config.bots.color(BotArchetype::Simple), BotArchetype::Simple.default_color());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(
            GameConfig::from_toml_str("[arena\nhalf_size = 3"),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
