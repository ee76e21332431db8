//! Display names for actors that join without one.

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: [&str; 32] = [
    "Swift", "Fierce", "Rapid", "Silent", "Shadow", "Flash", "Cyber", "Nova", "Phantom", "Vortex", "Storm", "Void",
    "Apex", "Chrome", "Icon", "Echo", "Bolt", "Titan", "Nexus", "Blaze", "Steel", "Quantum", "Sonic", "Helix",
    "Rogue", "Prism", "Pulse", "Volt", "Neon", "Surge", "Scarlet", "Inferno",
];

const NOUNS: [&str; 29] = [
    "Falcon", "Dragon", "Phoenix", "Viper", "Hawk", "Raven", "Angel", "Demon", "Specter", "Panther", "Tiger", "Wolf",
    "Bear", "Eagle", "Cobra", "Reaper", "Hunter", "Ninja", "Cipher", "Pathfinder", "Scout", "Ranger", "Striker",
    "Wraith", "Ghost", "Blade", "Fang", "Talon", "Assassin",
];

/// Retries before a duplicate name is accepted.
const MAX_RETRIES: usize = 100;

/// `<Adjective><Noun><1..=999>`.
pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Swift");
    let noun = NOUNS.choose(rng).copied().unwrap_or("Falcon");
    let number: u32 = rng.gen_range(1..=999);
    format!("{adjective}{noun}{number}")
}

/// A random name not rejected by `taken`, giving up after a bounded number
/// of retries and returning the last candidate.
pub fn unique_name<R: Rng + ?Sized>(rng: &mut R, taken: impl Fn(&str) -> bool) -> String {
    let mut name = random_name(rng);
    for _ in 0..MAX_RETRIES {
        if !taken(&name) {
            break;
        }
        name = random_name(rng);
    }
    name
}
