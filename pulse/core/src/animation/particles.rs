//! Ambient Particles
//!
//! The dashboard background spawns particles on a fixed cadence that depends
//! on the mood and retires each one after a fixed lifetime. Here that is a
//! pure function of `(mood, elapsed, seed)`: every spawn index gets its own
//! seeded RNG, so a particle keeps its attributes across calls and the whole
//! set is reproducible in tests.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::models::Mood;

/// Spawn and styling rules for one mood
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleProfile {
    /// Time between spawns
    pub spawn_every: Duration,
    /// Time a particle stays on screen
    pub lifetime: Duration,
    /// Upper bound of the random animation delay
    pub max_delay: Duration,
    /// Shortest animation duration
    pub min_duration: Duration,
    /// Added on top of `min_duration`, scaled by a random factor
    pub duration_spread: Duration,
    /// Colours to pick from uniformly
    pub colors: &'static [&'static str],
    /// Particle diameter in pixels
    pub size_px: u32,
}

impl ParticleProfile {
    /// Profile for a mood
    #[must_use]
    pub const fn for_mood(mood: Mood) -> Self {
        match mood {
            Mood::Critical => Self {
                spawn_every: Duration::from_millis(100),
                lifetime: Duration::from_millis(5_000),
                max_delay: Duration::from_secs(2),
                min_duration: Duration::from_secs(2),
                duration_spread: Duration::from_secs(3),
                colors: &["rgba(239, 68, 68, 0.8)", "rgba(245, 101, 101, 0.8)"],
                size_px: 3,
            },
            Mood::Stressed => Self {
                spawn_every: Duration::from_millis(400),
                lifetime: Duration::from_millis(20_000),
                max_delay: Duration::from_secs(5),
                min_duration: Duration::from_secs(12),
                duration_spread: Duration::from_secs(8),
                colors: &["rgba(245, 158, 11, 0.4)"],
                size_px: 5,
            },
            Mood::Neutral | Mood::Healing => Self {
                spawn_every: Duration::from_millis(300),
                lifetime: Duration::from_millis(25_000),
                max_delay: Duration::from_secs(20),
                min_duration: Duration::from_secs(15),
                duration_spread: Duration::from_secs(10),
                colors: &["rgba(99, 102, 241, 0.3)"],
                size_px: 4,
            },
        }
    }
}

/// One particle, ready to hand to a renderer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParticleDescriptor {
    /// Spawn index, stable for the particle's lifetime
    pub id: u64,
    /// Offset from the start of the animation at which it spawned
    pub spawned_at: Duration,
    /// Horizontal position, percent of the container width
    pub left_percent: f64,
    /// Delay before its animation starts
    pub delay: Duration,
    /// Animation length
    pub duration: Duration,
    /// CSS colour
    pub color: &'static str,
    /// Diameter in pixels
    pub size_px: u32,
}

/// Particles alive `elapsed` after the animation started
///
/// The first particle spawns one interval in. A particle is alive while
/// `spawned_at <= elapsed < spawned_at + lifetime`.
#[must_use]
pub fn particles(mood: Mood, elapsed: Duration, seed: u64) -> Vec<ParticleDescriptor> {
    let profile = ParticleProfile::for_mood(mood);
    let every = millis(profile.spawn_every);
    let lifetime = millis(profile.lifetime);
    let elapsed = millis(elapsed);

    let newest = elapsed / every;
    let oldest = elapsed.saturating_sub(lifetime) / every + 1;

    (oldest..=newest)
        .filter(|&index| index * every + lifetime > elapsed)
        .map(|index| spawn(&profile, index, seed))
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

fn spawn(profile: &ParticleProfile, index: u64, seed: u64) -> ParticleDescriptor {
    // Mix the index in so neighbouring particles get unrelated streams
    let mut rng = StdRng::seed_from_u64(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15));

    let left_percent = rng.gen::<f64>() * 100.0;
    let delay = profile.max_delay.mul_f64(rng.gen::<f64>());
    let duration = profile.min_duration + profile.duration_spread.mul_f64(rng.gen::<f64>());
    let color = profile.colors[rng.gen_range(0..profile.colors.len())];

    let spawned_at = Duration::from_millis(index * millis(profile.spawn_every));

    ParticleDescriptor {
        id: index,
        spawned_at,
        left_percent,
        delay,
        duration,
        color,
        size_px: profile.size_px,
    }
}
