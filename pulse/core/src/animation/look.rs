//! Mood Looks
//!
//! Rendering parameters per mood. Values are relative multipliers; a
//! neutral earth sits below 1.0 on every axis, a critical one above.

use serde::Serialize;

use crate::models::Mood;

/// Visual parameters for rendering a mood
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MoodLook {
    /// Base colour (hex)
    pub base_color: &'static str,
    /// Glow strength around the globe
    pub halo_intensity: f32,
    /// Heartbeat speed
    pub pulse_speed: f32,
    /// Drift speed of ambient particles
    pub particle_speed: f32,
    /// Density of data arcs
    pub arc_density: f32,
}

impl MoodLook {
    /// Look for a mood
    #[must_use]
    pub const fn for_mood(mood: Mood) -> Self {
        match mood {
            Mood::Critical => Self {
                base_color: "#ff3b30",
                halo_intensity: 1.6,
                pulse_speed: 2.0,
                particle_speed: 1.6,
                arc_density: 0.9,
            },
            Mood::Stressed => Self {
                base_color: "#ffcc00",
                halo_intensity: 1.2,
                pulse_speed: 1.2,
                particle_speed: 1.2,
                arc_density: 0.6,
            },
            Mood::Neutral => Self {
                base_color: "#3da9fc",
                halo_intensity: 0.8,
                pulse_speed: 0.6,
                particle_speed: 0.8,
                arc_density: 0.4,
            },
            Mood::Healing => Self {
                base_color: "#34c759",
                halo_intensity: 1.4,
                pulse_speed: 1.5,
                particle_speed: 0.6,
                arc_density: 0.5,
            },
        }
    }
}

/// Human-readable mood name
#[must_use]
pub const fn label(mood: Mood) -> &'static str {
    match mood {
        Mood::Healing => "Healing",
        Mood::Stressed => "Stressed",
        Mood::Critical => "Critical",
        Mood::Neutral => "Neutral",
    }
}

/// Accent colour for badges and text (hex)
#[must_use]
pub const fn accent_color(mood: Mood) -> &'static str {
    match mood {
        Mood::Healing => "#10b981",
        Mood::Stressed => "#f59e0b",
        Mood::Critical => "#ef4444",
        Mood::Neutral => "#6366f1",
    }
}
