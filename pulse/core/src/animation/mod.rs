//! Mood Presentation
//!
//! Renderer-agnostic descriptions of how a mood looks: colours, intensity
//! multipliers and the ambient particle field. Nothing here draws; surfaces
//! map these values onto their own primitives.

mod look;
mod particles;

pub use look::{accent_color, label, MoodLook};
pub use particles::{particles, ParticleDescriptor, ParticleProfile};
