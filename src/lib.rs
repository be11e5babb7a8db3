//! Binds administrative boundaries and a city table to a projected,
//! zoomable scene with hover and click overlays.

pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod interaction;
pub mod map;
