//! Input realism
//!
//! Randomized offsets, delays and interval jitter so synthetic input never
//! lands on perfectly periodic timestamps or pixel-exact positions.

pub mod humanize;

pub use humanize::Humanizer;
