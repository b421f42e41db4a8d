//! Playlist, shuffle queue and synchronized-lyrics engine for a music player.
//!
//! [`PlayerCore`](crate::core::PlayerCore) is the entry point: it owns the [`playlist::Playlist`],
//! derives the (possibly shuffled) queue through [`queue::Reconciler`] and keeps
//! the playback cursor and highlighted lyric line in step with the audio clock.

pub mod config;
pub mod core;
pub mod library;
pub mod lyrics;
pub mod model;
pub mod playlist;
pub mod queue;
