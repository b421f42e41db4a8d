use crate::lyrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a track. Assigned once by [`crate::playlist::Playlist`]
/// in strictly increasing order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Seconds from the start of the track.
    pub time: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AudioQuality {
    #[default]
    Unavailable,
    Low,
    Standard,
    High,
    Lossless,
}

impl AudioQuality {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unavailable => "Unavailable",
            Self::Low => "Low",
            Self::Standard => "Standard",
            Self::High => "High",
            Self::Lossless => "Lossless",
        }
    }
}

/// Everything about a track except its identity. Produced by the library
/// importer (or deserialized from a playlist file) and turned into a
/// [`Track`] when pushed onto a playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDraft {
    pub name: String,
    #[serde(default = "default_artist")]
    pub artist: String,
    #[serde(default = "default_album")]
    pub album: String,
    /// Playable resource: a file path, object URL or remote URL.
    pub url: String,
    #[serde(default)]
    pub lyrics: Vec<LyricLine>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub quality: AudioQuality,
}

pub(crate) fn default_artist() -> String {
    String::from("Unknown Artist")
}

pub(crate) fn default_album() -> String {
    String::from("Unknown Album")
}

impl TrackDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: default_artist(),
            album: default_album(),
            url: url.into(),
            lyrics: Vec::new(),
            cover_url: None,
            codec: String::new(),
            quality: AudioQuality::default(),
        }
    }

    pub fn with_lyrics(mut self, lines: Vec<LyricLine>) -> Self {
        self.lyrics = lyrics::normalize(lines);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub url: String,
    pub lyrics: Vec<LyricLine>,
    pub cover_url: Option<String>,
    pub codec: String,
    pub quality: AudioQuality,
}

impl Track {
    /// Lyrics are normalized here, so a track's lines are always sorted no
    /// matter where the draft came from.
    pub fn from_draft(id: TrackId, draft: TrackDraft) -> Self {
        Self {
            id,
            name: draft.name,
            artist: draft.artist,
            album: draft.album,
            url: draft.url,
            lyrics: lyrics::normalize(draft.lyrics),
            cover_url: draft.cover_url,
            codec: draft.codec,
            quality: draft.quality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    None,
    Track,
    Playlist,
}

impl LoopMode {
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Track,
            Self::Track => Self::Playlist,
            Self::Playlist => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Track => "track",
            Self::Playlist => "playlist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "track" => Some(Self::Track),
            "playlist" => Some(Self::Playlist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Which queue entry is playing, how far into it, and which lyric line is
/// highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackCursor {
    pub track_index: Option<usize>,
    pub time: f64,
    pub lyric_index: Option<usize>,
}

impl PlaybackCursor {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        self.track_index.is_none()
    }
}

/// User preferences kept in the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub loop_mode: LoopMode,
    pub shuffle: bool,
    pub muted: bool,
    /// 0..=100
    pub volume: u8,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            loop_mode: LoopMode::None,
            shuffle: false,
            muted: false,
            volume: 100,
            theme: Theme::Light,
        }
    }
}
