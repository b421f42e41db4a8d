use crate::lyrics;
use crate::model::{AudioQuality, TrackDraft, default_album, default_artist};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{Picture, PictureType};
use lofty::prelude::Accessor;
use lofty::probe::Probe;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

/// What the embedded tags of an audio file tell us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    pub quality: AudioQuality,
}

/// Builds a playlist entry for an audio file, pairing it with a sidecar
/// `.lrc` when one exists next to it.
pub fn track_from_path(path: &Path) -> TrackDraft {
    let metadata = read_metadata(path);
    let name = metadata.title.unwrap_or_else(|| file_stem(path));

    let sidecar = lyrics::sidecar_lrc_path(path);
    let lyrics = if sidecar.is_file() {
        lyrics::load_or_empty(&sidecar)
    } else {
        Vec::new()
    };

    TrackDraft {
        name,
        artist: metadata.artist.unwrap_or_else(default_artist),
        album: metadata.album.unwrap_or_else(default_album),
        url: path.to_string_lossy().to_string(),
        lyrics,
        cover_url: metadata.cover_url,
        codec: codec_label_for_path(path),
        quality: metadata.quality,
    }
}

pub fn scan_folder(root: &Path) -> Vec<TrackDraft> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_audio(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();
    paths.iter().map(|path| track_from_path(path)).collect()
}

pub fn read_playlist_json(path: &Path) -> Result<Vec<TrackDraft>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read playlist file {}", path.display()))?;
    let drafts = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse playlist file {}", path.display()))?;
    Ok(drafts)
}

/// Like [`read_playlist_json`] but an unreadable playlist is just empty.
pub fn load_playlist_json(path: &Path) -> Vec<TrackDraft> {
    read_playlist_json(path).unwrap_or_else(|err| {
        tracing::warn!("playlist unavailable: {err:#}");
        Vec::new()
    })
}

pub fn read_metadata(path: &Path) -> TrackMetadata {
    let tagged_file = match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!("no metadata for {}: {err}", path.display());
            return TrackMetadata::default();
        }
    };

    let bitrate_kbps = tagged_file.properties().audio_bitrate();
    let quality = classify_audio_quality(bitrate_kbps, is_lossless_path(path));

    let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
    else {
        return TrackMetadata {
            quality,
            ..TrackMetadata::default()
        };
    };

    TrackMetadata {
        title: tag.title().as_deref().and_then(clean_metadata_value),
        artist: tag.artist().as_deref().and_then(clean_metadata_value),
        album: tag.album().as_deref().and_then(clean_metadata_value),
        cover_url: front_cover(tag.pictures()).map(cover_data_url),
        quality,
    }
}

fn front_cover(pictures: &[Picture]) -> Option<&Picture> {
    pictures
        .iter()
        .find(|picture| picture.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
}

fn cover_data_url(picture: &Picture) -> String {
    let mime = picture
        .mime_type()
        .map(|mime| mime.as_str().to_string())
        .unwrap_or_else(|| String::from("image/jpeg"));
    format!("data:{mime};base64,{}", STANDARD.encode(picture.data()))
}

fn clean_metadata_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("unknown")
        .to_string()
}

fn codec_label_for_path(path: &Path) -> String {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.to_ascii_uppercase())
        .unwrap_or_else(|| String::from("Unknown"))
}

fn is_lossless_path(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "wav" | "flac" | "aiff" | "aif" | "alac"
            )
        })
        .unwrap_or(false)
}

fn classify_audio_quality(bitrate_kbps: Option<u32>, lossless: bool) -> AudioQuality {
    if lossless {
        return AudioQuality::Lossless;
    }
    match bitrate_kbps {
        None => AudioQuality::Unavailable,
        Some(bitrate) if bitrate < 128 => AudioQuality::Low,
        Some(bitrate) if bitrate < 256 => AudioQuality::Standard,
        Some(_) => AudioQuality::High,
    }
}

pub fn is_audio(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_filters_non_audio_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("b.mp3"), b"x").expect("write mp3");
        fs::write(dir.path().join("a.FLAC"), b"x").expect("write flac");
        fs::write(dir.path().join("notes.txt"), b"x").expect("write txt");

        let drafts = scan_folder(dir.path());
        let names: Vec<&str> = drafts.iter().map(|draft| draft.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(drafts[0].codec, "FLAC");
        assert_eq!(drafts[0].quality, AudioQuality::Unavailable);
        assert_eq!(drafts[1].artist, "Unknown Artist");
        assert_eq!(drafts[1].album, "Unknown Album");
        assert_eq!(drafts[1].cover_url, None);
    }

    #[test]
    fn sidecar_lyrics_are_attached() {
        let dir = tempdir().expect("tempdir");
        let track = dir.path().join("song.mp3");
        fs::write(&track, b"x").expect("write mp3");
        fs::write(dir.path().join("song.lrc"), "[00:02.00]b\n[00:01.00]a\n").expect("write lrc");

        let draft = track_from_path(&track);
        assert_eq!(draft.name, "song");
        assert_eq!(draft.lyrics.len(), 2);
        assert_eq!(draft.lyrics[0].text, "a");
    }

    #[test]
    fn unreadable_playlist_is_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("playlist.json");
        assert!(load_playlist_json(&path).is_empty());

        fs::write(&path, "[{").expect("write");
        assert!(load_playlist_json(&path).is_empty());
        let err = read_playlist_json(&path).expect_err("error");
        assert!(
            err.to_string().contains("failed to parse playlist file"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn playlist_json_is_read() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("playlist.json");
        fs::write(
            &path,
            r#"[{"name":"One","url":"one.mp3","lyrics":[{"time":1.5,"text":"hi"}]},{"name":"Two","url":"two.ogg","artist":"Band"}]"#,
        )
        .expect("write");

        let drafts = load_playlist_json(&path);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].lyrics[0].time, 1.5);
        assert_eq!(drafts[1].artist, "Band");
    }

    #[test]
    fn metadata_value_cleaning_trims_and_drops_empty() {
        assert_eq!(
            clean_metadata_value("  hello  "),
            Some(String::from("hello"))
        );
        assert_eq!(clean_metadata_value("   \t  "), None);
    }

    #[test]
    fn quality_thresholds() {
        assert_eq!(classify_audio_quality(None, false), AudioQuality::Unavailable);
        assert_eq!(classify_audio_quality(Some(96), false), AudioQuality::Low);
        assert_eq!(classify_audio_quality(Some(192), false), AudioQuality::Standard);
        assert_eq!(classify_audio_quality(Some(320), false), AudioQuality::High);
        assert_eq!(classify_audio_quality(None, true), AudioQuality::Lossless);
    }

    #[test]
    fn unreadable_audio_has_no_metadata() {
        let dir = tempdir().expect("tempdir");
        let track = dir.path().join("broken.flac");
        fs::write(&track, b"not audio").expect("write");
        assert_eq!(read_metadata(&track), TrackMetadata::default());
    }
}
