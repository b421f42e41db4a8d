use crate::model::LyricLine;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Sidecar lyric file for a track: same stem, `.lrc` extension.
pub fn sidecar_lrc_path(track_path: &Path) -> PathBuf {
    track_path.with_extension("lrc")
}

pub fn read_lrc(path: &Path) -> Result<Vec<LyricLine>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read lyrics file {}", path.display()))?;
    Ok(parse_lrc(&raw))
}

/// Reads and parses a lyric file. Any read failure means "no lyrics".
pub fn load_or_empty(path: &Path) -> Vec<LyricLine> {
    match read_lrc(path) {
        Ok(lines) => lines,
        Err(err) => {
            tracing::warn!("lyrics unavailable: {err:#}");
            Vec::new()
        }
    }
}

/// Parses LRC text into lines sorted ascending by time.
///
/// A text line with a single `[mm:ss.fff]` tag yields exactly one entry (the
/// fraction separator may also be `:`). As an extension of the plain
/// `[mm:ss.ff]text` grammar, stacked tags such as `[00:10.00][00:30.00]chorus`
/// yield one entry per tag, all with the same text. Lines without a tag,
/// metadata tags such as `[ar:Artist]`, and tags followed only by whitespace
/// are skipped. Ties keep their source order.
pub fn parse_lrc(input: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for raw_line in input.lines() {
        let Some(start) = first_timestamp(raw_line) else {
            continue;
        };

        let (times, text) = leading_timestamps(&raw_line[start..]);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        for time in times {
            lines.push(LyricLine {
                time,
                text: text.to_string(),
            });
        }
    }

    normalize(lines)
}

/// Puts lyric lines from any source into the shape [`locate`] expects:
/// lines with a negative or non-finite time are dropped and the rest are
/// stably sorted by time.
pub fn normalize(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
    let before = lines.len();
    lines.retain(|line| line.time.is_finite() && line.time >= 0.0);
    if lines.len() != before {
        tracing::debug!(dropped = before - lines.len(), "dropping lyric lines with invalid times");
    }
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

/// Index of the line active at `time`: the last `i` with
/// `lines[i].time <= time`. `None` before the first line or for no lines.
///
/// `lines` must be sorted by time, as [`parse_lrc`] produces them.
pub fn locate(lines: &[LyricLine], time: f64) -> Option<usize> {
    let after = lines.partition_point(|line| line.time <= time);
    after.checked_sub(1)
}

fn first_timestamp(line: &str) -> Option<usize> {
    line.match_indices('[')
        .map(|(idx, _)| idx)
        .find(|idx| parse_timestamp_tag(&line[*idx..]).is_some())
}

fn leading_timestamps(input: &str) -> (Vec<f64>, &str) {
    let mut remaining = input;
    let mut out = Vec::new();

    while let Some((seconds, consumed)) = parse_timestamp_tag(remaining) {
        out.push(seconds);
        remaining = &remaining[consumed..];
    }

    (out, remaining)
}

/// Parses `[MM:SS.f]`, `[MM:SS.ff]` or `[MM:SS.fff]` (`.` or `:` before the
/// fraction) at the start of `input`. Returns seconds and the tag length.
///
/// The fraction is read left-aligned: `5` is 500 ms and `12` is 120 ms.
fn parse_timestamp_tag(input: &str) -> Option<(f64, usize)> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }

    let minutes = two_digits(bytes.get(1..3)?)?;
    if bytes.get(3) != Some(&b':') {
        return None;
    }
    let seconds = two_digits(bytes.get(4..6)?)?;
    if !matches!(bytes.get(6), Some(b'.' | b':')) {
        return None;
    }

    let fraction_len = bytes[7..]
        .iter()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    if !(1..=3).contains(&fraction_len) {
        return None;
    }
    let close = 7 + fraction_len;
    if bytes.get(close) != Some(&b']') {
        return None;
    }

    let millis = bytes[7..close]
        .iter()
        .chain(std::iter::repeat(&b'0'))
        .take(3)
        .fold(0_u32, |acc, digit| acc * 10 + u32::from(digit - b'0'));

    let time = f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(millis) / 1000.0;
    Some((time, close + 1))
}

fn two_digits(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [tens, ones] if tens.is_ascii_digit() && ones.is_ascii_digit() => {
            Some(u32::from(tens - b'0') * 10 + u32::from(ones - b'0'))
        }
        _ => None,
    }
}
