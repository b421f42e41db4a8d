use crate::lyrics;
use crate::model::{LoopMode, LyricLine, PlaybackCursor, Settings, Track, TrackDraft, TrackId};
use crate::playlist::Playlist;
use crate::queue::{Reconciler, Reconciliation};
use std::collections::HashMap;

/// Ticket for an in-flight lyrics load. Only the newest ticket per track is
/// accepted by [`PlayerCore::apply_lyrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricsRequest {
    pub track_id: TrackId,
    generation: u64,
}

#[derive(Debug)]
pub struct PlayerCore {
    playlist: Playlist,
    reconciler: Reconciler,
    cursor: PlaybackCursor,
    shuffle: bool,
    pub loop_mode: LoopMode,
    lyrics_generations: HashMap<TrackId, u64>,
    pub status: String,
}

impl Default for PlayerCore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerCore {
    pub fn new() -> Self {
        Self::with_reconciler(Reconciler::new())
    }

    pub fn with_reconciler(reconciler: Reconciler) -> Self {
        Self {
            playlist: Playlist::new(),
            reconciler,
            cursor: PlaybackCursor::default(),
            shuffle: false,
            loop_mode: LoopMode::None,
            lyrics_generations: HashMap::new(),
            status: String::from("Ready"),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut core = Self::new();
        core.shuffle = settings.shuffle;
        core.loop_mode = settings.loop_mode;
        core
    }

    /// Copies the playback preferences owned by the core into `settings`.
    pub fn settings_snapshot(&self, settings: &Settings) -> Settings {
        Settings {
            shuffle: self.shuffle,
            loop_mode: self.loop_mode,
            ..*settings
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn queue(&self) -> &[TrackId] {
        self.reconciler.queue()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn current_id(&self) -> Option<TrackId> {
        self.reconciler.current_id(&self.cursor)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_id().and_then(|id| self.playlist.get(id))
    }

    pub fn current_lyric(&self) -> Option<&LyricLine> {
        let idx = self.cursor.lyric_index?;
        self.current_track()?.lyrics.get(idx)
    }

    pub fn add_track(&mut self, draft: TrackDraft) -> TrackId {
        let id = self.playlist.push(draft);
        self.reconcile();
        self.set_status("Track added");
        id
    }

    pub fn add_tracks(&mut self, drafts: impl IntoIterator<Item = TrackDraft>) -> Vec<TrackId> {
        let ids = self.playlist.extend(drafts);
        self.reconcile();
        self.set_status(&format!("Added {} tracks", ids.len()));
        ids
    }

    pub fn remove_track(&mut self, id: TrackId) -> Option<Track> {
        let removed = self.playlist.remove(id)?;
        self.lyrics_generations.remove(&id);
        self.reconcile();
        self.set_status("Track removed");
        Some(removed)
    }

    pub fn clear_playlist(&mut self) {
        self.playlist.clear();
        self.lyrics_generations.clear();
        self.reconcile();
        self.set_status("Playlist cleared");
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
        self.reconcile();
        self.set_status(if enabled { "Shuffle on" } else { "Shuffle off" });
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.shuffle);
    }

    pub fn cycle_loop_mode(&mut self) {
        self.loop_mode = self.loop_mode.next();
        self.set_status(&format!("Loop: {}", self.loop_mode.as_str()));
    }

    /// Starts the queue entry at `index` from the beginning. An index outside
    /// the queue stops playback.
    pub fn play(&mut self, index: usize) -> Option<TrackId> {
        let Some(id) = self.reconciler.queue().get(index).copied() else {
            self.stop();
            return None;
        };
        self.cursor = PlaybackCursor {
            track_index: Some(index),
            time: 0.0,
            lyric_index: None,
        };
        self.refresh_lyric_index();
        Some(id)
    }

    pub fn play_id(&mut self, id: TrackId) -> Option<TrackId> {
        let index = self.reconciler.queue().iter().position(|queued| *queued == id)?;
        self.play(index)
    }

    pub fn stop(&mut self) {
        self.cursor.reset();
        self.set_status("Stopped");
    }

    pub fn next(&mut self) -> Option<TrackId> {
        let len = self.reconciler.queue().len();
        let candidate = match self.cursor.track_index {
            Some(current) if current + 1 < len => Some(current + 1),
            None if len > 0 => Some(0),
            _ if self.loop_mode == LoopMode::Playlist && len > 0 => Some(0),
            _ => None,
        };

        match candidate {
            Some(index) => self.play(index),
            None => {
                self.stop();
                None
            }
        }
    }

    pub fn previous(&mut self) -> Option<TrackId> {
        let len = self.reconciler.queue().len();
        let index = match self.cursor.track_index {
            Some(0) if self.loop_mode == LoopMode::Playlist => len.checked_sub(1)?,
            Some(current) => current.saturating_sub(1),
            None => 0,
        };
        self.play(index)
    }

    /// Called when the audio element finishes the current track.
    pub fn track_ended(&mut self) -> Option<TrackId> {
        match (self.loop_mode, self.cursor.track_index) {
            (LoopMode::Track, Some(current)) => self.play(current),
            _ => self.next(),
        }
    }

    /// Records the playback position. Returns `true` when the highlighted
    /// lyric line changed, which is the only time hosts need to re-scroll.
    pub fn update_time(&mut self, seconds: f64) -> bool {
        if self.cursor.is_idle() {
            return false;
        }
        self.cursor.time = seconds;
        self.refresh_lyric_index()
    }

    /// Moves playback to the start of lyric line `index` of the current track
    /// and returns the time the audio should seek to.
    pub fn seek_to_lyric(&mut self, index: usize) -> Option<f64> {
        let time = self.current_track()?.lyrics.get(index)?.time;
        self.update_time(time);
        Some(time)
    }

    pub fn request_lyrics(&mut self, track_id: TrackId) -> Option<LyricsRequest> {
        self.playlist.get(track_id)?;
        let generation = self.lyrics_generations.entry(track_id).or_default();
        *generation += 1;
        Some(LyricsRequest {
            track_id,
            generation: *generation,
        })
    }

    /// Installs the result of a lyrics load. Results from superseded requests
    /// or for tracks that were removed meanwhile are dropped. The lines are
    /// normalized before they are stored.
    pub fn apply_lyrics(&mut self, request: LyricsRequest, lines: Vec<LyricLine>) -> bool {
        let latest = self.lyrics_generations.get(&request.track_id).copied();
        if latest != Some(request.generation) {
            tracing::debug!(track = %request.track_id, "discarding stale lyrics result");
            return false;
        }
        let Some(track) = self.playlist.get_mut(request.track_id) else {
            return false;
        };
        track.lyrics = lyrics::normalize(lines);

        if self.current_id() == Some(request.track_id) {
            self.refresh_lyric_index();
        }
        true
    }

    fn reconcile(&mut self) {
        let outcome = self
            .reconciler
            .reconcile(&self.playlist, self.shuffle, &mut self.cursor);
        if outcome == Reconciliation::CursorReset {
            self.set_status("Stopped");
        }
    }

    fn refresh_lyric_index(&mut self) -> bool {
        let index = self
            .current_track()
            .and_then(|track| lyrics::locate(&track.lyrics, self.cursor.time));
        let changed = index != self.cursor.lyric_index;
        self.cursor.lyric_index = index;
        changed
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn lyric(time: f64, text: &str) -> LyricLine {
        LyricLine {
            time,
            text: text.to_string(),
        }
    }

    fn core_with(names: &[&str]) -> (PlayerCore, Vec<TrackId>) {
        let mut core = PlayerCore::with_reconciler(Reconciler::with_rng(SmallRng::seed_from_u64(11)));
        let ids = core.add_tracks(
            names
                .iter()
                .map(|name| TrackDraft::new(*name, format!("{name}.mp3"))),
        );
        (core, ids)
    }

    #[test]
    fn next_stops_at_end_without_loop() {
        let (mut core, ids) = core_with(&["a", "b"]);
        assert_eq!(core.play(1), Some(ids[1]));
        assert_eq!(core.next(), None);
        assert!(core.cursor().is_idle());
    }

    #[test]
    fn playlist_loop_wraps() {
        let (mut core, ids) = core_with(&["a", "b"]);
        core.loop_mode = LoopMode::Playlist;
        core.play(1);
        assert_eq!(core.next(), Some(ids[0]));
        assert_eq!(core.previous(), Some(ids[1]));
    }

    #[test]
    fn track_loop_replays_current() {
        let (mut core, ids) = core_with(&["a", "b"]);
        core.loop_mode = LoopMode::Track;
        core.play(0);
        core.update_time(90.0);
        assert_eq!(core.track_ended(), Some(ids[0]));
        assert_eq!(core.cursor().time, 0.0);
    }

    #[test]
    fn next_from_idle_starts_at_the_top() {
        let (mut core, ids) = core_with(&["a", "b"]);
        assert_eq!(core.next(), Some(ids[0]));
    }

    #[test]
    fn play_out_of_range_stops() {
        let (mut core, _) = core_with(&["a"]);
        core.play(0);
        assert_eq!(core.play(5), None);
        assert!(core.cursor().is_idle());
    }

    #[test]
    fn update_time_reports_only_lyric_changes() {
        let mut core = PlayerCore::new();
        core.add_track(TrackDraft::new("a", "a.mp3").with_lyrics(vec![
            lyric(1.0, "one"),
            lyric(3.0, "two"),
        ]));
        core.play(0);

        assert!(!core.update_time(0.5));
        assert!(core.update_time(1.0));
        assert!(!core.update_time(2.9));
        assert!(core.update_time(3.0));
        assert_eq!(core.current_lyric().map(|line| line.text.as_str()), Some("two"));
    }

    #[test]
    fn update_time_is_ignored_when_idle() {
        let mut core = PlayerCore::new();
        assert!(!core.update_time(10.0));
        assert_eq!(core.cursor().time, 0.0);
    }

    #[test]
    fn seek_to_lyric_moves_cursor() {
        let mut core = PlayerCore::new();
        core.add_track(TrackDraft::new("a", "a.mp3").with_lyrics(vec![
            lyric(1.0, "one"),
            lyric(3.5, "two"),
        ]));
        core.play(0);

        assert_eq!(core.seek_to_lyric(1), Some(3.5));
        assert_eq!(core.cursor().lyric_index, Some(1));
        assert_eq!(core.seek_to_lyric(7), None);
    }

    #[test]
    fn stale_lyrics_results_are_discarded() {
        let (mut core, ids) = core_with(&["a"]);
        core.play(0);
        core.update_time(2.0);

        let first = core.request_lyrics(ids[0]).expect("first");
        let second = core.request_lyrics(ids[0]).expect("second");

        assert!(core.apply_lyrics(second, vec![lyric(1.0, "new")]));
        assert!(!core.apply_lyrics(first, vec![lyric(1.0, "old")]));
        assert_eq!(core.current_lyric().map(|line| line.text.as_str()), Some("new"));
    }

    #[test]
    fn unsorted_lyrics_results_are_sorted_before_use() {
        let (mut core, ids) = core_with(&["a"]);
        core.play(0);
        let request = core.request_lyrics(ids[0]).expect("request");

        assert!(core.apply_lyrics(
            request,
            vec![lyric(5.0, "late"), lyric(-1.0, "bad"), lyric(1.0, "early")]
        ));
        core.update_time(6.0);
        assert_eq!(core.current_lyric().map(|line| line.text.as_str()), Some("late"));
        core.update_time(2.0);
        assert_eq!(core.current_lyric().map(|line| line.text.as_str()), Some("early"));
        assert_eq!(core.current_track().map(|track| track.lyrics.len()), Some(2));
    }

    #[test]
    fn lyrics_for_removed_tracks_are_dropped() {
        let (mut core, ids) = core_with(&["a", "b"]);
        let request = core.request_lyrics(ids[1]).expect("request");
        core.remove_track(ids[1]);
        assert!(!core.apply_lyrics(request, vec![lyric(0.0, "x")]));
        assert!(core.request_lyrics(ids[1]).is_none());
    }

    #[test]
    fn settings_round_trip_through_core() {
        let settings = Settings {
            shuffle: true,
            loop_mode: LoopMode::Track,
            volume: 40,
            ..Settings::default()
        };
        let mut core = PlayerCore::from_settings(&settings);
        assert!(core.is_shuffled());
        core.toggle_shuffle();
        core.cycle_loop_mode();

        let saved = core.settings_snapshot(&settings);
        assert!(!saved.shuffle);
        assert_eq!(saved.loop_mode, LoopMode::Playlist);
        assert_eq!(saved.volume, 40);
    }

    #[test]
    fn removing_before_current_shifts_index() {
        let (mut core, ids) = core_with(&["a", "b", "c"]);
        core.play(2);
        core.remove_track(ids[0]);
        assert_eq!(core.cursor().track_index, Some(1));
        assert_eq!(core.current_id(), Some(ids[2]));
    }

    proptest::proptest! {
        #[test]
        fn cursor_stays_in_bounds_after_random_ops(ops in proptest::collection::vec(0u8..9, 1..200)) {
            let (mut core, _) = core_with(&["a", "b", "c", "d"]);

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    0 => {
                        core.add_track(TrackDraft::new(format!("n{step}"), "n.mp3"));
                    }
                    1 => {
                        if let Some(id) = core.current_id() {
                            core.remove_track(id);
                        }
                    }
                    2 => core.toggle_shuffle(),
                    3 => core.cycle_loop_mode(),
                    4 => {
                        core.next();
                    }
                    5 => {
                        core.previous();
                    }
                    6 => {
                        core.track_ended();
                    }
                    7 => {
                        core.update_time(step as f64);
                    }
                    _ => {
                        core.play(step % 6);
                    }
                }

                if let Some(idx) = core.cursor().track_index {
                    proptest::prop_assert!(idx < core.queue().len());
                    proptest::prop_assert!(core.current_track().is_some());
                } else {
                    proptest::prop_assert!(core.cursor().lyric_index.is_none());
                }
                proptest::prop_assert_eq!(core.queue().len(), core.playlist.len());
            }
        }
    }
}
