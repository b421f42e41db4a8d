use crate::model::{PlaybackCursor, TrackId};
use crate::playlist::Playlist;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Unbiased in-place Fisher–Yates shuffle.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    shuffle: bool,
    ids: Vec<TrackId>,
}

impl Fingerprint {
    fn of(playlist: &Playlist, shuffle: bool) -> Self {
        Self {
            shuffle,
            ids: playlist.ids().collect(),
        }
    }

    fn matches(&self, playlist: &Playlist, shuffle: bool) -> bool {
        self.shuffle == shuffle && self.ids.iter().copied().eq(playlist.ids())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Neither the playlist nor the shuffle flag changed since last time.
    Unchanged,
    /// The queue was rebuilt; the playing track, if any, was relocated.
    Rebuilt,
    /// The playing track is gone (or the playlist is empty); cursor reset.
    CursorReset,
}

/// Derives the playback queue from a playlist and keeps the cursor on the
/// same track across rebuilds.
#[derive(Debug)]
pub struct Reconciler {
    queue: Vec<TrackId>,
    fingerprint: Option<Fingerprint>,
    rng: SmallRng,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    pub fn with_rng(rng: SmallRng) -> Self {
        Self {
            queue: Vec::new(),
            fingerprint: None,
            rng,
        }
    }

    pub fn queue(&self) -> &[TrackId] {
        &self.queue
    }

    /// Id of the queue entry the cursor points at.
    pub fn current_id(&self, cursor: &PlaybackCursor) -> Option<TrackId> {
        cursor
            .track_index
            .and_then(|idx| self.queue.get(idx))
            .copied()
    }

    pub fn is_stale(&self, playlist: &Playlist, shuffle: bool) -> bool {
        !self
            .fingerprint
            .as_ref()
            .is_some_and(|fingerprint| fingerprint.matches(playlist, shuffle))
    }

    /// Rebuilds the queue if `(shuffle, playlist ids)` changed since the last
    /// call, then points `cursor` at the previously playing track's new
    /// position. The cursor is reset when that track no longer exists.
    pub fn reconcile(
        &mut self,
        playlist: &Playlist,
        shuffle: bool,
        cursor: &mut PlaybackCursor,
    ) -> Reconciliation {
        if !self.is_stale(playlist, shuffle) {
            return Reconciliation::Unchanged;
        }

        let current = self.current_id(cursor);
        self.fingerprint = Some(Fingerprint::of(playlist, shuffle));

        if playlist.is_empty() {
            self.queue.clear();
            cursor.reset();
            tracing::debug!("playlist empty, queue cleared");
            return Reconciliation::CursorReset;
        }

        let relocated = if shuffle {
            self.queue = playlist.ids().collect();
            fisher_yates(&mut self.queue, &mut self.rng);
            current.and_then(|id| self.queue.iter().position(|queued| *queued == id))
        } else {
            self.queue = playlist.ids().collect();
            current.and_then(|id| playlist.position_of(id))
        };

        match (current, relocated) {
            (Some(id), None) => {
                tracing::debug!(track = %id, "playing track left the playlist, cursor reset");
                cursor.reset();
                Reconciliation::CursorReset
            }
            (_, position) => {
                cursor.track_index = position;
                Reconciliation::Rebuilt
            }
        }
    }
}
