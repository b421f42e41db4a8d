use crate::model::{Track, TrackDraft, TrackId};

/// User-curated tracks in insertion order.
///
/// Tracks are only ever appended with a freshly allocated, strictly larger
/// id, and removal preserves relative order, so the vector stays sorted by
/// id. Id lookups rely on that and binary-search the vector directly.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
    next_id: u64,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn push(&mut self, draft: TrackDraft) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        self.tracks.push(Track::from_draft(id, draft));
        id
    }

    pub fn extend(&mut self, drafts: impl IntoIterator<Item = TrackDraft>) -> Vec<TrackId> {
        drafts.into_iter().map(|draft| self.push(draft)).collect()
    }

    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        let idx = self.position_of(id)?;
        Some(self.tracks.remove(idx))
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Position of `id` in O(log n).
    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.binary_search_by_key(&id, |track| track.id).ok()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.position_of(id).map(|idx| &self.tracks[idx])
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        let idx = self.position_of(id)?;
        self.tracks.get_mut(idx)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.iter().map(|track| track.id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
