use super::{
    Participant,
    ParticipantId,
    ParticipantView,
};
use crate::media::{
    StageStream,
    StreamKind,
};
use derive_more::Deref;
use std::collections::{
    HashMap,
    HashSet,
};

/// Streams currently live for one participant, in the order they arrived.
/// Holds at most one stream per stream id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct StreamSet(Vec<StageStream>);

impl StreamSet {
    /// Adds the streams whose id is not present yet. Returns how many were added.
    pub fn merge(&mut self, streams: impl IntoIterator<Item = StageStream>) -> usize {
        let before = self.0.len();
        for stream in streams {
            if !self.0.iter().any(|existing| existing.id == stream.id) {
                self.0.push(stream);
            }
        }
        self.0.len() - before
    }

    /// Drops every stream with an id found in `streams`. Returns how many were removed.
    pub fn remove(&mut self, streams: &[StageStream]) -> usize {
        let ids = streams.iter().map(|stream| &stream.id).collect::<HashSet<_>>();
        let before = self.0.len();
        self.0.retain(|stream| !ids.contains(&stream.id));
        before - self.0.len()
    }

    pub fn of_kind(&self, kind: StreamKind) -> impl Iterator<Item = &StageStream> {
        self.0.iter().filter(move |stream| stream.kind == kind)
    }
}

impl FromIterator<StageStream> for StreamSet {
    fn from_iter<T: IntoIterator<Item = StageStream>>(iter: T) -> Self {
        let mut set = Self::default();
        set.merge(iter);
        set
    }
}

/// How a notification changed the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RosterChange {
    /// A new participant entry was created.
    Inserted,
    /// An existing entry gained streams.
    Merged,
    /// An existing entry lost some, but not all, of its streams.
    Reduced,
    /// The entry lost its last stream and was dropped.
    Removed,
    /// Nothing changed, e.g. a repeated notification or an unknown participant.
    Unchanged,
}

impl RosterChange {
    pub fn is_modified(self) -> bool {
        self != Self::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RosterEntry {
    participant: Participant,
    streams: StreamSet,
}

/// The participants with live streams on the stage, keyed by participant id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantRoster {
    entries: HashMap<ParticipantId, RosterEntry>,
}

impl ParticipantRoster {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.entries.get(id).map(|entry| &entry.participant)
    }

    pub fn streams(&self, id: &ParticipantId) -> Option<&StreamSet> {
        self.entries.get(id).map(|entry| &entry.streams)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merges `streams` into the entry for `participant`, creating it if needed.
    /// A repeated notification for a known id never creates a second entry, and
    /// an entry is only created with at least one stream.
    pub fn streams_added(&mut self, participant: Participant, streams: Vec<StageStream>) -> RosterChange {
        match self.entries.get_mut(&participant.id) {
            Some(entry) => {
                if entry.streams.merge(streams) > 0 {
                    RosterChange::Merged
                } else {
                    RosterChange::Unchanged
                }
            }
            None if streams.is_empty() => RosterChange::Unchanged,
            None => {
                let streams = streams.into_iter().collect();
                self.entries
                    .insert(participant.id.clone(), RosterEntry { participant, streams });
                RosterChange::Inserted
            }
        }
    }

    /// Removes `streams` from the entry for `participant` and drops the entry
    /// once it has no streams left.
    pub fn streams_removed(&mut self, participant: &Participant, streams: &[StageStream]) -> RosterChange {
        let Some(entry) = self.entries.get_mut(&participant.id) else {
            return RosterChange::Unchanged;
        };
        let removed = entry.streams.remove(streams);
        if entry.streams.is_empty() {
            self.entries.remove(&participant.id);
            RosterChange::Removed
        } else if removed > 0 {
            RosterChange::Reduced
        } else {
            RosterChange::Unchanged
        }
    }

    /// The streams handed to playback, ordered by participant id. The local
    /// participant's audio is left out so it is not played back to itself.
    pub fn render_projection(&self) -> Vec<ParticipantView> {
        let mut views = self
            .entries
            .values()
            .map(|entry| {
                let streams = entry
                    .streams
                    .iter()
                    .filter(|stream| !(entry.participant.is_local && stream.is_audio()))
                    .cloned()
                    .collect();
                ParticipantView {
                    participant: entry.participant.clone(),
                    label: entry.participant.user_id.clone(),
                    streams,
                }
            })
            .collect::<Vec<_>>();
        views.sort_by(|a, b| a.participant.id.cmp(&b.participant.id));
        views
    }
}
