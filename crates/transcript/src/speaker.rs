use std::collections::{BTreeMap, BTreeSet};

use notula_speech_interface::WordInfo;

/// Roster palette, assigned in display-ID order and cycled when a
/// conversation has more speakers than colors.
pub const SPEAKER_COLORS: &[&str] = &[
    "#4285F4", "#EA4335", "#FBBC05", "#34A853", "#FF6D01", "#46BDC6", "#7B61FF", "#F439A0",
];

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Speaker {
    pub id: String,
    pub label: String,
    pub color: String,
}

impl Speaker {
    pub(crate) fn numbered(id: u32) -> Self {
        let color_index = (id.max(1) as usize - 1) % SPEAKER_COLORS.len();
        Self {
            id: id.to_string(),
            label: format!("Speaker {id}"),
            color: SPEAKER_COLORS[color_index].to_string(),
        }
    }
}

/// Maps the provider's arbitrary speaker tags to sequential display IDs.
///
/// Tags are numbered in ascending order, so the same tag set always yields
/// the same mapping no matter what order the words arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerMap {
    ids: BTreeMap<i32, u32>,
}

impl SpeakerMap {
    pub fn from_tags(tags: impl IntoIterator<Item = i32>) -> Self {
        let distinct: BTreeSet<i32> = tags.into_iter().collect();
        Self {
            ids: distinct.into_iter().zip(1u32..).collect(),
        }
    }

    pub fn from_words(words: &[WordInfo]) -> Self {
        Self::from_tags(words.iter().filter_map(|w| w.speaker_tag))
    }

    /// Used by [`SpeakerRegistry`] to carry IDs across calls; per-call maps
    /// come from [`SpeakerMap::from_tags`].
    ///
    /// [`SpeakerRegistry`]: crate::SpeakerRegistry
    pub(crate) fn from_pairs(pairs: impl IntoIterator<Item = (i32, u32)>) -> Self {
        Self {
            ids: pairs.into_iter().collect(),
        }
    }

    pub fn display_id(&self, tag: i32) -> Option<String> {
        self.ids.get(&tag).map(u32::to_string)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Roster in display-ID order.
    pub fn roster(&self) -> Vec<Speaker> {
        let mut ids: Vec<u32> = self.ids.values().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().map(Speaker::numbered).collect()
    }
}
