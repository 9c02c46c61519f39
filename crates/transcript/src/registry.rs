use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use crate::speaker::SpeakerMap;

/// Optional cross-call speaker continuity.
///
/// A per-call [`SpeakerMap`] numbers whoever spoke in that call from 1. When
/// one conversation spans several recognition calls, the registry keeps the
/// tag-to-ID assignment alive between calls so "Speaker 2" stays the same
/// voice. Entries expire after `timeout` without being observed; once every
/// entry has expired, numbering starts over at 1.
///
/// A zero timeout makes every call independent.
#[derive(Debug)]
pub struct SpeakerRegistry {
    timeout: Duration,
    seen: HashMap<i32, Entry>,
    next_id: u32,
}

#[derive(Debug)]
struct Entry {
    display_id: u32,
    last_seen: Instant,
}

impl SpeakerRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            seen: HashMap::new(),
            next_id: 1,
        }
    }

    /// Folds one call's tags into the registry and returns the mapping to
    /// use for that call. Known tags keep their IDs, new tags get the next
    /// sequential ID in ascending tag order.
    pub fn observe(&mut self, tags: impl IntoIterator<Item = i32>, now: Instant) -> SpeakerMap {
        self.expire(now);

        let distinct: BTreeSet<i32> = tags.into_iter().collect();
        let mut pairs = Vec::with_capacity(distinct.len());

        for tag in distinct {
            let display_id = match self.seen.get_mut(&tag) {
                Some(entry) => {
                    entry.last_seen = now;
                    entry.display_id
                }
                None => {
                    let display_id = self.next_id;
                    self.next_id += 1;
                    self.seen.insert(
                        tag,
                        Entry {
                            display_id,
                            last_seen: now,
                        },
                    );
                    display_id
                }
            };

            pairs.push((tag, display_id));
        }

        SpeakerMap::from_pairs(pairs)
    }

    fn expire(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.seen
            .retain(|_, entry| now.duration_since(entry.last_seen) < timeout);

        if self.seen.is_empty() {
            self.next_id = 1;
        }
    }
}
