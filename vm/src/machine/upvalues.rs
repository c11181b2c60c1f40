use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Every currently open upvalue, keyed by the absolute stack index it
/// observes. At most one open upvalue exists per stack index.
#[derive(Debug, Default, Clone)]
pub struct OpenUpvalues {
    by_slot: BTreeMap<usize, u32>,
}

impl OpenUpvalues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open upvalue observing `stack_idx`, if any.
    pub fn find(&self, stack_idx: usize) -> Option<u32> {
        self.by_slot.get(&stack_idx).copied()
    }

    /// Track `handle` as the open upvalue for `stack_idx`.
    ///
    /// Returns false (and leaves the list unchanged) if that slot is
    /// already tracked.
    pub fn insert(&mut self, stack_idx: usize, handle: u32) -> bool {
        match self.by_slot.entry(stack_idx) {
            Entry::Vacant(e) => {
                e.insert(handle);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Remove and return every entry with stack index `>= from`, ascending.
    pub fn split_from(&mut self, from: usize) -> Vec<(usize, u32)> {
        let tail = self.by_slot.split_off(&from);
        tail.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.by_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slot.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.by_slot.iter().map(|(k, v)| (*k, *v))
    }
}
