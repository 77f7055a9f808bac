use alloy_primitives::{Address, B256, U256};

/// Undo record for a single state mutation.
#[derive(Clone, Debug)]
pub(super) enum JournalEntry {
    Storage {
        address: Address,
        slot: B256,
        previous: U256,
    },
    Balance {
        address: Address,
        previous: U256,
    },
}

/// Position to unwind to when a frame fails.
#[derive(Clone, Copy, Debug)]
pub(super) struct Checkpoint {
    pub entries: usize,
    pub logs: usize,
}

#[derive(Debug, Default)]
pub(super) struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn checkpoint(&self, logs: usize) -> Checkpoint {
        Checkpoint {
            entries: self.entries.len(),
            logs,
        }
    }

    pub fn push(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Entries recorded since `checkpoint`, newest first.
    pub fn unwind(&mut self, checkpoint: Checkpoint) -> impl Iterator<Item = JournalEntry> {
        self.entries.split_off(checkpoint.entries).into_iter().rev()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
