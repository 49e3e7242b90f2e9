use crate::domain::errors::StoreError;
use crate::domain::tables::Tables;
use crate::ports::outbound::SnapshotStore;
use parking_lot::Mutex;

/// Keeps the last saved snapshot in memory.
///
/// Used when persistence is disabled and in tests that reopen a store.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshot: Mutex<Option<Tables>>,
    saves: Mutex<u64>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> u64 {
        *self.saves.lock()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<Tables>, StoreError> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        *self.snapshot.lock() = Some(tables.clone());
        *self.saves.lock() += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tables::Table;

    #[test]
    fn test_in_memory_snapshot_round_trip() {
        let store = InMemorySnapshotStore::new();
        assert!(store.load().unwrap().is_none());

        let mut tables = Tables::new();
        tables.next_id(Table::Form);
        store.save(&tables).unwrap();

        assert_eq!(store.load().unwrap(), Some(tables));
        assert_eq!(store.saves(), 1);
    }
}
