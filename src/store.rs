// Generic record collection backed by a durable key-value store

use crate::backend::Backend;
use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::error::{PersistenceWarning, StoreError};
use crate::ids::{IdGenerator, TimestampIds};
use crate::record::Record;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Result of a mutating operation: the affected record, plus a warning when
/// the durable write failed and only the in-memory state changed
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<R> {
    pub record: R,
    pub warning: Option<PersistenceWarning>,
}

impl<R> Mutation<R> {
    pub fn persisted(&self) -> bool {
        self.warning.is_none()
    }
}

/// In-memory record list, mirrored to `backend` after every mutation
pub struct RecordStore<R: Record, B: Backend> {
    backend: B,
    records: Vec<R>,
    ids: Box<dyn IdGenerator>,
    clock: Rc<dyn Clock>,
}

impl<R: Record, B: Backend> RecordStore<R, B> {
    /// Open the collection stored in `backend`.
    ///
    /// Missing or corrupt data yields an empty collection; it is logged,
    /// never returned as an error.
    pub fn open(backend: B) -> Self {
        let mut store = Self {
            backend,
            records: Vec::new(),
            ids: Box::new(TimestampIds::default()),
            clock: Rc::new(SystemClock),
        };
        store.load();
        store
    }

    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the in-memory list with what the backend holds
    pub fn load(&mut self) {
        let collection = R::collection_name();
        self.records = match self.backend.read(collection) {
            Ok(Some(text)) => match codec::decode_collection(&text) {
                Ok(records) => records,
                Err(e) => {
                    warn!(collection, error = ?e, "Stored collection is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!(collection, "No stored collection, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(collection, error = ?e, "Failed to read stored collection, starting empty");
                Vec::new()
            }
        };
        info!(
            collection,
            backend = %self.backend.describe(),
            count = self.records.len(),
            "Collection loaded"
        );
    }

    // ========================================================================
    // CRUD API
    // ========================================================================

    /// Create a record from an already validated payload
    pub fn create(&mut self, payload: R::Payload) -> Mutation<R> {
        let id = self.fresh_id();
        let record = R::from_payload(id, self.clock.now_ms(), payload);
        debug!(collection = R::collection_name(), id = record.id(), "create");
        self.records.push(record.clone());
        let warning = self.persist();
        Mutation { record, warning }
    }

    /// Merge `patch` into the record with `id` and stamp `updated_at`
    pub fn update(&mut self, id: &str, patch: R::Patch) -> Result<Mutation<R>, StoreError> {
        let now = self.clock.now_ms();
        let record = self.find_mut(id)?;
        record.apply_patch(patch);
        record.touch(now);
        let record = record.clone();
        debug!(collection = R::collection_name(), id, "update");
        let warning = self.persist();
        Ok(Mutation { record, warning })
    }

    /// Remove the record with `id`, returning it
    pub fn delete(&mut self, id: &str) -> Result<Mutation<R>, StoreError> {
        let index = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let record = self.records.remove(index);
        debug!(collection = R::collection_name(), id, "delete");
        let warning = self.persist();
        Ok(Mutation { record, warning })
    }

    /// Flip the boolean `field` of the record with `id`
    pub fn toggle_flag(&mut self, id: &str, field: &str) -> Result<Mutation<R>, StoreError> {
        let record = self.find_mut(id)?;
        let value = record.toggle_flag(field).ok_or_else(|| StoreError::UnsupportedFlag {
            collection: R::collection_name(),
            field: field.to_string(),
        })?;
        let record = record.clone();
        debug!(collection = R::collection_name(), id, field, value, "toggle");
        let warning = self.persist();
        Ok(Mutation { record, warning })
    }

    /// The full collection in insertion order
    pub fn list(&self) -> &[R] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records whose status is `status`
    pub fn count_status(&self, status: R::Status) -> usize {
        self.records.iter().filter(|r| r.status() == status).count()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn find_mut(&mut self, id: &str) -> Result<&mut R, StoreError> {
        self.records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Next generated id, suffixed if the generator repeats an existing one
    fn fresh_id(&mut self) -> String {
        let base = self.ids.next_id();
        let mut id = base.clone();
        let mut n = 1;
        while self.get(&id).is_some() {
            id = format!("{}-{}", base, n);
            n += 1;
        }
        id
    }

    /// Write the whole collection; failures are reported, never rolled back
    fn persist(&mut self) -> Option<PersistenceWarning> {
        let collection = R::collection_name();
        let result = codec::encode_collection(&self.records).and_then(|text| self.backend.write(collection, &text));
        match result {
            Ok(()) => None,
            Err(e) => {
                warn!(collection, error = ?e, "Failed to persist collection, keeping changes in memory");
                Some(PersistenceWarning {
                    key: collection.to_string(),
                    message: format!("{:#}", e),
                })
            }
        }
    }
}
