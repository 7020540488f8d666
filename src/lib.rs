// RecordKeeper - Local-persisted CRUD collections with filtered views and form validation

pub mod backend;
pub mod clock;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod form;
pub mod ids;
pub mod models;
pub mod projection;
pub mod record;
pub mod stats;
pub mod store;

// Re-export main types for convenience
pub use backend::{Backend, FileBackend, MemoryBackend, SqliteBackend};
pub use clock::{Clock, FixedClock, SystemClock, now_ms};
pub use command::{Command, Controller, Outcome};
pub use config::{BackendKind, Config, IdStrategy};
pub use error::{ParseError, PersistenceWarning, StoreError, SubmitError};
pub use form::{FieldError, FieldErrors, FormMode, FormSchema, FormSession, RawFields, raw_fields};
pub use ids::{IdGenerator, SequentialIds, TimestampIds, UuidIds};
pub use projection::{Query, StatusFilter, project};
pub use record::Record;
pub use store::{Mutation, RecordStore};
