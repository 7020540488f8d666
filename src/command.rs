// User commands dispatched to a store and its form session

use crate::backend::Backend;
use crate::error::{PersistenceWarning, StoreError, SubmitError};
use crate::form::{self, FieldErrors, FormMode, FormSchema, FormSession, RawFields};
use crate::projection::{self, Query, StatusFilter};
use crate::record::Record;
use crate::store::{Mutation, RecordStore};
use tracing::debug;

/// Every gesture the view layer can send
#[derive(Debug, Clone, PartialEq)]
pub enum Command<R: Record> {
    /// Create from fields, whatever mode the form is in
    Create(RawFields),
    /// Enter edit mode for a record
    BeginEdit(String),
    /// Create or update depending on the form mode
    Submit(RawFields),
    /// Update a record directly from fields
    Update(String, RawFields),
    /// Ask for confirmation before deleting
    RequestDelete(String),
    ConfirmDelete,
    CancelDelete,
    /// Delete without the confirmation step
    Delete(String),
    ToggleFlag(String, String),
    Filter(StatusFilter<R::Status>),
    Sort(R::SortKey),
    Search(String),
    CancelEdit,
}

/// What a dispatched command did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    Created(Mutation<R>),
    Updated(Mutation<R>),
    Deleted(Mutation<R>),
    /// Edit mode entered; fields to pre-fill the form with
    Editing(RawFields),
    /// Delete awaiting confirmation
    ConfirmationRequired(String),
    /// Filter, sort, search, cancel, or a confirm with nothing pending
    ViewChanged,
    /// Validation failed; nothing was written
    Rejected(FieldErrors),
    NotFound(String),
    Failed(StoreError),
}

impl<R> Outcome<R> {
    /// Persistence warning carried by a mutation, if any
    pub fn warning(&self) -> Option<&PersistenceWarning> {
        match self {
            Outcome::Created(m) | Outcome::Updated(m) | Outcome::Deleted(m) => m.warning.as_ref(),
            _ => None,
        }
    }
}

impl<R> From<StoreError> for Outcome<R> {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Outcome::NotFound(id),
            other => Outcome::Failed(other),
        }
    }
}

/// One collection's store, form session and current view parameters
pub struct Controller<R: FormSchema, B: Backend> {
    store: RecordStore<R, B>,
    form: FormSession<R>,
    query: Query<R>,
}

impl<R: FormSchema, B: Backend> Controller<R, B> {
    pub fn new(store: RecordStore<R, B>) -> Self {
        Self {
            store,
            form: FormSession::new(),
            query: Query::default(),
        }
    }

    pub fn store(&self) -> &RecordStore<R, B> {
        &self.store
    }

    pub fn form_mode(&self) -> &FormMode {
        self.form.mode()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.form.pending_delete()
    }

    pub fn query(&self) -> &Query<R> {
        &self.query
    }

    /// Records to display for the current query
    pub fn view(&self) -> Vec<&R> {
        projection::project(self.store.list(), &self.query)
    }

    pub fn dispatch(&mut self, command: Command<R>) -> Outcome<R> {
        debug!(collection = R::collection_name(), command = command_name(&command), "dispatch");
        match command {
            Command::Create(raw) => submitted(form::submit_create(&mut self.store, &raw), Outcome::Created),
            Command::Submit(raw) => {
                let creating = *self.form.mode() == FormMode::Create;
                let wrap: fn(Mutation<R>) -> Outcome<R> = if creating { Outcome::Created } else { Outcome::Updated };
                submitted(self.form.submit(&mut self.store, &raw), wrap)
            }
            Command::Update(id, raw) => submitted(form::submit_update(&mut self.store, &id, &raw), Outcome::Updated),
            Command::BeginEdit(id) => match self.form.begin_edit(&self.store, &id) {
                Ok(fields) => Outcome::Editing(fields),
                Err(e) => e.into(),
            },
            Command::CancelEdit => {
                self.form.cancel_edit();
                Outcome::ViewChanged
            }
            Command::RequestDelete(id) => match self.form.request_delete(&self.store, &id) {
                Ok(()) => Outcome::ConfirmationRequired(id),
                Err(e) => e.into(),
            },
            Command::ConfirmDelete => match self.form.confirm_delete(&mut self.store) {
                Ok(Some(mutation)) => Outcome::Deleted(mutation),
                Ok(None) => Outcome::ViewChanged,
                Err(e) => e.into(),
            },
            Command::CancelDelete => {
                self.form.cancel_delete();
                Outcome::ViewChanged
            }
            Command::Delete(id) => match self.form.delete(&mut self.store, &id) {
                Ok(mutation) => Outcome::Deleted(mutation),
                Err(e) => e.into(),
            },
            Command::ToggleFlag(id, field) => match self.store.toggle_flag(&id, &field) {
                Ok(mutation) => Outcome::Updated(mutation),
                Err(e) => e.into(),
            },
            Command::Filter(status) => {
                self.query.status = status;
                Outcome::ViewChanged
            }
            Command::Sort(key) => {
                self.query.sort = key;
                Outcome::ViewChanged
            }
            Command::Search(term) => {
                self.query.search = term;
                Outcome::ViewChanged
            }
        }
    }
}

fn submitted<R>(result: Result<Mutation<R>, SubmitError>, wrap: fn(Mutation<R>) -> Outcome<R>) -> Outcome<R> {
    match result {
        Ok(mutation) => wrap(mutation),
        Err(SubmitError::Invalid(errors)) => Outcome::Rejected(errors),
        Err(SubmitError::Store(e)) => e.into(),
    }
}

fn command_name<R: Record>(command: &Command<R>) -> &'static str {
    match command {
        Command::Create(_) => "create",
        Command::BeginEdit(_) => "begin_edit",
        Command::Submit(_) => "submit",
        Command::Update(..) => "update",
        Command::RequestDelete(_) => "request_delete",
        Command::ConfirmDelete => "confirm_delete",
        Command::CancelDelete => "cancel_delete",
        Command::Delete(_) => "delete",
        Command::ToggleFlag(..) => "toggle_flag",
        Command::Filter(_) => "filter",
        Command::Sort(_) => "sort",
        Command::Search(_) => "search",
        Command::CancelEdit => "cancel_edit",
    }
}
