//! Generic scoped CRUD accessor
//!
//! An [`EntityAccessor`] owns the in-memory state of one entity collection
//! and runs every read and write through the [`ScopeResolver`], so callers
//! never have to remember tenant or user predicates.
//!
//! Reads fail soft: an incomplete identity or a backend error yields an
//! empty result and sets `error`. Writes return an [`OperationResult`];
//! only a write attempted without the identity it needs is an `Err`.
//!
//! # List sequencing
//!
//! Every list fetch takes a ticket. A response is applied only if no newer
//! list response has been applied already. Mutations that complete while a
//! list fetch is in flight are journaled and replayed on top of that fetch's
//! response, so a create is never lost to a fetch that started before it.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use hrops_common::{
    format_timestamp, COMPANY_COLUMN, DEPARTMENT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN,
    USER_COLUMN,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::config::AccessorSettings;
use crate::database::{
    DataService, DeleteRequest, InsertRequest, SelectRequest, ServiceOperation, UpdateRequest,
};
use crate::error::{HrOpsError, Result};
use crate::models::{from_record, to_record, CompanyId, EntityRecord, Record, RecordId};
use crate::observability::{record_operation, Outcome};
use crate::query::{QueryFilters, QueryOptions, ResultMode};
use crate::scope::{EntityConfig, ReadScope, ScopeResolver, SessionIdentity};
use crate::state::{CollectionState, OperationResult};

/// Everything an accessor needs besides its [`EntityConfig`]
#[derive(Debug, Clone)]
pub struct StoreContext {
    pub service: Arc<dyn DataService>,
    pub identity: SessionIdentity,
    pub settings: AccessorSettings,
}

impl StoreContext {
    #[must_use]
    pub fn new(service: Arc<dyn DataService>, identity: SessionIdentity) -> Self {
        Self {
            service,
            identity,
            settings: AccessorSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: AccessorSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[derive(Debug, Clone)]
enum Mutation<T> {
    Created(T),
    Updated(T),
    Deleted(RecordId),
}

impl<T: EntityRecord> Mutation<T> {
    fn apply(&self, items: &mut Vec<T>) {
        match self {
            Self::Created(record) => CollectionState::upsert(items, record),
            Self::Updated(record) => CollectionState::replace(items, record),
            Self::Deleted(id) => CollectionState::remove(items, *id),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MutationKind {
    Create,
    Update,
    Delete,
}

/// What an in-flight call holds raised until it settles
#[derive(Debug, Clone, Copy)]
enum InFlight {
    Read,
    List,
    Mutation(MutationKind),
}

#[derive(Debug, Clone, Copy)]
struct ListTicket {
    ticket: u64,
    /// Journal length when the fetch started
    mark: usize,
}

#[derive(Debug)]
struct StateCell<T> {
    view: CollectionState<T>,
    reads: usize,
    creates: usize,
    updates: usize,
    deletes: usize,
    next_ticket: u64,
    applied_ticket: u64,
    lists_in_flight: usize,
    journal: Vec<Mutation<T>>,
}

impl<T> Default for StateCell<T> {
    fn default() -> Self {
        Self {
            view: CollectionState::default(),
            reads: 0,
            creates: 0,
            updates: 0,
            deletes: 0,
            next_ticket: 0,
            applied_ticket: 0,
            lists_in_flight: 0,
            journal: Vec::new(),
        }
    }
}

impl<T: EntityRecord> StateCell<T> {
    fn sync_flags(&mut self) {
        self.view.loading = self.reads > 0;
        self.view.creating = self.creates > 0;
        self.view.updating = self.updates > 0;
        self.view.deleting = self.deletes > 0;
    }

    fn counter(&mut self, kind: MutationKind) -> &mut usize {
        match kind {
            MutationKind::Create => &mut self.creates,
            MutationKind::Update => &mut self.updates,
            MutationKind::Delete => &mut self.deletes,
        }
    }

    fn begin_read(&mut self) {
        self.reads += 1;
        self.view.error = None;
        self.sync_flags();
    }

    fn end_read(&mut self) {
        self.reads = self.reads.saturating_sub(1);
        self.sync_flags();
    }

    fn begin_list(&mut self) -> ListTicket {
        self.begin_read();
        self.next_ticket += 1;
        self.lists_in_flight += 1;
        ListTicket {
            ticket: self.next_ticket,
            mark: self.journal.len(),
        }
    }

    fn end_list(&mut self) {
        self.end_read();
        self.lists_in_flight = self.lists_in_flight.saturating_sub(1);
        if self.lists_in_flight == 0 {
            self.journal.clear();
        }
    }

    fn end(&mut self, in_flight: InFlight) {
        match in_flight {
            InFlight::Read => self.end_read(),
            InFlight::List => self.end_list(),
            InFlight::Mutation(kind) => self.end_mutation(kind),
        }
    }

    /// Apply a list response unless a newer one was applied already
    fn apply_list(
        &mut self,
        ticket: ListTicket,
        response: std::result::Result<Vec<T>, String>,
    ) -> Outcome {
        if ticket.ticket < self.applied_ticket {
            Outcome::Stale
        } else {
            self.applied_ticket = ticket.ticket;
            match response {
                Ok(mut items) => {
                    for mutation in self.journal.iter().skip(ticket.mark) {
                        mutation.apply(&mut items);
                    }
                    self.view.items = items;
                    Outcome::Success
                }
                Err(message) => {
                    self.view.error = Some(message);
                    Outcome::Failure
                }
            }
        }
    }

    fn begin_mutation(&mut self, kind: MutationKind) {
        *self.counter(kind) += 1;
        self.view.error = None;
        self.sync_flags();
    }

    fn end_mutation(&mut self, kind: MutationKind) {
        let counter = self.counter(kind);
        *counter = counter.saturating_sub(1);
        self.sync_flags();
    }

    fn record_mutation(&mut self, mutation: Mutation<T>) {
        mutation.apply(&mut self.view.items);
        match &mutation {
            Mutation::Updated(record) => {
                if self.view.item.as_ref().and_then(EntityRecord::id) == record.id() {
                    self.view.item = Some(record.clone());
                }
            }
            Mutation::Deleted(id) => {
                if self.view.item.as_ref().and_then(EntityRecord::id) == Some(*id) {
                    self.view.item = None;
                }
            }
            Mutation::Created(_) => {}
        }
        if self.lists_in_flight > 0 {
            self.journal.push(mutation);
        }
    }
}

/// Keeps an in-flight counter raised until the call settles
///
/// Dropping an unsettled guard (the caller dropped the future mid-call)
/// lowers the counter as well, so flags and the journal never leak.
struct InFlightGuard<T: EntityRecord> {
    state: Arc<RwLock<StateCell<T>>>,
    in_flight: InFlight,
    settled: bool,
}

impl<T: EntityRecord> InFlightGuard<T> {
    fn read(state: &Arc<RwLock<StateCell<T>>>) -> Self {
        state.write().begin_read();
        Self::raised(state, InFlight::Read)
    }

    fn list(state: &Arc<RwLock<StateCell<T>>>) -> (Self, ListTicket) {
        let ticket = state.write().begin_list();
        (Self::raised(state, InFlight::List), ticket)
    }

    fn mutation(state: &Arc<RwLock<StateCell<T>>>, kind: MutationKind) -> Self {
        state.write().begin_mutation(kind);
        Self::raised(state, InFlight::Mutation(kind))
    }

    fn raised(state: &Arc<RwLock<StateCell<T>>>, in_flight: InFlight) -> Self {
        Self {
            state: Arc::clone(state),
            in_flight,
            settled: false,
        }
    }

    /// Lower the counter on an already locked cell
    fn settle(&mut self, cell: &mut StateCell<T>) {
        if !self.settled {
            cell.end(self.in_flight);
            self.settled = true;
        }
    }
}

impl<T: EntityRecord> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.write().end(self.in_flight);
        }
    }
}

/// Scoped CRUD over one entity collection
#[derive(Debug, Clone)]
pub struct EntityAccessor<T: EntityRecord> {
    service: Arc<dyn DataService>,
    config: Arc<EntityConfig>,
    identity: SessionIdentity,
    settings: AccessorSettings,
    state: Arc<RwLock<StateCell<T>>>,
}

impl<T: EntityRecord> EntityAccessor<T> {
    #[must_use]
    pub fn new(context: &StoreContext, config: EntityConfig) -> Self {
        Self {
            service: Arc::clone(&context.service),
            config: Arc::new(config),
            identity: context.identity.clone(),
            settings: context.settings,
            state: Arc::new(RwLock::new(StateCell::default())),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    #[must_use]
    pub const fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> CollectionState<T> {
        self.state.read().view.clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.state.read().view.items.clone()
    }

    #[must_use]
    pub fn item(&self) -> Option<T> {
        self.state.read().view.item.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.read().view.error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.read().view.loading
    }

    pub fn clear_error(&self) {
        self.state.write().view.error = None;
    }

    pub fn clear_item(&self) {
        self.state.write().view.item = None;
    }

    /// Load the whole collection, optionally for another tenant
    #[instrument(skip(self), fields(entity = %self.config.entity_name()))]
    pub async fn fetch_items(&self, company_override: Option<CompanyId>) -> Vec<T> {
        self.run_list(company_override, QueryFilters::new(), QueryOptions::new())
            .await
    }

    /// Load the rows matching `filters` (within scope) and return them
    ///
    /// The result mode of `options` is ignored; lists tolerate any count.
    #[instrument(skip(self, filters, options), fields(entity = %self.config.entity_name()))]
    pub async fn fetch_items_with_query(
        &self,
        filters: QueryFilters,
        options: QueryOptions,
    ) -> Vec<T> {
        debug!(?filters, ?options, "list with query");
        self.run_list(None, filters, options).await
    }

    /// Load one record by id into `item`; `None` if absent or out of scope
    #[instrument(skip(self), fields(entity = %self.config.entity_name()))]
    pub async fn fetch_item(&self, id: RecordId) -> Option<T> {
        let filters = QueryFilters::builder().eq(ID_COLUMN, id).build();
        self.run_single(filters, QueryOptions::new().maybe_single())
            .await
    }

    /// Load the one record matching `filters` into `item`
    ///
    /// `Many` is read as maybe-single. Under `Single`, zero rows is an error;
    /// in both modes several rows is an error.
    #[instrument(skip(self, filters, options), fields(entity = %self.config.entity_name()))]
    pub async fn fetch_single_with_query(
        &self,
        filters: QueryFilters,
        options: QueryOptions,
    ) -> Option<T> {
        debug!(?filters, ?options, "single with query");
        self.run_single(filters, options).await
    }

    /// Insert a record with the scoping columns filled in
    ///
    /// # Errors
    ///
    /// Returns [`HrOpsError::MissingIdentity`] if the session lacks an id the
    /// collection is scoped by; every other failure is reported in the result
    #[instrument(skip(self, payload), fields(entity = %self.config.entity_name()))]
    pub async fn create_item<P>(&self, payload: &P) -> Result<OperationResult<T>>
    where
        P: Serialize + Sync + ?Sized,
    {
        let operation = ServiceOperation::Insert;
        let mut record = match to_record(payload) {
            Ok(record) => record,
            Err(e) => return Ok(self.reject(operation, e)),
        };
        if record.get(ID_COLUMN).is_some_and(Value::is_null) {
            record.remove(ID_COLUMN);
        }
        let record = self.resolver().write(record)?;

        let mut in_flight = InFlightGuard::mutation(&self.state, MutationKind::Create);
        let request = InsertRequest {
            table: self.config.table().clone(),
            record,
            returning: None,
        };
        let result = self
            .call(operation, self.service.insert(request))
            .await
            .and_then(from_record::<T>);

        let mut state = self.state.write();
        in_flight.settle(&mut state);
        match result {
            Ok(created) => {
                state.record_mutation(Mutation::Created(created.clone()));
                drop(state);
                info!(id = ?created.id(), "created {}", self.config.entity_name());
                record_operation(self.config.entity_name(), operation.as_str(), Outcome::Success);
                Ok(OperationResult::ok(created))
            }
            Err(e) => {
                state.view.error = Some(e.to_string());
                drop(state);
                Ok(self.report_failure(operation, e))
            }
        }
    }

    /// Change only the supplied fields of row `id`
    ///
    /// The tenant and owner columns cannot be changed this way, and
    /// `updated_at` is refreshed when the table has it.
    ///
    /// # Errors
    ///
    /// Returns [`HrOpsError::MissingIdentity`] if the collection is company
    /// scoped and no company is known
    #[instrument(skip(self, partial), fields(entity = %self.config.entity_name()))]
    pub async fn update_item<P>(&self, id: RecordId, partial: &P) -> Result<OperationResult<T>>
    where
        P: Serialize + Sync + ?Sized,
    {
        let operation = ServiceOperation::Update;
        let guard = self.resolver().guard()?;
        let mut changes = match to_record(partial) {
            Ok(changes) => changes,
            Err(e) => return Ok(self.reject(operation, e)),
        };
        self.strip_immutable(&mut changes);

        let mut in_flight = InFlightGuard::mutation(&self.state, MutationKind::Update);
        let request = UpdateRequest {
            table: self.config.table().clone(),
            id,
            guard,
            changes,
        };
        let result = self
            .call(operation, self.service.update(request))
            .await
            .and_then(|row| row.ok_or_else(|| self.not_found(id)))
            .and_then(from_record::<T>);

        let mut state = self.state.write();
        in_flight.settle(&mut state);
        match result {
            Ok(updated) => {
                state.record_mutation(Mutation::Updated(updated.clone()));
                drop(state);
                info!(id, "updated {}", self.config.entity_name());
                record_operation(self.config.entity_name(), operation.as_str(), Outcome::Success);
                Ok(OperationResult::ok(updated))
            }
            Err(e) => {
                state.view.error = Some(e.to_string());
                drop(state);
                Ok(self.report_failure(operation, e))
            }
        }
    }

    /// Delete row `id`, guarded by the tenant when company scoped
    ///
    /// # Errors
    ///
    /// Returns [`HrOpsError::MissingIdentity`] if the collection is company
    /// scoped and no company is known
    #[instrument(skip(self), fields(entity = %self.config.entity_name()))]
    pub async fn delete_item(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
        let operation = ServiceOperation::Delete;
        let guard = self.resolver().guard()?;

        let mut in_flight = InFlightGuard::mutation(&self.state, MutationKind::Delete);
        let request = DeleteRequest {
            table: self.config.table().clone(),
            id,
            guard,
        };
        let result = self
            .call(operation, self.service.delete(request))
            .await
            .and_then(|deleted| deleted.ok_or_else(|| self.not_found(id)));

        let mut state = self.state.write();
        in_flight.settle(&mut state);
        match result {
            Ok(deleted) => {
                state.record_mutation(Mutation::Deleted(deleted));
                drop(state);
                info!(id = deleted, "deleted {}", self.config.entity_name());
                record_operation(self.config.entity_name(), operation.as_str(), Outcome::Success);
                Ok(OperationResult::ok(deleted))
            }
            Err(e) => {
                state.view.error = Some(e.to_string());
                drop(state);
                Ok(self.report_failure(operation, e))
            }
        }
    }

    fn resolver(&self) -> ScopeResolver<'_> {
        ScopeResolver::new(&self.config, self.identity.current())
    }

    fn not_found(&self, id: RecordId) -> HrOpsError {
        HrOpsError::NotFound {
            entity: self.config.entity_name().to_string(),
            id,
        }
    }

    fn strip_immutable(&self, changes: &mut Record) {
        changes.remove(ID_COLUMN);
        if self.config.is_company_scoped() {
            changes.remove(COMPANY_COLUMN);
        }
        if self.config.is_user_scoped() {
            changes.remove(USER_COLUMN);
        }
        // A department can only be cleared (made global) or set to the caller's own
        if self.config.is_department_scoped()
            && changes.get(DEPARTMENT_COLUMN).is_some_and(|v| !v.is_null())
        {
            match self.identity.current().department_id {
                Some(department_id) => {
                    changes.insert(DEPARTMENT_COLUMN.to_string(), Value::from(department_id));
                }
                None => {
                    changes.remove(DEPARTMENT_COLUMN);
                }
            }
        }
        if self.config.table().timestamps {
            changes.insert(
                UPDATED_AT_COLUMN.to_string(),
                Value::from(format_timestamp(&Utc::now())),
            );
        }
    }

    /// Bound a backend call by the request timeout
    async fn call<R>(
        &self,
        operation: ServiceOperation,
        request: impl Future<Output = Result<R>>,
    ) -> Result<R> {
        tokio::time::timeout(self.settings.request_timeout(), request)
            .await
            .unwrap_or_else(|_| {
                Err(HrOpsError::Timeout {
                    entity: self.config.entity_name().to_string(),
                    operation: operation.as_str(),
                })
            })
    }

    async fn select(&self, request: SelectRequest) -> Result<Vec<T>> {
        request.options.validate()?;
        self.call(ServiceOperation::Select, self.service.select(request))
            .await?
            .into_iter()
            .map(from_record)
            .collect()
    }

    async fn run_list(
        &self,
        company_override: Option<CompanyId>,
        filters: QueryFilters,
        mut options: QueryOptions,
    ) -> Vec<T> {
        let scope = self
            .resolver()
            .with_company_override(company_override)
            .read();
        let (mut in_flight, ticket) = InFlightGuard::list(&self.state);

        let (rows, skipped) = match scope {
            ReadScope::Unavailable { missing } => {
                debug!(missing, "identity incomplete, list is empty");
                (Ok(Vec::new()), true)
            }
            ReadScope::Scoped(scope) => {
                options.mode = ResultMode::Many;
                let request = SelectRequest {
                    table: self.config.table().clone(),
                    scope,
                    filters,
                    options,
                };
                (self.select(request).await, false)
            }
        };

        let (rows, response) = match rows {
            Ok(rows) => {
                let response = Ok(rows.clone());
                (rows, response)
            }
            Err(e) => {
                error!("Failed to fetch {}: {}", self.config.entity_name(), e);
                (Vec::new(), Err(e.to_string()))
            }
        };
        let outcome = {
            let mut state = self.state.write();
            let outcome = state.apply_list(ticket, response);
            in_flight.settle(&mut state);
            outcome
        };

        let outcome = match outcome {
            Outcome::Success if skipped => Outcome::Skipped,
            Outcome::Stale => {
                debug!(ticket = ticket.ticket, "discarded stale list response");
                Outcome::Stale
            }
            other => other,
        };
        record_operation(
            self.config.entity_name(),
            ServiceOperation::Select.as_str(),
            outcome,
        );
        rows
    }

    async fn run_single(&self, filters: QueryFilters, mut options: QueryOptions) -> Option<T> {
        if options.mode == ResultMode::Many {
            options.mode = ResultMode::MaybeSingle;
        }
        let mode = options.mode;
        let scope = self.resolver().read();
        let mut in_flight = InFlightGuard::read(&self.state);

        let (result, skipped) = match scope {
            ReadScope::Unavailable { missing } => {
                debug!(missing, "identity incomplete, no record");
                (Ok(None), true)
            }
            ReadScope::Scoped(scope) => {
                let request = SelectRequest {
                    table: self.config.table().clone(),
                    scope,
                    filters,
                    options,
                };
                let result = self
                    .select(request)
                    .await
                    .and_then(|rows| self.coerce_single(rows, mode));
                (result, false)
            }
        };

        let mut state = self.state.write();
        in_flight.settle(&mut state);
        let (item, outcome) = match result {
            Ok(item) => {
                state.view.item.clone_from(&item);
                let outcome = if skipped {
                    Outcome::Skipped
                } else {
                    Outcome::Success
                };
                (item, outcome)
            }
            Err(e) => {
                state.view.error = Some(e.to_string());
                drop(state);
                error!("Failed to fetch {}: {}", self.config.entity_name(), e);
                (None, Outcome::Failure)
            }
        };
        record_operation(
            self.config.entity_name(),
            ServiceOperation::Select.as_str(),
            outcome,
        );
        item
    }

    fn coerce_single(&self, mut rows: Vec<T>, mode: ResultMode) -> Result<Option<T>> {
        match (rows.len(), mode) {
            (0, ResultMode::Single) | (2.., _) => Err(HrOpsError::NotSingle {
                entity: self.config.entity_name().to_string(),
                rows: rows.len(),
            }),
            _ => Ok(rows.pop()),
        }
    }

    /// A payload that could not be turned into a record
    fn reject<D>(&self, operation: ServiceOperation, error: HrOpsError) -> OperationResult<D> {
        self.state.write().view.error = Some(error.to_string());
        self.report_failure(operation, error)
    }

    fn report_failure<D>(&self, operation: ServiceOperation, error: HrOpsError) -> OperationResult<D> {
        error!(
            "Failed to {} {}: {}",
            operation.as_str(),
            self.config.entity_name(),
            error
        );
        record_operation(self.config.entity_name(), operation.as_str(), Outcome::Failure);
        error.into()
    }
}
