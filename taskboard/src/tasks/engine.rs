//! Optimistic reconciliation of the local task collection.
//!
//! Every mutation runs in two halves. The optimistic half executes when the
//! mutation method is called: it snapshots the collection, applies the change
//! locally and returns a future. The future performs the repository call and
//! then settles: on success the server's record is folded in, on failure the
//! change is rolled back.
//!
//! Rollback restores the full snapshot only while nothing else has touched
//! the collection since the mutation began. Once another change has landed,
//! only the record owned by the failed mutation is restored, so unrelated
//! work that settled in between is kept.
//!
//! An update or delete aimed at a record whose create is still in flight is
//! applied locally at once but held back from the repository until the
//! create settles; it is then sent against the server-assigned id.
//!
//! The state lock is never held across an `.await`.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use taskboard_proto::task::{NewTask, Task, TaskId, TaskPatch};
use tokio::sync::watch;

use super::{EngineError, LoadState, MutationOp};
use crate::repository::{RepositoryError, TaskRepository};

/// Prefix of ids minted for records the server has not confirmed.
pub const TEMP_ID_PREFIX: &str = "tmp-";

/// How an in-flight create ended, as seen by mutations queued behind it.
#[derive(Debug, Clone)]
enum Outcome {
    InFlight,
    Confirmed(TaskId),
    Failed(RepositoryError),
}

/// Bookkeeping for one in-flight create, keyed by its temp id.
struct CreateSlot {
    outcome: watch::Sender<Outcome>,
    /// Updates and deletes waiting on this create.
    followers: usize,
    /// A delete was queued; the confirmed record must not reappear.
    removed: bool,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    /// Ids of records awaiting server confirmation.
    provisional: HashSet<TaskId>,
    creates: HashMap<TaskId, CreateSlot>,
    next_temp: u64,
    /// Bumped on every change to `tasks`.
    generation: u64,
    load: LoadState,
}

impl State {
    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == *id)
    }

    fn touch(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Registers a mutation behind the in-flight create of `id`, if any.
    fn follow(&mut self, id: &TaskId, removes: bool) -> Option<watch::Receiver<Outcome>> {
        let slot = self.creates.get_mut(id)?;
        slot.followers += 1;
        slot.removed |= removes;
        Some(slot.outcome.subscribe())
    }

    fn mint_temp_id(&mut self) -> TaskId {
        loop {
            self.next_temp += 1;
            let id = TaskId::new(format!("{TEMP_ID_PREFIX}{}", self.next_temp));
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    /// Replaces the collection with a listing, dropping duplicate ids.
    fn replace_all(&mut self, listing: Vec<Task>) {
        let mut seen = HashSet::with_capacity(listing.len());
        let mut tasks = Vec::with_capacity(listing.len());
        for task in listing {
            if seen.insert(task.id.clone()) {
                tasks.push(task);
            } else {
                tracing::warn!(task_id = %task.id, "listing repeated a task id, keeping the first");
            }
        }
        self.tasks = tasks;
        self.provisional.clear();
        self.touch();
    }
}

/// What a mutation changed locally, so settlement can commit or undo it.
enum Target {
    Created { temp_id: TaskId },
    Updated { id: TaskId, previous: Task },
    Removed { previous: Task, index: usize },
}

struct Pending {
    op: MutationOp,
    snapshot: Vec<Task>,
    provisional: HashSet<TaskId>,
    /// Generation right after the optimistic change.
    generation: u64,
    target: Target,
    /// Set when the target's create had not settled yet.
    awaiting: Option<watch::Receiver<Outcome>>,
}

impl Pending {
    fn id(&self) -> &TaskId {
        match &self.target {
            Target::Created { temp_id } => temp_id,
            Target::Updated { id, .. } => id,
            Target::Removed { previous, .. } => &previous.id,
        }
    }

    /// Points the mutation at the id the server assigned to its target.
    fn retarget(&mut self, server_id: &TaskId) {
        match &mut self.target {
            Target::Created { .. } => {}
            Target::Updated { id, previous } => {
                id.clone_from(server_id);
                previous.id.clone_from(server_id);
            }
            Target::Removed { previous, .. } => previous.id.clone_from(server_id),
        }
    }
}

struct Inner<R> {
    repo: R,
    state: Mutex<State>,
}

/// Owner of the local task collection.
///
/// Cheap to clone; clones share the same collection and repository.
pub struct TaskEngine<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for TaskEngine<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TaskRepository + 'static> TaskEngine<R> {
    /// Creates an engine with an empty collection in [`LoadState::Idle`].
    pub fn new(repo: R) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.inner.repo
    }

    // --- Reads ---

    /// Returns a copy of the collection in display order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.state.lock().tasks.clone()
    }

    /// Returns a copy of one record.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        let state = self.inner.state.lock();
        state.position(id).map(|i| state.tasks[i].clone())
    }

    /// Returns `true` if the collection holds `id`.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.inner.state.lock().position(id).is_some()
    }

    /// Returns `true` if `id` is an optimistic record the server has not
    /// confirmed yet.
    #[must_use]
    pub fn is_provisional(&self, id: &TaskId) -> bool {
        self.inner.state.lock().provisional.contains(id)
    }

    /// Returns the current load state.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.inner.state.lock().load.clone()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }

    /// Returns `true` if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().tasks.is_empty()
    }

    // --- Loading ---

    /// Replaces the collection with the repository listing.
    ///
    /// Rows stay visible while the listing is in flight. On failure the
    /// collection is emptied and the state becomes [`LoadState::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Load`] if the listing fails.
    pub async fn refresh(&self) -> Result<usize, EngineError> {
        self.inner.state.lock().load = LoadState::Loading;
        let result = self.inner.repo.list().await;

        let mut state = self.inner.state.lock();
        match result {
            Ok(listing) => {
                state.replace_all(listing);
                state.load = LoadState::Ready;
                tracing::info!(count = state.tasks.len(), "tasks loaded");
                Ok(state.tasks.len())
            }
            Err(e) => {
                state.tasks.clear();
                state.provisional.clear();
                state.touch();
                state.load = LoadState::Failed(e.clone());
                tracing::warn!(error = %e, "failed to load tasks");
                Err(EngineError::Load(e))
            }
        }
    }

    /// Re-reads the listing after a mutation settled.
    ///
    /// Unlike [`refresh`](Self::refresh), a failure leaves the collection
    /// and load state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Load`] if the listing fails.
    pub async fn resync(&self) -> Result<usize, EngineError> {
        match self.inner.repo.list().await {
            Ok(listing) => {
                let mut state = self.inner.state.lock();
                state.replace_all(listing);
                state.load = LoadState::Ready;
                tracing::debug!(count = state.tasks.len(), "tasks resynced");
                Ok(state.tasks.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, "resync failed, keeping local tasks");
                Err(EngineError::Load(e))
            }
        }
    }

    /// Fetches one record from the repository.
    ///
    /// A record already in the collection is replaced by the fetched copy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the repository does not know
    /// `id`, or [`EngineError::Load`] for any other failure.
    pub async fn fetch(&self, id: &TaskId) -> Result<Task, EngineError> {
        let task = self.inner.repo.get(id).await.map_err(|e| match e {
            RepositoryError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Load(other),
        })?;

        let mut state = self.inner.state.lock();
        if let Some(i) = state.position(id)
            && state.tasks[i] != task
        {
            state.tasks[i] = task.clone();
            state.touch();
        }
        Ok(task)
    }

    // --- Mutations ---

    /// Adds a task.
    ///
    /// A provisional record with a temporary id is appended before this
    /// returns. The returned future sends the create and resolves to the
    /// server's record, which replaces the provisional one.
    ///
    /// Input is not validated here; a repository rejection rolls the
    /// provisional record back like any other failure.
    ///
    /// # Errors
    ///
    /// [`EngineError::MutationFailed`] if the repository rejects the create
    /// (the provisional record is removed).
    pub fn create(
        &self,
        input: NewTask,
    ) -> impl Future<Output = Result<Task, EngineError>> + Send + use<R> {
        let pending = self.begin_create(&input);
        let engine = self.clone();
        async move {
            let result = engine.inner.repo.create(&input).await;
            engine.settle_create(pending, result)
        }
    }

    /// Merges `patch` into a task.
    ///
    /// The merge is visible before this returns. The returned future sends
    /// the patch; the server's record wins if it differs from the local merge.
    /// A patch to a provisional record is sent once its create is confirmed.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] without contacting the repository, or
    /// [`EngineError::MutationFailed`] after a rollback (including when the
    /// target's create failed).
    pub fn update(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> impl Future<Output = Result<Task, EngineError>> + Send + use<R> {
        let pending = self.begin_update(id, &patch);
        let engine = self.clone();
        async move {
            let mut pending = pending?;
            if let Err(e) = engine.await_target(&mut pending).await {
                return Err(engine.abandon(&pending, e));
            }
            let id = pending.id().clone();
            let result = engine.inner.repo.update(&id, &patch).await;
            engine.settle_update(pending, result)
        }
    }

    /// Deletes a task.
    ///
    /// The record disappears before this returns. On failure it is put back
    /// at its original position with its original values. Deleting a
    /// provisional record waits for its create and then deletes the server
    /// copy; if the create fails there is nothing left to delete.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] without contacting the repository, or
    /// [`EngineError::MutationFailed`] after a rollback.
    pub fn remove(
        &self,
        id: &TaskId,
    ) -> impl Future<Output = Result<(), EngineError>> + Send + use<R> {
        let pending = self.begin_remove(id);
        let engine = self.clone();
        async move {
            let mut pending = pending?;
            if let Err(e) = engine.await_target(&mut pending).await {
                tracing::debug!(task_id = %pending.id(), error = %e, "create failed, nothing to delete");
                return Ok(());
            }
            let id = pending.id().clone();
            let result = engine.inner.repo.remove(&id).await;
            engine.settle_remove(pending, result)
        }
    }

    /// Waits for the create a queued mutation depends on and retargets it
    /// at the server id. Returns the create's failure if it did not land.
    async fn await_target(&self, pending: &mut Pending) -> Result<(), RepositoryError> {
        let Some(mut rx) = pending.awaiting.take() else {
            return Ok(());
        };
        let outcome = rx
            .wait_for(|o| !matches!(o, Outcome::InFlight))
            .await
            .map(|o| (*o).clone());
        match outcome {
            Ok(Outcome::Confirmed(server_id)) => {
                pending.retarget(&server_id);
                Ok(())
            }
            Ok(Outcome::Failed(e)) => Err(e),
            Ok(Outcome::InFlight) | Err(_) => Err(RepositoryError::Network(
                "create was abandoned before it settled".to_string(),
            )),
        }
    }

    /// Reports a queued mutation whose target's create failed. The create's
    /// rollback already removed the record.
    fn abandon(&self, pending: &Pending, source: RepositoryError) -> EngineError {
        self.inner.state.lock().touch();
        tracing::warn!(task_id = %pending.id(), op = %pending.op, error = %source, "target create failed");
        EngineError::MutationFailed {
            op: pending.op,
            id: pending.id().clone(),
            source,
        }
    }

    // --- Optimistic halves ---

    fn begin_create(&self, input: &NewTask) -> Pending {
        let mut state = self.inner.state.lock();
        let snapshot = state.tasks.clone();
        let provisional = state.provisional.clone();
        let temp_id = state.mint_temp_id();
        state
            .tasks
            .push(Task::from_new(temp_id.clone(), input.clone()));
        state.provisional.insert(temp_id.clone());
        let (outcome, _) = watch::channel(Outcome::InFlight);
        state.creates.insert(
            temp_id.clone(),
            CreateSlot {
                outcome,
                followers: 0,
                removed: false,
            },
        );
        let generation = state.touch();
        tracing::debug!(task_id = %temp_id, "optimistic create applied");

        Pending {
            op: MutationOp::Create,
            snapshot,
            provisional,
            generation,
            target: Target::Created { temp_id },
            awaiting: None,
        }
    }

    fn begin_update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Pending, EngineError> {
        let mut state = self.inner.state.lock();
        let index = state
            .position(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        let awaiting = state.follow(id, false);

        let snapshot = state.tasks.clone();
        let provisional = state.provisional.clone();
        let previous = state.tasks[index].clone();
        state.tasks[index].apply_patch(patch);
        let generation = state.touch();
        tracing::debug!(task_id = %id, "optimistic update applied");

        Ok(Pending {
            op: MutationOp::Update,
            snapshot,
            provisional,
            generation,
            target: Target::Updated {
                id: id.clone(),
                previous,
            },
            awaiting,
        })
    }

    fn begin_remove(&self, id: &TaskId) -> Result<Pending, EngineError> {
        let mut state = self.inner.state.lock();
        let index = state
            .position(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        let awaiting = state.follow(id, true);

        let snapshot = state.tasks.clone();
        let provisional = state.provisional.clone();
        let previous = state.tasks.remove(index);
        let generation = state.touch();
        tracing::debug!(task_id = %id, index, "optimistic delete applied");

        Ok(Pending {
            op: MutationOp::Delete,
            snapshot,
            provisional,
            generation,
            target: Target::Removed { previous, index },
            awaiting,
        })
    }

    // --- Settlement ---

    fn settle_create(
        &self,
        pending: Pending,
        result: Result<Task, RepositoryError>,
    ) -> Result<Task, EngineError> {
        let Target::Created { temp_id } = &pending.target else {
            return result.map_err(|e| self.roll_back(pending, e));
        };
        let temp_id = temp_id.clone();
        let slot = self.inner.state.lock().creates.remove(&temp_id);
        let server = match result {
            Ok(task) => task,
            Err(e) => {
                let err = self.roll_back(pending, e.clone());
                if let Some(slot) = slot {
                    slot.outcome.send_replace(Outcome::Failed(e));
                }
                return Err(err);
            }
        };

        let mut state = self.inner.state.lock();
        state.provisional.remove(&temp_id);
        let temp_index = state.position(&temp_id);
        let (followers, removed) = slot
            .as_ref()
            .map_or((0, false), |slot| (slot.followers, slot.removed));
        if removed {
            // A queued delete owns the record now; it must not reappear.
            if let Some(i) = temp_index {
                state.tasks.remove(i);
            }
        } else if followers > 0
            && let Some(i) = temp_index
            && state.position(&server.id).is_none()
        {
            // Queued edits are already merged locally; only the id changes.
            state.tasks[i].id = server.id.clone();
        } else if let Some(existing) = state.position(&server.id) {
            // A listing already delivered this record: keep one copy.
            state.tasks[existing] = server.clone();
            if let Some(i) = temp_index {
                state.tasks.remove(i);
            }
        } else if let Some(i) = temp_index {
            state.tasks[i] = server.clone();
        } else {
            state.tasks.push(server.clone());
        }
        state.touch();
        drop(state);
        if let Some(slot) = slot {
            slot.outcome.send_replace(Outcome::Confirmed(server.id.clone()));
        }
        tracing::info!(task_id = %server.id, temp_id = %temp_id, "create confirmed");
        Ok(server)
    }

    fn settle_update(
        &self,
        pending: Pending,
        result: Result<Task, RepositoryError>,
    ) -> Result<Task, EngineError> {
        let server = match result {
            Ok(task) => task,
            Err(e) => return Err(self.roll_back(pending, e)),
        };

        let mut state = self.inner.state.lock();
        if let Some(i) = state.position(&server.id)
            && state.tasks[i] != server
        {
            tracing::debug!(task_id = %server.id, "server record differs from local merge");
            state.tasks[i] = server.clone();
            state.touch();
        }
        tracing::info!(task_id = %server.id, "update confirmed");
        Ok(server)
    }

    fn settle_remove(
        &self,
        pending: Pending,
        result: Result<(), RepositoryError>,
    ) -> Result<(), EngineError> {
        if let Err(e) = result {
            return Err(self.roll_back(pending, e));
        }

        let id = pending.id();
        let mut state = self.inner.state.lock();
        if let Some(i) = state.position(id) {
            // A listing raced in before the delete landed.
            state.tasks.remove(i);
            state.touch();
        }
        tracing::info!(task_id = %id, "delete confirmed");
        Ok(())
    }

    /// Undoes a failed mutation and returns the error to report.
    fn roll_back(&self, pending: Pending, source: RepositoryError) -> EngineError {
        let mut state = self.inner.state.lock();
        let id = pending.id().clone();

        if state.generation == pending.generation {
            state.tasks = pending.snapshot;
            state.provisional = pending.provisional;
            tracing::warn!(
                task_id = %id,
                op = %pending.op,
                error = %source,
                "mutation failed, snapshot restored"
            );
        } else {
            match pending.target {
                Target::Created { temp_id } => {
                    state.provisional.remove(&temp_id);
                    if let Some(i) = state.position(&temp_id) {
                        state.tasks.remove(i);
                    }
                }
                Target::Updated { id, previous } => {
                    if let Some(i) = state.position(&id) {
                        state.tasks[i] = previous;
                    }
                }
                Target::Removed { previous, index } => {
                    if state.position(&previous.id).is_none() {
                        let index = index.min(state.tasks.len());
                        state.tasks.insert(index, previous);
                    }
                }
            }
            tracing::warn!(
                task_id = %id,
                op = %pending.op,
                error = %source,
                "mutation failed, owned record restored"
            );
        }
        state.touch();

        EngineError::MutationFailed {
            op: pending.op,
            id,
            source,
        }
    }
}
