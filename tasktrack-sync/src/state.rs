/// Synchronized collections
///
/// [`SyncState`] is the value every view renders from. All changes to it are
/// expressed as transforms keyed by entity id and applied to whatever state is
/// current when they run, never as a replacement of a snapshot captured
/// earlier. That is what lets several intents be in flight at once and still
/// converge regardless of the order their responses arrive in.
///
/// # Pending mutations
///
/// Optimistic completions and deletions are recorded as pending until their
/// remote call resolves. When a refresh replaces the task list with fresh
/// server data, pending mutations are re-applied on top of it so an in-flight
/// change is not visually undone by a racing refresh.
///
/// A refresh may also land after a mutation it did not see has already been
/// confirmed. Each refresh therefore takes a [`RefreshTicket`] before it
/// fetches, and confirmed mutations are logged while any refresh is in
/// flight; a list fetched under an older ticket gets them re-applied too.
///
/// ```text
/// complete(1) ──optimistic──> [pending: Complete(1)] ──response──> confirm / reject
///                                    │                                 │
/// refresh ──ticket──fetch──replace_tasks──> fresh list + pending + confirmed since ticket
/// ```
///
/// # Ordering
///
/// The task list keeps server order. A rejected delete puts the task back
/// after the nearest task that preceded it in server order and is still
/// present, so overlapping rollbacks restore the original order whichever
/// resolves first.

use std::collections::BTreeMap;
use tasktrack_shared::models::tracking::merge_history;
use tasktrack_shared::models::{Category, EntityId, Task, TaskStatus, TrackingEntry};

/// Kind of optimistic mutation awaiting its remote result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Complete,
    Delete,
}

/// Handle of a registered pending mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PendingId(u64);

/// Position in the stream of confirmed mutations, taken when a refresh starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingMutation {
    task_id: EntityId,
    kind: PendingKind,
    /// Status before the first completion still in flight; completions only
    base: Option<TaskStatus>,
}

/// A confirmed mutation some in-flight refresh may not have seen
#[derive(Debug, Clone)]
struct Confirmed {
    generation: u64,
    task_id: EntityId,
    kind: PendingKind,
}

/// Tasks, categories and history as currently known to the client
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    /// Tasks in server order
    pub tasks: Vec<Task>,

    /// Categories in server order
    pub categories: Vec<Category>,

    /// Status-change history, newest first
    pub history: Vec<TrackingEntry>,

    /// Task whose server history is fetched on refresh
    pub selected_task: Option<EntityId>,

    pending: BTreeMap<PendingId, PendingMutation>,
    next_pending: u64,

    /// Server order of task ids, including optimistically removed ones
    order: Vec<EntityId>,

    generation: u64,
    refreshes: Vec<RefreshTicket>,
    confirmed: Vec<Confirmed>,
}

impl PartialEq for SyncState {
    fn eq(&self, other: &Self) -> bool {
        // Bookkeeping is never compared, only what it stands for.
        self.tasks == other.tasks
            && self.categories == other.categories
            && self.history == other.history
            && self.selected_task == other.selected_task
            && self.pending.values().eq(other.pending.values())
    }
}

impl Eq for SyncState {}

impl SyncState {
    /// Finds a task by id
    pub fn task(&self, id: &EntityId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Position of a task in the list
    pub fn task_index(&self, id: &EntityId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Finds a category by id
    pub fn category(&self, id: &EntityId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Checks if any optimistic mutation of `id` is still in flight
    pub fn has_pending(&self, id: &EntityId) -> bool {
        self.pending.values().any(|p| &p.task_id == id)
    }

    /// Number of mutations still in flight
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn pending_of(&self, id: &EntityId, kind: PendingKind) -> Option<&PendingMutation> {
        self.pending
            .values()
            .find(|p| p.kind == kind && &p.task_id == id)
    }

    fn register(&mut self, task_id: EntityId, kind: PendingKind, base: Option<TaskStatus>) -> PendingId {
        let id = PendingId(self.next_pending);
        self.next_pending += 1;
        self.pending.insert(id, PendingMutation { task_id, kind, base });
        id
    }

    /// Optimistically completes a task
    ///
    /// Returns the task as it was and the pending handle. When another
    /// completion of the same task is already in flight, the new one shares
    /// its base status instead of capturing the optimistic `Completed`.
    pub fn begin_complete(&mut self, id: &EntityId) -> Option<(Task, PendingId)> {
        let task = self.task(id)?.clone();
        let base = self
            .pending_of(id, PendingKind::Complete)
            .and_then(|p| p.base)
            .unwrap_or(task.status);
        self.set_status(id, TaskStatus::Completed);
        let pending = self.register(id.clone(), PendingKind::Complete, Some(base));
        Some((task, pending))
    }

    /// Settles a completion the server accepted
    ///
    /// Returns the status the task had before it was completed. Other
    /// completions of the task still in flight now start from `Completed`,
    /// so the transition is recorded once.
    pub fn confirm_complete(&mut self, pending: PendingId) -> Option<TaskStatus> {
        let mutation = self.pending.remove(&pending)?;
        for other in self.pending.values_mut() {
            if other.kind == PendingKind::Complete && other.task_id == mutation.task_id {
                other.base = Some(TaskStatus::Completed);
            }
        }
        self.set_status(&mutation.task_id, TaskStatus::Completed);
        self.record_confirmed(mutation.task_id, PendingKind::Complete);
        mutation.base
    }

    /// Settles a completion the server rejected
    ///
    /// Restores the base status and returns it, unless another completion of
    /// the task is still in flight; that one keeps the optimistic status and
    /// will settle it.
    pub fn reject_complete(&mut self, pending: PendingId) -> Option<TaskStatus> {
        let mutation = self.pending.remove(&pending)?;
        if self.pending_of(&mutation.task_id, PendingKind::Complete).is_some() {
            return None;
        }
        let base = mutation.base?;
        self.set_status(&mutation.task_id, base);
        Some(base)
    }

    /// Optimistically removes a task
    ///
    /// Returns the index it had, the task, and the pending handle.
    pub fn begin_delete(&mut self, id: &EntityId) -> Option<(usize, Task, PendingId)> {
        let (index, task) = self.remove_task(id)?;
        let pending = self.register(id.clone(), PendingKind::Delete, None);
        Some((index, task, pending))
    }

    /// Settles a deletion the server accepted
    pub fn confirm_delete(&mut self, pending: PendingId) {
        let Some(mutation) = self.pending.remove(&pending) else {
            return;
        };
        self.tasks.retain(|t| t.id != mutation.task_id);
        self.order.retain(|id| id != &mutation.task_id);
        self.record_confirmed(mutation.task_id, PendingKind::Delete);
    }

    /// Settles a deletion the server rejected, putting the task back
    pub fn reject_delete(&mut self, pending: PendingId, index: usize, task: Task) -> bool {
        self.pending.remove(&pending);
        self.restore_task(index, task)
    }

    /// Sets the status of a task, if it is present
    ///
    /// Returns the status it had before.
    pub fn set_status(&mut self, id: &EntityId, status: TaskStatus) -> Option<TaskStatus> {
        let task = self.tasks.iter_mut().find(|t| &t.id == id)?;
        let previous = task.status;
        task.status = status;
        Some(previous)
    }

    /// Removes a task, returning it with the index it had
    pub fn remove_task(&mut self, id: &EntityId) -> Option<(usize, Task)> {
        let index = self.task_index(id)?;
        Some((index, self.tasks.remove(index)))
    }

    /// Puts a task back where it belongs, unless it is present again
    ///
    /// The task goes right after the nearest task preceding it in server
    /// order that is still listed. A task with no known server position goes
    /// to `index`, clamped to the list.
    pub fn restore_task(&mut self, index: usize, task: Task) -> bool {
        if self.task_index(&task.id).is_some() {
            return false;
        }
        let index = match self.order.iter().position(|id| id == &task.id) {
            Some(rank) => self.order[..rank]
                .iter()
                .rev()
                .find_map(|id| self.task_index(id))
                .map_or(0, |i| i + 1),
            None => index.min(self.tasks.len()),
        };
        self.tasks.insert(index, task);
        true
    }

    /// Replaces the task with the same id, or appends it
    pub fn upsert_task(&mut self, task: Task) {
        if !self.order.contains(&task.id) {
            self.order.push(task.id.clone());
        }
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Replaces the category with the same id, or appends it
    pub fn upsert_category(&mut self, category: Category) {
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
    }

    /// Registers a refresh about to fetch
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        let ticket = RefreshTicket(self.generation);
        self.refreshes.push(ticket);
        ticket
    }

    /// Forgets a refresh, whether or not its task list arrived
    pub fn end_refresh(&mut self, ticket: RefreshTicket) {
        if let Some(i) = self.refreshes.iter().position(|t| *t == ticket) {
            self.refreshes.swap_remove(i);
        }
        match self.refreshes.iter().min() {
            Some(oldest) => {
                let oldest = oldest.0;
                self.confirmed.retain(|c| c.generation > oldest);
            }
            None => self.confirmed.clear(),
        }
    }

    fn record_confirmed(&mut self, task_id: EntityId, kind: PendingKind) {
        self.generation += 1;
        if !self.refreshes.is_empty() {
            self.confirmed.push(Confirmed {
                generation: self.generation,
                task_id,
                kind,
            });
        }
    }

    fn reapply(&mut self, task_id: &EntityId, kind: PendingKind) {
        match kind {
            PendingKind::Complete => {
                self.set_status(task_id, TaskStatus::Completed);
            }
            PendingKind::Delete => {
                self.tasks.retain(|t| &t.id != task_id);
            }
        }
    }

    /// Replaces the task list with a list fetched under `ticket`
    ///
    /// Mutations confirmed after the ticket was taken are re-applied first,
    /// then pending mutations in registration order.
    pub fn replace_tasks(&mut self, fresh: Vec<Task>, ticket: RefreshTicket) {
        self.order = fresh.iter().map(|t| t.id.clone()).collect();
        self.tasks = fresh;

        let missed: Vec<(EntityId, PendingKind)> = self
            .confirmed
            .iter()
            .filter(|c| c.generation > ticket.0)
            .map(|c| (c.task_id.clone(), c.kind))
            .collect();
        for (task_id, kind) in missed {
            if kind == PendingKind::Delete {
                self.order.retain(|id| id != &task_id);
            }
            self.reapply(&task_id, kind);
        }

        let pending: Vec<(EntityId, PendingKind)> = self
            .pending
            .values()
            .map(|p| (p.task_id.clone(), p.kind))
            .collect();
        for (task_id, kind) in pending {
            self.reapply(&task_id, kind);
        }
    }

    /// Replaces the category list with fresh server data
    pub fn replace_categories(&mut self, fresh: Vec<Category>) {
        self.categories = fresh;
    }

    /// Merges entries into the history; never removes any
    pub fn merge_history<I>(&mut self, incoming: I) -> usize
    where
        I: IntoIterator<Item = TrackingEntry>,
    {
        merge_history(&mut self.history, incoming)
    }

    /// Empties the history; the one operation allowed to shrink it
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
