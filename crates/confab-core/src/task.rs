//! Task lifecycle bookkeeping for async effects.
//!
//! The reducer allocates a `TaskId` for every effect it emits and marks it
//! started; the matching completion event finishes it. The runtime uses this
//! to know when all in-flight work has settled.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    DirectoryRefresh,
    HistoryLoad,
    Send,
    Delete,
}

/// In-flight tasks of one kind.
///
/// Several tasks of a kind may overlap (e.g. rapid session switches); each is
/// tracked until its completion arrives, stale or not.
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    active: Vec<TaskId>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    pub fn on_started(&mut self, id: TaskId) {
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    /// Marks `id` finished. Returns false if it was not in flight.
    pub fn finish(&mut self, id: TaskId) -> bool {
        let before = self.active.len();
        self.active.retain(|active| *active != id);
        self.active.len() != before
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub directory_refresh: TaskState,
    pub history_load: TaskState,
    pub send: TaskState,
    pub delete: TaskState,
}

impl Tasks {
    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        match kind {
            TaskKind::DirectoryRefresh => &mut self.directory_refresh,
            TaskKind::HistoryLoad => &mut self.history_load,
            TaskKind::Send => &mut self.send,
            TaskKind::Delete => &mut self.delete,
        }
    }

    pub fn is_any_running(&self) -> bool {
        self.directory_refresh.is_running()
            || self.history_load.is_running()
            || self.send.is_running()
            || self.delete.is_running()
    }
}
