/// Frame-scoped command list pool.
///
/// One pool per GPU queue kind (graphics, compute, transfer), all three
/// sharing a single handle namespace: the handle's 8-bit secondary
/// field is the [`QueueKind`] tag that routes it to the right pool, and
/// the 24-bit index addresses the row inside that pool. This is the
/// type-tag flavor of the packed handle. No generations, because
/// command lists never outlive the frame: `reset_frame` retires every
/// handle at once and the next frame reuses the slots from index zero.
///
/// Composes [`IndexAllocator`] and [`ColumnStore`] directly rather than
/// going through [`SlotPool`](crate::utils::SlotPool), since the
/// generation column would be dead weight here.

use crate::error::Result;
use crate::utils::{ColumnStore, Handle, IndexAllocator};
use crate::{engine_bail, engine_trace};

// ===== QUEUE KINDS =====

/// GPU queue a command list records for.
///
/// Also the handle tag: one `CommandListHandle` namespace spans all
/// three per-queue pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QueueKind {
    Graphics = 0,
    Compute = 1,
    Transfer = 2,
}

impl QueueKind {
    const COUNT: usize = 3;

    fn from_tag(tag: u32) -> Option<QueueKind> {
        match tag {
            0 => Some(QueueKind::Graphics),
            1 => Some(QueueKind::Compute),
            2 => Some(QueueKind::Transfer),
            _ => None,
        }
    }
}

// ===== LIST STATE =====

/// Recording state of one command list slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListState {
    /// Slot is unused this frame
    #[default]
    Idle,
    /// Between begin_list and submit_list
    Recording,
    /// Submitted, awaiting reset_frame
    Submitted,
}

// ===== POOL =====

/// Handle to a command list: 24-bit index, 8-bit queue tag
pub type CommandListHandle = Handle<24>;

/// Column layout per queue: (state, recorded command count, debug label)
type ListColumns = (ListState, u32, String);

const COL_STATE: usize = 0;
const COL_COMMANDS: usize = 1;
const COL_LABEL: usize = 2;

/// One queue's slots
struct QueuePool {
    indices: IndexAllocator,
    store: ColumnStore<ListColumns>,
}

impl QueuePool {
    fn new() -> Self {
        Self {
            indices: IndexAllocator::new(),
            store: ColumnStore::new(),
        }
    }
}

/// Pools of per-queue command lists addressed by [`CommandListHandle`]
pub struct CommandListPool {
    queues: [QueuePool; QueueKind::COUNT],
}

impl CommandListPool {
    /// Create empty pools for all queue kinds
    pub fn new() -> Self {
        Self {
            queues: [QueuePool::new(), QueuePool::new(), QueuePool::new()],
        }
    }

    /// Which queue a handle belongs to, decoded from its tag.
    ///
    /// Returns `None` for a tag no queue uses (a foreign handle).
    pub fn queue_kind(handle: CommandListHandle) -> Option<QueueKind> {
        QueueKind::from_tag(handle.meta())
    }

    /// Start recording a command list on the given queue.
    pub fn begin_list(&mut self, kind: QueueKind, label: &str) -> CommandListHandle {
        let queue = &mut self.queues[kind as usize];
        let (index, _) = queue.indices.allocate();
        // After reset_frame the allocator restarts from zero while the
        // rows survive; only grow the store past its high-water mark.
        if index as usize == queue.store.row_count() {
            queue.store.append_row();
        }
        let row = index as usize;
        queue.store.set::<{ COL_STATE }>(row, ListState::Recording);
        queue.store.set::<{ COL_COMMANDS }>(row, 0);
        queue.store.set::<{ COL_LABEL }>(row, label.to_string());

        let handle = Handle::pack(index, kind as u32);
        engine_trace!(
            "quasar3d::CommandListPool",
            "begin_list {} on {:?} ('{}')",
            handle,
            kind,
            label
        );
        handle
    }

    /// Record one command into a list.
    ///
    /// # Errors
    ///
    /// Returns an error when the handle is foreign or the list is not
    /// recording.
    pub fn record_command(&mut self, handle: CommandListHandle) -> Result<()> {
        let row = self.live_row(handle, "record_command")?;
        let queue = &mut self.queues[handle.meta() as usize];
        if *queue.store.get::<{ COL_STATE }>(row) != ListState::Recording {
            engine_bail!(
                "quasar3d::CommandListPool",
                "record_command on list {} which is not recording",
                handle
            );
        }
        *queue.store.get_mut::<{ COL_COMMANDS }>(row) += 1;
        Ok(())
    }

    /// Close a list and hand it to the queue.
    pub fn submit_list(&mut self, handle: CommandListHandle) -> Result<()> {
        let row = self.live_row(handle, "submit_list")?;
        let queue = &mut self.queues[handle.meta() as usize];
        if *queue.store.get::<{ COL_STATE }>(row) != ListState::Recording {
            engine_bail!(
                "quasar3d::CommandListPool",
                "submit_list on list {} which is not recording",
                handle
            );
        }
        queue.store.set::<{ COL_STATE }>(row, ListState::Submitted);
        Ok(())
    }

    /// A list's current state
    pub fn list_state(&self, handle: CommandListHandle) -> Result<ListState> {
        let row = self.live_row(handle, "list_state")?;
        Ok(*self.queues[handle.meta() as usize].store.get::<{ COL_STATE }>(row))
    }

    /// Commands recorded into a list so far
    pub fn command_count(&self, handle: CommandListHandle) -> Result<u32> {
        let row = self.live_row(handle, "command_count")?;
        Ok(*self.queues[handle.meta() as usize].store.get::<{ COL_COMMANDS }>(row))
    }

    /// A list's debug label
    pub fn list_label(&self, handle: CommandListHandle) -> Result<&str> {
        let row = self.live_row(handle, "list_label")?;
        Ok(self.queues[handle.meta() as usize].store.get::<{ COL_LABEL }>(row))
    }

    /// Lists begun on `kind` this frame and not yet retired
    pub fn live_lists(&self, kind: QueueKind) -> u32 {
        self.queues[kind as usize].indices.len()
    }

    /// Retire every command list of the frame.
    ///
    /// All outstanding handles become invalid; the slots (and their
    /// string allocations) are kept for the next frame.
    pub fn reset_frame(&mut self) {
        for queue in &mut self.queues {
            for row in 0..queue.store.row_count() {
                queue.store.set::<{ COL_STATE }>(row, ListState::Idle);
                queue.store.set::<{ COL_COMMANDS }>(row, 0);
            }
            queue.indices = IndexAllocator::new();
        }
        engine_trace!("quasar3d::CommandListPool", "frame reset");
    }

    /// Resolve a handle to its row, rejecting foreign tags, indices out
    /// of range, and idle (retired) slots.
    fn live_row(&self, handle: CommandListHandle, op: &str) -> Result<usize> {
        let Some(kind) = QueueKind::from_tag(handle.meta()) else {
            engine_bail!(
                "quasar3d::CommandListPool",
                "{} with foreign handle {} (unknown queue tag)",
                op,
                handle
            );
        };
        let queue = &self.queues[kind as usize];
        let row = handle.index() as usize;
        if row >= queue.store.row_count()
            || *queue.store.get::<{ COL_STATE }>(row) == ListState::Idle
        {
            engine_bail!(
                "quasar3d::CommandListPool",
                "{} with retired or unknown handle {}",
                op,
                handle
            );
        }
        Ok(row)
    }
}

impl Default for CommandListPool {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "command_list_pool_tests.rs"]
mod tests;
