//! Linear undo/redo history.
//!
//! Records `[0, cursor)` are in effect, records `[cursor, len)` have been
//! undone. Undo walks the cursor left reverting one record at a time, redo
//! walks it right re-applying them.

use splice_core::{HistoryConfig, Result, SpliceError};
use tracing::debug;
use uuid::Uuid;

use crate::action::{Action, ActionRecord};
use crate::context::EditContext;

/// Undo/redo history bound to one edit context.
#[derive(Debug)]
pub struct ActionHistory {
    /// Identity of the context the records were captured against.
    context_id: Uuid,
    records: Vec<ActionRecord>,
    cursor: usize,
    /// Cursor position matching the last saved state.
    clean: Option<usize>,
    config: HistoryConfig,
}

impl ActionHistory {
    /// Create a history for `ctx` with default settings.
    pub fn new<C: EditContext + ?Sized>(ctx: &C) -> Self {
        Self::with_config(ctx, HistoryConfig::default())
    }

    pub fn with_config<C: EditContext + ?Sized>(ctx: &C, config: HistoryConfig) -> Self {
        Self {
            context_id: ctx.context_id(),
            records: Vec::new(),
            cursor: 0,
            clean: Some(0),
            config,
        }
    }

    fn check_context<C: EditContext + ?Sized>(&self, ctx: &C) -> Result<()> {
        let found = ctx.context_id();
        if found != self.context_id {
            return Err(SpliceError::ContextMismatch {
                expected: self.context_id,
                found,
            });
        }
        Ok(())
    }

    /// Record an edit. Any undone records are discarded first. Records made
    /// with [`ActionRecord::forward`] are applied here; records made with
    /// [`ActionRecord::already_applied`] are only recorded.
    pub fn push<C: EditContext + ?Sized>(
        &mut self,
        mut record: ActionRecord,
        ctx: &mut C,
    ) -> Result<()> {
        self.check_context(ctx)?;
        self.discard_undone();

        if !record.is_applied() {
            record.apply(ctx);
        }

        if self.merge_into_last(&record) {
            return Ok(());
        }

        debug!(label = record.label(), index = self.cursor, "Recorded edit");
        self.records.push(record);
        self.cursor += 1;
        self.evict_overflow();
        Ok(())
    }

    /// Apply `action` now and record it.
    pub fn execute<C: EditContext + ?Sized>(&mut self, action: Action, ctx: &mut C) -> Result<()> {
        self.push(ActionRecord::forward(action), ctx)
    }

    /// Record an `action` the caller has already performed.
    pub fn record<C: EditContext + ?Sized>(&mut self, action: Action, ctx: &mut C) -> Result<()> {
        self.push(ActionRecord::already_applied(action), ctx)
    }

    /// Revert the record before the cursor. Returns false at the start of the
    /// history.
    pub fn undo<C: EditContext + ?Sized>(&mut self, ctx: &mut C) -> Result<bool> {
        self.check_context(ctx)?;
        if self.cursor == 0 {
            return Ok(false);
        }
        self.cursor -= 1;
        let record = &mut self.records[self.cursor];
        record.revert(ctx);
        debug!(label = record.label(), cursor = self.cursor, "Undo");
        Ok(true)
    }

    /// Re-apply the record at the cursor. Returns false at the end of the
    /// history.
    pub fn redo<C: EditContext + ?Sized>(&mut self, ctx: &mut C) -> Result<bool> {
        self.check_context(ctx)?;
        let Some(record) = self.records.get_mut(self.cursor) else {
            return Ok(false);
        };
        record.apply(ctx);
        debug!(label = record.label(), cursor = self.cursor + 1, "Redo");
        self.cursor += 1;
        Ok(true)
    }

    fn discard_undone(&mut self) {
        if self.cursor == self.records.len() {
            return;
        }
        debug!(
            discarded = self.records.len() - self.cursor,
            "Discarding undone edits"
        );
        self.records.truncate(self.cursor);
        if self.clean.is_some_and(|clean| clean > self.cursor) {
            self.clean = None;
        }
    }

    /// Coalesce `record` into the record before the cursor. The saved state
    /// is never merged into, so `is_clean` keeps meaning what was saved.
    fn merge_into_last(&mut self, record: &ActionRecord) -> bool {
        if self.clean == Some(self.cursor) {
            return false;
        }
        let window = self.config.merge_window();
        let Some(last) = self.records.last_mut() else {
            return false;
        };
        if !last.try_merge(record, window) {
            return false;
        }
        debug!(label = last.label(), "Merged edit into previous record");
        if last.action().is_noop() {
            // the edits cancelled out; the record before is current again
            self.records.pop();
            self.cursor -= 1;
        }
        true
    }

    fn evict_overflow(&mut self) {
        let overflow = self.records.len().saturating_sub(self.config.max_depth);
        if overflow == 0 {
            return;
        }
        self.records.drain(..overflow);
        self.cursor -= overflow;
        self.clean = self.clean.and_then(|clean| clean.checked_sub(overflow));
    }

    /// Mark the current state as saved.
    pub fn set_clean(&mut self) {
        self.clean = Some(self.cursor);
    }

    /// Whether the current state is the saved one.
    pub fn is_clean(&self) -> bool {
        self.clean == Some(self.cursor)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.records.len()
    }

    /// Label of the record `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .map(|index| self.records[index].label())
    }

    /// Label of the record `redo` would apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.records.get(self.cursor).map(ActionRecord::label)
    }

    /// Labels of all records, oldest first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(ActionRecord::label)
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    /// Number of records in effect.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn context_id(&self) -> Uuid {
        self.context_id
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Drop every record without touching the context. The current state
    /// stays clean if it was.
    pub fn clear(&mut self) {
        let was_clean = self.is_clean();
        self.records.clear();
        self.cursor = 0;
        self.clean = was_clean.then_some(0);
    }
}
