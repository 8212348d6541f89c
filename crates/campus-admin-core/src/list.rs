//! Per-view local cache and view state machine
//!
//! Invalidation rule: a local mutation is authoritative until the next full
//! refetch. There is no partial reconciliation with the backend.
//!
//! The collection phase covers loading only. Deletes and toggles run per row
//! and never block writes on sibling rows.

use crate::{
    Error, Result,
    record::{Record, RecordId},
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Phase of a list, detail or form view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewPhase {
    /// Initial fetch in flight
    #[default]
    Loading,
    /// Data on screen
    Ready,
    /// Initial fetch failed; the message is shown with a retry action
    ErrorShown(String),
    /// Form submission in flight
    Submitting,
    /// Delete in flight
    Deleting,
}

/// Input to the view state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A full fetch started
    Reload,
    /// The fetch succeeded
    Loaded,
    /// The fetch failed
    Failed(String),
    /// A form was submitted
    BeginSubmit,
    /// A delete was confirmed
    BeginDelete,
    /// The write finished, successfully or not
    Finished,
}

impl ViewPhase {
    /// Next phase, or `None` if the event is not valid here
    pub fn next(&self, event: &PhaseEvent) -> Option<Self> {
        match (self, event) {
            (_, PhaseEvent::Reload) => Some(Self::Loading),
            (Self::Loading, PhaseEvent::Loaded) => Some(Self::Ready),
            (Self::Loading, PhaseEvent::Failed(message)) => {
                Some(Self::ErrorShown(message.clone()))
            }
            (Self::Ready, PhaseEvent::BeginSubmit) => Some(Self::Submitting),
            (Self::Ready, PhaseEvent::BeginDelete) => Some(Self::Deleting),
            (Self::Submitting | Self::Deleting, PhaseEvent::Finished) => Some(Self::Ready),
            _ => None,
        }
    }

    /// Whether a write is in flight
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Submitting | Self::Deleting)
    }
}

impl PhaseEvent {
    const fn is_row_write(&self) -> bool {
        matches!(self, Self::BeginSubmit | Self::BeginDelete | Self::Finished)
    }
}

/// Handle for one in-flight row write, returned by [`LocalCollection::begin_write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteTicket(u64);

#[derive(Debug, Clone)]
struct PendingWrite {
    ticket: WriteTicket,
    id: RecordId,
    phase: ViewPhase,
}

/// Last fetched collection of one entity, plus its view phase
#[derive(Debug, Clone, Default)]
pub struct LocalCollection {
    records: Vec<Record>,
    phase: ViewPhase,
    fetched_at: Option<DateTime<Utc>>,
    pending: Vec<PendingWrite>,
    next_ticket: u64,
}

impl LocalCollection {
    /// Empty collection waiting for its first fetch
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    pub const fn phase(&self) -> &ViewPhase {
        &self.phase
    }

    /// Cached records in backend order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// When the last full fetch completed
    pub const fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Whether a full fetch has completed at least once
    pub const fn is_loaded(&self) -> bool {
        self.fetched_at.is_some()
    }

    /// Apply a load event to the collection phase
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not valid in the current phase, or
    /// is a row write, which goes through [`Self::begin_write`].
    pub fn transition(&mut self, event: &PhaseEvent) -> Result<()> {
        if event.is_row_write() {
            return Err(Error::Other(format!(
                "{event:?} applies to a row, not the whole list"
            )));
        }
        let next = self.phase.next(event).ok_or_else(|| {
            Error::Other(format!("invalid view transition {event:?} from {:?}", self.phase))
        })?;
        debug!(from = ?self.phase, to = ?next, "view phase transition");
        self.phase = next;
        Ok(())
    }

    /// Start a full refetch
    pub fn begin_load(&mut self) {
        self.phase = ViewPhase::Loading;
    }

    /// Replace everything with a fresh fetch
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
        self.fetched_at = Some(Utc::now());
        self.phase = ViewPhase::Ready;
    }

    /// Record a failed fetch; the cached rows are dropped
    pub fn fail(&mut self, message: impl Into<String>) {
        self.records.clear();
        self.fetched_at = None;
        self.phase = ViewPhase::ErrorShown(message.into());
    }

    /// Find a record by the id taken from a URL
    pub fn find(&self, raw_id: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.id().is_some_and(|id| id.matches(raw_id)))
    }

    /// Remove a record by identity after a successful delete
    pub fn remove_by_id(&mut self, id: &RecordId) -> Option<Record> {
        let index = self
            .records
            .iter()
            .position(|r| r.id().as_ref() == Some(id))?;
        Some(self.records.remove(index))
    }

    /// Replace a record with the backend's returned version, matched by id
    ///
    /// Returns false if no cached record has that id.
    pub fn replace_record(&mut self, record: Record) -> bool {
        let Some(id) = record.id() else {
            return false;
        };
        match self.records.iter_mut().find(|r| r.id().as_ref() == Some(&id)) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Mark a write on one row as in flight
    ///
    /// Writes on other rows, and further writes on the same row, are not
    /// blocked. Every ticket must be passed to [`Self::finish_write`].
    ///
    /// # Errors
    ///
    /// Returns an error if `event` does not start a write.
    pub fn begin_write(&mut self, id: RecordId, event: &PhaseEvent) -> Result<WriteTicket> {
        let phase = ViewPhase::Ready
            .next(event)
            .filter(ViewPhase::is_busy)
            .ok_or_else(|| Error::Other(format!("{event:?} does not start a write")))?;

        let ticket = WriteTicket(self.next_ticket);
        self.next_ticket += 1;
        debug!(%id, ?phase, "row write started");
        self.pending.push(PendingWrite { ticket, id, phase });
        Ok(ticket)
    }

    /// Mark a row write as finished, successfully or not
    ///
    /// Returns false if the ticket was already finished.
    pub fn finish_write(&mut self, ticket: WriteTicket) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.ticket != ticket);
        before != self.pending.len()
    }

    /// Phase of one row: its latest in-flight write, else `Ready`
    pub fn row_phase(&self, id: &RecordId) -> ViewPhase {
        self.pending
            .iter()
            .rev()
            .find(|p| &p.id == id)
            .map_or(ViewPhase::Ready, |p| p.phase.clone())
    }

    /// Number of row writes in flight
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Mutable access to one cached record
    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id().as_ref() == Some(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rows() -> Vec<Record> {
        (1..=3)
            .map(|i| Record::from_value(json!({"id": i, "name": format!("row {i}")})).unwrap())
            .collect()
    }

    #[test]
    fn test_load_then_ready() {
        let mut list = LocalCollection::new();
        assert_eq!(list.phase(), &ViewPhase::Loading);
        assert!(!list.is_loaded());

        list.replace_all(rows());
        assert_eq!(list.phase(), &ViewPhase::Ready);
        assert_eq!(list.records().len(), 3);
        assert!(list.fetched_at().is_some());
    }

    #[test]
    fn test_remove_by_id_is_local() {
        let mut list = LocalCollection::new();
        list.replace_all(rows());

        let removed = list.remove_by_id(&RecordId::Num(2)).unwrap();
        assert_eq!(removed.text("name"), "row 2");
        assert_eq!(list.records().len(), 2);
        assert!(list.find("2").is_none());
        assert!(list.remove_by_id(&RecordId::Num(2)).is_none());
    }

    #[test]
    fn test_refetch_replaces_local_mutations() {
        let mut list = LocalCollection::new();
        list.replace_all(rows());
        list.remove_by_id(&RecordId::Num(1));

        list.begin_load();
        list.replace_all(rows());
        assert!(list.find("1").is_some());
    }

    #[test]
    fn test_replace_record() {
        let mut list = LocalCollection::new();
        list.replace_all(rows());

        let updated = Record::from_value(json!({"id": 3, "name": "renamed"})).unwrap();
        assert!(list.replace_record(updated));
        assert_eq!(list.find("3").unwrap().text("name"), "renamed");

        let stranger = Record::from_value(json!({"id": 9})).unwrap();
        assert!(!list.replace_record(stranger));
    }

    #[test]
    fn test_fail_clears_rows() {
        let mut list = LocalCollection::new();
        list.replace_all(rows());
        list.fail("Failed to load");

        assert!(list.records().is_empty());
        assert_eq!(
            list.phase(),
            &ViewPhase::ErrorShown("Failed to load".to_string())
        );
    }

    #[test]
    fn test_phase_machine() {
        let ready = ViewPhase::Ready;
        assert_eq!(ready.next(&PhaseEvent::BeginDelete), Some(ViewPhase::Deleting));
        assert_eq!(ready.next(&PhaseEvent::BeginSubmit), Some(ViewPhase::Submitting));
        assert_eq!(ViewPhase::Deleting.next(&PhaseEvent::Finished), Some(ready));
        assert_eq!(ViewPhase::Loading.next(&PhaseEvent::BeginDelete), None);
    }

    #[test]
    fn test_collection_phase_tracks_loading_only() {
        let mut list = LocalCollection::new();

        assert!(list.transition(&PhaseEvent::BeginDelete).is_err());
        list.transition(&PhaseEvent::Loaded).unwrap();
        assert!(list.transition(&PhaseEvent::BeginDelete).is_err());
        assert_eq!(list.phase(), &ViewPhase::Ready);

        list.transition(&PhaseEvent::Reload).unwrap();
        list.transition(&PhaseEvent::Failed("boom".into())).unwrap();
        assert_eq!(list.phase(), &ViewPhase::ErrorShown("boom".into()));
        assert!(list.transition(&PhaseEvent::Loaded).is_err());
    }

    #[test]
    fn test_sibling_row_writes_overlap() {
        let mut list = LocalCollection::new();
        list.replace_all(rows());

        let first = list.begin_write(RecordId::Num(1), &PhaseEvent::BeginDelete).unwrap();
        let second = list.begin_write(RecordId::Num(2), &PhaseEvent::BeginSubmit).unwrap();

        assert_eq!(list.row_phase(&RecordId::Num(1)), ViewPhase::Deleting);
        assert_eq!(list.row_phase(&RecordId::Num(2)), ViewPhase::Submitting);
        assert_eq!(list.row_phase(&RecordId::Num(3)), ViewPhase::Ready);
        assert_eq!(list.phase(), &ViewPhase::Ready);

        assert!(list.finish_write(first));
        assert!(!list.finish_write(first));
        assert_eq!(list.row_phase(&RecordId::Num(1)), ViewPhase::Ready);
        assert_eq!(list.pending_writes(), 1);

        assert!(list.finish_write(second));
        assert_eq!(list.pending_writes(), 0);
    }

    #[test]
    fn test_begin_write_rejects_load_events() {
        let mut list = LocalCollection::new();
        assert!(list.begin_write(RecordId::Num(1), &PhaseEvent::Loaded).is_err());
        assert!(list.begin_write(RecordId::Num(1), &PhaseEvent::Finished).is_err());
        assert_eq!(list.pending_writes(), 0);
    }
}
