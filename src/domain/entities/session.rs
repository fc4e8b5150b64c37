use std::slice;

use chrono::{DateTime, Duration, Utc};

use crate::{entities::image::ImageRecord, errors::SessionError};

/// Uploaded images of one studio session, in upload order, plus the
/// currently selected one.
///
/// The selection always points at an existing record or is empty.
#[derive(Debug, Default)]
pub struct UploadSession {
    records: Vec<ImageRecord>,
    selected: Option<String>,
    generation: u64,
    last_uploaded_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds records in the given order and returns how many were added.
    /// Records whose id is already present are skipped.
    pub fn append(&mut self, records: Vec<ImageRecord>) -> usize {
        let mut added = 0;
        let mut first_new: Option<String> = None;

        for mut record in records {
            if self.contains(&record.id) {
                tracing::warn!(record_id = %record.id, "Skipping duplicate upload");
                continue;
            }

            record.uploaded_at = self.next_timestamp(record.uploaded_at);
            if first_new.is_none() {
                first_new = Some(record.id.clone());
            }

            self.records.push(record);
            added += 1;
        }

        if self.selected.is_none() {
            self.selected = first_new;
        }

        added
    }

    /// Removes a record. Returns `false` when the id was not present.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(position) = self.records.iter().position(|r| r.id == id) else {
            return false;
        };

        self.records.remove(position);

        if self.selected.as_deref() == Some(id) {
            self.selected = self.records.first().map(|r| r.id.clone());
        }

        true
    }

    pub fn select(&mut self, id: &str) -> Result<(), SessionError> {
        if !self.contains(id) {
            return Err(SessionError::UnknownRecord(id.to_string()));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Drops every record. In-flight exports notice through `generation`.
    pub fn clear(&mut self) {
        self.records.clear();
        self.selected = None;
        self.generation += 1;
    }

    pub fn list(&self) -> RecordView<'_> {
        RecordView { records: &self.records }
    }

    pub fn selected(&self) -> Option<&ImageRecord> {
        let id = self.selected.as_deref()?;
        self.records.iter().find(|r| r.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn next_timestamp(&mut self, proposed: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = match self.last_uploaded_at {
            Some(last) if proposed <= last => last + Duration::microseconds(1),
            _ => proposed,
        };
        self.last_uploaded_at = Some(stamp);
        stamp
    }
}

/// Read-only view over a session's records. Each call to `iter` starts over.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    records: &'a [ImageRecord],
}

impl<'a> RecordView<'a> {
    pub fn iter(&self) -> slice::Iter<'a, ImageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for RecordView<'a> {
    type Item = &'a ImageRecord;
    type IntoIter = slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            source_url: format!("https://cdn.example.com/{id}.png"),
            original_name: id.to_string(),
            natural_width: None,
            natural_height: None,
            uploaded_at: Utc::now(),
        }
    }

    fn ids(session: &UploadSession) -> Vec<&str> {
        session.list().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn append_to_empty_session_selects_first_new_record() {
        let mut session = UploadSession::new();

        assert_eq!(session.append(vec![record("a")]), 1);
        assert_eq!(session.selected_id(), Some("a"));
    }

    #[test]
    fn append_keeps_existing_selection() {
        let mut session = UploadSession::new();
        session.append(vec![record("a")]);
        session.append(vec![record("b"), record("c")]);

        assert_eq!(session.selected_id(), Some("a"));
        assert_eq!(ids(&session), ["a", "b", "c"]);
    }

    #[test]
    fn append_batch_selects_first_of_batch() {
        let mut session = UploadSession::new();
        session.append(vec![record("x"), record("y")]);

        assert_eq!(session.selected_id(), Some("x"));
    }

    #[test]
    fn append_skips_duplicate_ids() {
        let mut session = UploadSession::new();
        session.append(vec![record("a")]);

        assert_eq!(session.append(vec![record("a"), record("b"), record("b")]), 1);
        assert_eq!(ids(&session), ["a", "b"]);
    }

    #[test]
    fn upload_timestamps_strictly_increase() {
        let mut session = UploadSession::new();
        let stamp = Utc::now();
        let mut first = record("a");
        first.uploaded_at = stamp;
        let mut second = record("b");
        second.uploaded_at = stamp - Duration::seconds(5);

        session.append(vec![first, second]);

        let stamps: Vec<_> = session.list().iter().map(|r| r.uploaded_at).collect();
        assert!(stamps[0] < stamps[1]);
    }

    #[test]
    fn removing_selected_moves_selection_to_remaining_record() {
        let mut session = UploadSession::new();
        session.append(vec![record("a"), record("b")]);

        assert!(session.remove("a"));
        assert_eq!(session.selected_id(), Some("b"));

        assert!(session.remove("b"));
        assert_eq!(session.selected_id(), None);
        assert!(session.is_empty());
    }

    #[test]
    fn removing_selected_picks_first_remaining_in_order() {
        let mut session = UploadSession::new();
        session.append(vec![record("a"), record("b"), record("c")]);
        session.select("b").unwrap();

        session.remove("b");
        assert_eq!(session.selected_id(), Some("a"));
    }

    #[test]
    fn removing_unselected_keeps_selection() {
        let mut session = UploadSession::new();
        session.append(vec![record("a"), record("b")]);

        session.remove("b");
        assert_eq!(session.selected_id(), Some("a"));
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let mut session = UploadSession::new();
        session.append(vec![record("a"), record("b")]);
        session.select("b").unwrap();

        assert!(!session.remove("missing"));
        assert_eq!(session.len(), 2);
        assert_eq!(session.selected_id(), Some("b"));
    }

    #[test]
    fn select_unknown_record_fails() {
        let mut session = UploadSession::new();
        session.append(vec![record("a")]);

        assert_eq!(
            session.select("nope"),
            Err(SessionError::UnknownRecord("nope".into()))
        );
        assert_eq!(session.selected_id(), Some("a"));
    }

    #[test]
    fn list_is_restartable() {
        let mut session = UploadSession::new();
        session.append(vec![record("a"), record("b")]);

        let view = session.list();
        assert_eq!(view.iter().count(), 2);
        assert_eq!(view.iter().count(), 2);
        assert_eq!(view.into_iter().next().map(|r| r.id.as_str()), Some("a"));
    }

    #[test]
    fn clear_bumps_generation() {
        let mut session = UploadSession::new();
        session.append(vec![record("a")]);
        let before = session.generation();

        session.clear();

        assert!(session.is_empty());
        assert_eq!(session.selected(), None);
        assert_eq!(session.generation(), before + 1);
    }
}
