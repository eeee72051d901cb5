//! Session-owned record collections
//!
//! Both the analysis store and the project collection are persistent
//! vectors: insertion happens at the front and updates replace a whole
//! record by id, returning a new collection that shares structure with the
//! old one.

use crate::types::{AnalysisId, AnalysisReport, InterventionProject, ProjectId};
use chrono::{DateTime, Duration, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use vayu_catalog::ZoneId;

/// Record addressable by id and scoped to a zone
pub trait Record: Clone {
    /// Identifier type
    type Id: PartialEq;

    /// Record id
    fn id(&self) -> &Self::Id;

    /// Zone the record belongs to
    fn zone_id(&self) -> &ZoneId;
}

impl Record for AnalysisReport {
    type Id = AnalysisId;

    fn id(&self) -> &AnalysisId {
        &self.id
    }

    fn zone_id(&self) -> &ZoneId {
        &self.zone_id
    }
}

impl Record for InterventionProject {
    type Id = ProjectId;

    fn id(&self) -> &ProjectId {
        &self.id
    }

    fn zone_id(&self) -> &ZoneId {
        &self.zone_id
    }
}

/// Newest-first persistent collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore<T: Clone> {
    records: Vector<T>,
}

/// Analysis report store
pub type AnalysisStore = RecordStore<AnalysisReport>;

/// Project collection
pub type ProjectCollection = RecordStore<InterventionProject>;

impl<T: Record> Default for RecordStore<T> {
    fn default() -> Self {
        Self {
            records: Vector::new(),
        }
    }
}

impl<T: Record> FromIterator<T> for RecordStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<T: Record> RecordStore<T> {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New store with `record` in front
    #[must_use]
    pub fn insert_front(&self, record: T) -> Self {
        let mut records = self.records.clone();
        records.push_front(record);
        Self { records }
    }

    /// New store with the record of the same id replaced, or inserted in
    /// front when absent
    #[must_use]
    pub fn upsert(&self, record: T) -> Self {
        match self.position(record.id()) {
            Some(index) => Self {
                records: self.records.update(index, record),
            },
            None => self.insert_front(record),
        }
    }

    /// Look up by id
    #[must_use]
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Whether a record with `id` exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// All records, front first
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.records.iter()
    }

    /// Records of one zone, front first
    pub fn for_zone<'a, 'z>(&'a self, zone: &'z ZoneId) -> impl Iterator<Item = &'a T> + 'z
    where
        'a: 'z,
    {
        self.records.iter().filter(move |r| r.zone_id() == zone)
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AnalysisStore {
    /// Analyses of a zone taken strictly after `now - window_days`, plus
    /// `pinned` whatever its age, newest first
    #[must_use]
    pub fn recent_for_zone(
        &self,
        zone: &ZoneId,
        now: DateTime<Utc>,
        window_days: u32,
        pinned: Option<&AnalysisId>,
    ) -> Vec<&AnalysisReport> {
        let cutoff = now - Duration::days(i64::from(window_days));
        let mut recent: Vec<_> = self
            .for_zone(zone)
            .filter(|a| a.timestamp > cutoff || Some(&a.id) == pinned)
            .collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent
    }

    /// Newest analysis of a zone
    #[must_use]
    pub fn latest_for_zone(&self, zone: &ZoneId) -> Option<&AnalysisReport> {
        self.for_zone(zone).max_by_key(|a| a.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisDraft, Evidence};
    use chrono::TimeZone;

    fn report(zone: &str, day: u32) -> AnalysisReport {
        AnalysisReport::from_draft(
            AnalysisDraft {
                summary: format!("day {day}"),
                recommendation: String::new(),
                causes: vec![],
            },
            ZoneId::new(zone),
            Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            None,
            Evidence::none(),
        )
    }

    #[test]
    fn insert_front_keeps_old_version() {
        let empty = AnalysisStore::new();
        let one = empty.insert_front(report("a", 1));
        let two = one.insert_front(report("a", 2));
        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.iter().next().unwrap().summary, "day 2");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let first = report("a", 1);
        let store = AnalysisStore::new()
            .insert_front(first.clone())
            .insert_front(report("a", 2));
        let mut edited = first.clone();
        edited.summary = "edited".into();
        let updated = store.upsert(edited);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated.iter().nth(1).unwrap().summary, "edited");
        assert_eq!(store.get(&first.id).unwrap().summary, "day 1");
    }

    #[test]
    fn recent_window_and_pin() {
        let old = report("a", 1);
        let fresh = report("a", 28);
        let other_zone = report("b", 29);
        let store: AnalysisStore = [old.clone(), fresh.clone(), other_zone]
            .into_iter()
            .collect();
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let zone = ZoneId::new("a");

        let recent = store.recent_for_zone(&zone, now, 7, None);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, fresh.id);

        let pinned = store.recent_for_zone(&zone, now, 7, Some(&old.id));
        assert_eq!(pinned.iter().map(|a| &a.id).collect::<Vec<_>>(), vec![&fresh.id, &old.id]);
        assert_eq!(store.latest_for_zone(&zone).unwrap().id, fresh.id);
    }

    #[test]
    fn analysis_exactly_at_cutoff_is_stale() {
        let edge = report("a", 24);
        let store = AnalysisStore::new().insert_front(edge.clone());
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let zone = ZoneId::new("a");

        assert!(store.recent_for_zone(&zone, now, 7, None).is_empty());
        assert_eq!(
            store.recent_for_zone(&zone, now - Duration::seconds(1), 7, None).len(),
            1
        );
        assert_eq!(
            store.recent_for_zone(&zone, now, 7, Some(&edge.id))[0].id,
            edge.id
        );
    }
}
