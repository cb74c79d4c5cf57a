use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::awards::awards_model::AwardRecord;

/// Bounded ordered set of achievement ids that have already been announced
/// for a subject. The cap bounds storage while tolerating pagination overlap
/// in the upstream API; once it is exceeded, the oldest ids are evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncedIdLog {
    ids: VecDeque<u64>,
}

impl AnnouncedIdLog {
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Record an id. Returns true when the id was newly recorded, false
    /// when it was already present.
    pub fn record(&mut self, id: u64, cap: usize) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push_back(id);
        while self.ids.len() > cap {
            self.ids.pop_front();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Persisted per-subject state: award records keyed by challenge period and
/// the announced-id log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub subject_key: String,
    /// Period key (`YYYY-MM`) to award record.
    pub award_records: HashMap<String, AwardRecord>,
    pub announced_log: AnnouncedIdLog,
}

impl SubjectProfile {
    pub fn new(subject_key: impl Into<String>) -> Self {
        Self {
            subject_key: subject_key.into(),
            award_records: HashMap::new(),
            announced_log: AnnouncedIdLog::default(),
        }
    }
}
