use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{InspectionRecord, InspectionStatus, RecordId, Snapshot};

/// Ids the operator picked for bulk actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `id`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.ids.extend(ids.into_iter().map(str::to_string));
    }

    pub fn deselect_all(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.iter().map(String::as_str)
    }

    /// Forgets ids that are not part of `snapshot`; returns how many went.
    pub fn prune(&mut self, snapshot: &Snapshot) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| snapshot.contains(id));
        before - self.ids.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Matching(String),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim().to_lowercase();
        if token.is_empty() || token == "all" {
            StatusFilter::All
        } else {
            StatusFilter::Matching(token)
        }
    }

    pub fn matches(&self, status: &InspectionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Matching(token) => status.as_str().contains(token.as_str()),
        }
    }
}

/// Status filter and free-text search, ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub status: StatusFilter,
    /// Lower-cased search term; empty matches everything.
    pub search: String,
}

impl QueryFilter {
    pub fn new(status: &str, search: &str) -> Self {
        Self {
            status: StatusFilter::parse(status),
            search: search.trim().to_lowercase(),
        }
    }

    pub fn matches(&self, record: &InspectionRecord) -> bool {
        if !self.status.matches(&record.status) {
            return false;
        }
        self.search.is_empty()
            || record.press.to_lowercase().contains(&self.search)
            || record.part_number.to_lowercase().contains(&self.search)
    }

    pub fn apply<'a>(&self, snapshot: &'a Snapshot) -> Vec<&'a InspectionRecord> {
        snapshot.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Records of `snapshot` passing both predicates, in snapshot order.
pub fn filter<'a>(
    snapshot: &'a Snapshot,
    status_filter: &str,
    search_term: &str,
) -> Vec<&'a InspectionRecord> {
    QueryFilter::new(status_filter, search_term).apply(snapshot)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActions {
    pub visible: bool,
    /// Set only when exactly one selected record carries a form link.
    pub form_link: Option<String>,
}

pub fn bulk_actions(selection: &SelectionSet, snapshot: &Snapshot) -> BulkActions {
    let form_link = if selection.len() == 1 {
        selection
            .ids()
            .next()
            .and_then(|id| snapshot.get(id))
            .and_then(InspectionRecord::form_link)
            .map(str::to_string)
    } else {
        None
    };

    BulkActions {
        visible: !selection.is_empty(),
        form_link,
    }
}
