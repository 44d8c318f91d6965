use serde::Serialize;

use crate::dashboard::selection::{BulkActions, QueryFilter};
use crate::dashboard::DashboardState;
use crate::models::InspectionRecord;

use super::format::format_timestamp;

/// Everything a renderer needs for one card.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    pub press: String,
    pub part_number: String,
    pub last_updated: String,
    pub status: String,
    pub status_label: String,
    pub status_icon: String,
    pub status_class: String,
    pub color: String,
    pub selected: bool,
    pub notified: bool,
}

impl CardView {
    pub fn from_record(record: &InspectionRecord, selected: bool) -> Self {
        Self {
            id: record.id.clone(),
            press: record.press.clone(),
            part_number: record.part_number.clone(),
            last_updated: format_timestamp(record.timestamp),
            status: record.status.as_str().to_string(),
            status_label: record.status.label(),
            status_icon: record.status.icon().to_string(),
            status_class: record.status.css_class(),
            color: record.color_tag.clone(),
            selected,
            notified: record.notified,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub cards: Vec<CardView>,
    /// No records loaded yet; show the getting-started panel instead.
    pub show_welcome: bool,
    pub bulk_actions: BulkActions,
    pub filter: QueryFilter,
    pub total: usize,
    pub notified: usize,
}

impl DashboardView {
    pub fn from_state(state: &DashboardState) -> Self {
        let snapshot = state.snapshot();
        let selection = state.selection();

        let cards = state
            .visible_records()
            .into_iter()
            .map(|record| CardView::from_record(record, selection.contains(&record.id)))
            .collect();

        Self {
            cards,
            show_welcome: snapshot.is_empty(),
            bulk_actions: if snapshot.is_empty() {
                BulkActions::default()
            } else {
                state.bulk_actions()
            },
            filter: state.filter().clone(),
            total: snapshot.len(),
            notified: snapshot.iter().filter(|record| record.notified).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::sheets::RawRow;
    use chrono::{TimeDelta, Utc};
    use serde_json::json;

    #[test]
    fn empty_board_shows_welcome() {
        let state = DashboardState::new(&DashboardConfig::default());
        let view = DashboardView::from_state(&state);
        assert!(view.show_welcome);
        assert!(view.cards.is_empty());
        assert!(!view.bulk_actions.visible);
    }

    #[test]
    fn cards_reflect_filter_selection_and_flags() {
        let now = Utc::now();
        let stale = (now - TimeDelta::hours(2)).to_rfc3339();
        let mut state = DashboardState::new(&DashboardConfig::default());
        state.ingest(
            &[
                RawRow::from_values([json!("Under Watch"), json!("3"), json!("Gear"), json!("https://f"), json!(stale)]),
                RawRow::from_values([json!("Accept"), json!("4"), json!("Cam")]),
            ],
            now,
        );
        state.toggle_selection("press-3-gear");
        state.set_status_filter("under-watch");

        let view = DashboardView::from_state(&state);
        assert_eq!(view.total, 2);
        assert_eq!(view.notified, 1);
        assert_eq!(view.cards.len(), 1);

        let card = &view.cards[0];
        assert_eq!(card.status, "under-watch");
        assert_eq!(card.status_label, "UNDER WATCH");
        assert_eq!(card.status_class, "status-under-watch");
        assert_eq!(card.status_icon, "fa-eye");
        assert_eq!(card.color, "#3498db");
        assert!(card.selected);
        assert!(card.notified);
        assert_eq!(view.bulk_actions.form_link.as_deref(), Some("https://f"));
    }
}
