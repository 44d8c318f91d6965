use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Inspection decision shown on a card.
///
/// Raw sheet labels are folded into the canonical tokens; anything unknown is
/// kept as its lower-cased text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InspectionStatus {
    New,
    Approved,
    Rejected,
    UnderWatch,
    Ghost,
    Maintenance,
    Other(String),
}

impl InspectionStatus {
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        match lowered.as_str() {
            "new" => InspectionStatus::New,
            "accept" | "approved" => InspectionStatus::Approved,
            "reject" | "rejected" => InspectionStatus::Rejected,
            "under watch" | "under-watch" => InspectionStatus::UnderWatch,
            "ghost" => InspectionStatus::Ghost,
            "maintenance" => InspectionStatus::Maintenance,
            _ => InspectionStatus::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InspectionStatus::New => "new",
            InspectionStatus::Approved => "approved",
            InspectionStatus::Rejected => "rejected",
            InspectionStatus::UnderWatch => "under-watch",
            InspectionStatus::Ghost => "ghost",
            InspectionStatus::Maintenance => "maintenance",
            InspectionStatus::Other(raw) => raw,
        }
    }

    /// Upper-cased card label, e.g. `UNDER WATCH`.
    pub fn label(&self) -> String {
        self.as_str().replacen('-', " ", 1).to_uppercase()
    }

    pub fn icon(&self) -> &'static str {
        match self {
            InspectionStatus::New => "fa-star",
            InspectionStatus::Approved => "fa-check-circle",
            InspectionStatus::Rejected => "fa-times-circle",
            InspectionStatus::UnderWatch => "fa-eye",
            InspectionStatus::Ghost => "fa-ghost",
            InspectionStatus::Maintenance => "fa-tools",
            InspectionStatus::Other(_) => "fa-question-circle",
        }
    }

    /// RGB used for the status line of an exported report.
    pub fn report_color(&self) -> [u8; 3] {
        match self {
            InspectionStatus::New => [155, 89, 182],
            InspectionStatus::Approved => [39, 174, 96],
            InspectionStatus::Rejected => [231, 76, 60],
            InspectionStatus::UnderWatch => [243, 156, 18],
            InspectionStatus::Ghost => [149, 165, 166],
            InspectionStatus::Maintenance => [52, 152, 219],
            InspectionStatus::Other(_) => [0, 0, 0],
        }
    }

    pub fn css_class(&self) -> String {
        format!("status-{}", self.as_str().replacen(' ', "-", 1))
    }
}

/// Normalizes a raw status label into its display token.
pub fn normalize_status(raw: &str) -> String {
    InspectionStatus::normalize(raw).as_str().to_string()
}

impl Default for InspectionStatus {
    fn default() -> Self {
        InspectionStatus::Other(String::new())
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InspectionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InspectionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(InspectionStatus::normalize(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_sheet_labels_to_tokens() {
        assert_eq!(normalize_status("Accept"), "approved");
        assert_eq!(normalize_status("REJECT"), "rejected");
        assert_eq!(normalize_status("Under Watch"), "under-watch");
        assert_eq!(normalize_status("New"), "new");
        assert_eq!(normalize_status("Ghost"), "ghost");
        assert_eq!(normalize_status("Maintenance"), "maintenance");
    }

    #[test]
    fn unknown_labels_pass_through_lower_cased() {
        assert_eq!(normalize_status("Pending Review"), "pending review");
        assert_eq!(
            InspectionStatus::normalize("On Hold"),
            InspectionStatus::Other("on hold".into())
        );
        assert_eq!(normalize_status(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "Accept", "reject", "Under Watch", "under-watch", "NEW", "ghost",
            "Maintenance", "Approved", "Something Else", "", "ÜBER",
        ] {
            let once = normalize_status(raw);
            assert_eq!(normalize_status(&once), once, "raw input {raw:?}");
            assert_eq!(once, once.to_lowercase());
        }
    }

    #[test]
    fn canonical_tokens_never_land_in_other() {
        assert_eq!(InspectionStatus::normalize("Under-Watch"), InspectionStatus::UnderWatch);
        assert_eq!(InspectionStatus::normalize("APPROVED"), InspectionStatus::Approved);
    }

    #[test]
    fn display_helpers() {
        assert_eq!(InspectionStatus::UnderWatch.label(), "UNDER WATCH");
        assert_eq!(InspectionStatus::UnderWatch.css_class(), "status-under-watch");
        assert_eq!(InspectionStatus::normalize("on hold").css_class(), "status-on-hold");
        assert_eq!(InspectionStatus::Other("x".into()).icon(), "fa-question-circle");
        assert_eq!(InspectionStatus::Approved.report_color(), [39, 174, 96]);
    }

    #[test]
    fn multi_word_helpers_replace_first_separator_only() {
        let status = InspectionStatus::normalize("re-check-now");
        assert_eq!(status.label(), "RE CHECK-NOW");
        let status = InspectionStatus::normalize("on hold today");
        assert_eq!(status.css_class(), "status-on-hold today");
    }

    #[test]
    fn serializes_as_token() {
        let json = serde_json::to_string(&InspectionStatus::UnderWatch).unwrap();
        assert_eq!(json, "\"under-watch\"");
        let back: InspectionStatus = serde_json::from_str("\"Accept\"").unwrap();
        assert_eq!(back, InspectionStatus::Approved);
    }
}
