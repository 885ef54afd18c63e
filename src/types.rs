use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// identifier assigned to a loan by the backend
pub type LoanId = String;

/// approval status of a loan request
///
/// Backends report either the canonical tag (`APPROVED`) or the Portuguese
/// display label (`Aprovado`). Both spellings parse to the same variant, so
/// code past the deserialization boundary only ever sees one vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    /// any value the backend sends that matches neither vocabulary
    Other(String),
}

impl ApprovalStatus {
    const PENDING_LABELS: [&'static str; 2] = ["PENDING", "Pendente"];
    const APPROVED_LABELS: [&'static str; 2] = ["APPROVED", "Aprovado"];
    const REJECTED_LABELS: [&'static str; 2] = ["REJECTED", "Rejeitado"];

    /// parse a raw backend string, never failing
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        [Self::Pending, Self::Approved, Self::Rejected]
            .into_iter()
            .find(|status| status.matches_label(trimmed))
            .unwrap_or_else(|| Self::Other(trimmed.to_string()))
    }

    /// all spellings that denote this status
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Pending => &Self::PENDING_LABELS,
            Self::Approved => &Self::APPROVED_LABELS,
            Self::Rejected => &Self::REJECTED_LABELS,
            Self::Other(_) => &[],
        }
    }

    /// set-membership test against both vocabularies, ignoring case
    pub fn matches_label(&self, raw: &str) -> bool {
        match self {
            Self::Other(value) => value.eq_ignore_ascii_case(raw.trim()),
            _ => self
                .labels()
                .iter()
                .any(|label| label.eq_ignore_ascii_case(raw.trim())),
        }
    }

    /// canonical tag sent back to the backend
    pub fn canonical(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Other(value) => value,
        }
    }

    /// label shown to operators
    pub fn display_label(&self) -> &str {
        match self {
            Self::Pending => "Pendente",
            Self::Approved => "Aprovado",
            Self::Rejected => "Rejeitado",
            Self::Other(value) => value,
        }
    }
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl Serialize for ApprovalStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical())
    }
}

impl<'de> Deserialize<'de> for ApprovalStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// tabs of the loan request table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTab {
    Today,
    Pending,
    Approved,
    Rejected,
    All,
}

impl StatusTab {
    pub const ALL_TABS: [StatusTab; 5] = [
        StatusTab::Today,
        StatusTab::Pending,
        StatusTab::Approved,
        StatusTab::Rejected,
        StatusTab::All,
    ];

    /// status a record must carry to appear under this tab, if any
    pub fn status(&self) -> Option<ApprovalStatus> {
        match self {
            StatusTab::Pending => Some(ApprovalStatus::Pending),
            StatusTab::Approved => Some(ApprovalStatus::Approved),
            StatusTab::Rejected => Some(ApprovalStatus::Rejected),
            StatusTab::Today | StatusTab::All => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatusTab::Today => "today",
            StatusTab::Pending => "pending",
            StatusTab::Approved => "approved",
            StatusTab::Rejected => "rejected",
            StatusTab::All => "all",
        }
    }
}

impl fmt::Display for StatusTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatusTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_TABS
            .into_iter()
            .find(|tab| tab.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tab: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_vocabularies_parse_to_same_status() {
        assert_eq!(ApprovalStatus::parse("APPROVED"), ApprovalStatus::Approved);
        assert_eq!(ApprovalStatus::parse("Aprovado"), ApprovalStatus::Approved);
        assert_eq!(ApprovalStatus::parse("Pendente"), ApprovalStatus::Pending);
        assert_eq!(ApprovalStatus::parse("pending"), ApprovalStatus::Pending);
        assert_eq!(ApprovalStatus::parse("Rejeitado"), ApprovalStatus::Rejected);
        assert_eq!(ApprovalStatus::parse(" REJECTED "), ApprovalStatus::Rejected);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status = ApprovalStatus::parse("EM_ANALISE");
        assert_eq!(status, ApprovalStatus::Other("EM_ANALISE".to_string()));
        assert_eq!(status.canonical(), "EM_ANALISE");
        assert!(!ApprovalStatus::Pending.matches_label("EM_ANALISE"));
    }

    #[test]
    fn test_matches_label_is_membership_not_equality() {
        let approved = ApprovalStatus::Approved;
        assert!(approved.matches_label("APPROVED"));
        assert!(approved.matches_label("Aprovado"));
        assert!(!approved.matches_label("Pendente"));
        assert!(!approved.matches_label("REJECTED"));
    }

    #[test]
    fn test_status_serializes_canonical() {
        let status: ApprovalStatus = serde_json::from_str("\"Aprovado\"").unwrap();
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"APPROVED\"");
        assert_eq!(status.display_label(), "Aprovado");
    }

    #[test]
    fn test_tab_parsing() {
        assert_eq!("today".parse::<StatusTab>().unwrap(), StatusTab::Today);
        assert_eq!("Approved".parse::<StatusTab>().unwrap(), StatusTab::Approved);
        assert!("archived".parse::<StatusTab>().is_err());
        assert_eq!(StatusTab::Rejected.status(), Some(ApprovalStatus::Rejected));
        assert_eq!(StatusTab::All.status(), None);
    }
}
