use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;

/// Folder marker the backend uses for archived deals.
pub const ARCHIVE_FOLDER: &str = "DeleteLeads";

/// A record of the `/dealmanagement` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: String,
    /// Client name.
    pub name: String,
    /// Deal (opportunity) name.
    #[serde(default)]
    pub lead_name: String,
    pub stage: Stage,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_meeting: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_no: Option<String>,
    /// Set on Proposal-stage mirrors of a quotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_to_folder: Option<String>,
}

impl Model {
    /// Whether this deal describes the same opportunity as `deal_name`/`client_name`.
    pub fn same_pair(&self, deal_name: &str, client_name: &str) -> bool {
        self.lead_name == deal_name && self.name == client_name
    }
}

/// Body of `POST /dealmanagement`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeal {
    pub name: String,
    pub lead_name: String,
    pub stage: Stage,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_meeting: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<String>,
}

/// Body of `PUT /dealmanagement/:id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePatch {
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_to_folder: Option<String>,
}

impl StagePatch {
    pub fn to(stage: Stage) -> Self {
        Self {
            stage,
            move_to_folder: None,
        }
    }

    pub fn archive() -> Self {
        Self {
            stage: Stage::Archived,
            move_to_folder: Some(ARCHIVE_FOLDER.to_string()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Lead,
    Contacted,
    Proposal,
    Qualified,
    Archived,
}

impl Stage {
    /// Columns of the pipeline board, left to right.
    pub const BOARD: [Stage; 4] = [
        Stage::Lead,
        Stage::Contacted,
        Stage::Proposal,
        Stage::Qualified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Lead => "Lead",
            Stage::Contacted => "Contacted",
            Stage::Proposal => "Proposal",
            Stage::Qualified => "Qualified",
            Stage::Archived => "Archived",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown stage `{0}`")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lead" => Ok(Stage::Lead),
            "contacted" => Ok(Stage::Contacted),
            "proposal" => Ok(Stage::Proposal),
            "qualified" => Ok(Stage::Qualified),
            "archived" => Ok(Stage::Archived),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_backend_record() {
        let raw = json!({
            "_id": "65f1",
            "name": "Acme Corp",
            "leadName": "Website revamp",
            "stage": "Contacted",
            "amount": "0",
            "scheduledMeeting": "2024-03-01T10:00:00.000Z",
            "__v": 0
        });
        let deal: Model = serde_json::from_value(raw).unwrap();
        assert_eq!(deal.id, "65f1");
        assert_eq!(deal.stage, Stage::Contacted);
        assert_eq!(deal.amount, Amount::ZERO);
        assert!(deal.scheduled_meeting.is_some());
        assert!(deal.same_pair("Website revamp", "Acme Corp"));
        assert!(!deal.same_pair("Acme Corp", "Website revamp"));
    }

    #[test]
    fn unknown_stage_is_a_decode_error() {
        let raw = json!({ "_id": "1", "name": "A", "stage": "Won" });
        assert!(serde_json::from_value::<Model>(raw).is_err());
    }

    #[test]
    fn archive_patch_carries_folder_marker() {
        let body = serde_json::to_value(StagePatch::archive()).unwrap();
        assert_eq!(body, json!({ "stage": "Archived", "moveToFolder": "DeleteLeads" }));
        let body = serde_json::to_value(StagePatch::to(Stage::Contacted)).unwrap();
        assert_eq!(body, json!({ "stage": "Contacted" }));
    }

    #[test]
    fn stage_parses_case_insensitively() {
        assert_eq!("qualified".parse::<Stage>(), Ok(Stage::Qualified));
        assert_eq!(" Lead ".parse::<Stage>(), Ok(Stage::Lead));
        assert!("won".parse::<Stage>().is_err());
        assert!(!Stage::BOARD.contains(&Stage::Archived));
    }
}
