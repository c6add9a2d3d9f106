use serde::{Deserialize, Serialize};

/// A record of the `/NewLeads` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: String,
    /// Client name.
    pub name: String,
    /// Deal name the lead asked about.
    #[serde(default)]
    pub lead_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub deal_status: DealStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl Model {
    pub fn is_connected(&self) -> bool {
        self.deal_status == DealStatus::Connected
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Connected,
    #[default]
    Disconnected,
}
