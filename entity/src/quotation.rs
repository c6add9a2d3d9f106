use serde::{Deserialize, Serialize};

use crate::Amount;

/// A record of the `/newquotations` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub deal_name: String,
    pub client_name: String,
    #[serde(default)]
    pub quotation_no: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(flatten)]
    pub details: Details,
}

impl Model {
    pub fn total(&self) -> Amount {
        self.items.iter().map(|item| item.amount).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub description: String,
    pub amount: Amount,
}

/// Client and bank details printed on the quotation; passed through as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    #[serde(rename = "CompanyRequirement", default, skip_serializing_if = "Option::is_none")]
    pub company_requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifsc_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Body of `POST /newquotations`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuotation {
    pub deal_name: String,
    pub client_name: String,
    pub quotation_no: String,
    pub date: String,
    pub items: Vec<Item>,
    #[serde(flatten)]
    pub details: Details,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_sums_mixed_item_amounts() {
        let raw = json!({
            "_id": "q1",
            "dealName": "Website revamp",
            "clientName": "Acme Corp",
            "quotationNo": "Q-001",
            "date": "2024-03-02",
            "items": [
                { "description": "Design", "amount": "1200.50" },
                { "description": "Build", "amount": 3000 }
            ],
            "CompanyRequirement": "Marketing site",
            "bankName": "HDFC"
        });
        let quotation: Model = serde_json::from_value(raw).unwrap();
        assert_eq!(quotation.total(), Amount::from_cents(420_050));
        assert_eq!(
            quotation.details.company_requirement.as_deref(),
            Some("Marketing site")
        );
        assert_eq!(quotation.details.bank_name.as_deref(), Some("HDFC"));
    }

    #[test]
    fn new_quotation_omits_empty_details() {
        let body = NewQuotation {
            deal_name: "Website revamp".into(),
            client_name: "Acme Corp".into(),
            quotation_no: "Q-002".into(),
            date: "2024-03-02".into(),
            items: vec![Item {
                description: "Design".into(),
                amount: Amount::from_cents(10_000),
            }],
            details: Details::default(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "dealName": "Website revamp",
                "clientName": "Acme Corp",
                "quotationNo": "Q-002",
                "date": "2024-03-02",
                "items": [{ "description": "Design", "amount": 100.0 }]
            })
        );
    }
}
