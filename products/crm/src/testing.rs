//! Record builders shared by unit and workspace tests.

use entity::{Amount, Stage, deal, lead, quotation};

pub fn deal(id: &str, client: &str, deal_name: &str, stage: Stage) -> deal::Model {
    deal::Model {
        id: id.to_string(),
        name: client.to_string(),
        lead_name: deal_name.to_string(),
        stage,
        amount: Amount::ZERO,
        scheduled_meeting: None,
        quotation_no: None,
        quotation_id: None,
        move_to_folder: None,
    }
}

/// Proposal-stage deal mirroring quotation `quotation_id`.
pub fn mirror(id: &str, quotation_id: &str, client: &str, deal_name: &str) -> deal::Model {
    deal::Model {
        quotation_id: Some(quotation_id.to_string()),
        ..deal(id, client, deal_name, Stage::Proposal)
    }
}

/// Quotation whose items carry the given decimal amounts.
pub fn quotation(id: &str, client: &str, deal_name: &str, amounts: &[&str]) -> quotation::Model {
    quotation::Model {
        id: id.to_string(),
        deal_name: deal_name.to_string(),
        client_name: client.to_string(),
        quotation_no: format!("Q-{id}"),
        date: "2024-03-01".to_string(),
        items: amounts
            .iter()
            .enumerate()
            .map(|(idx, amount)| quotation::Item {
                description: format!("item {}", idx + 1),
                amount: amount.parse().unwrap_or(Amount::ZERO),
            })
            .collect(),
        details: quotation::Details::default(),
    }
}

pub fn lead(id: &str, client: &str, deal_name: &str, connected: bool) -> lead::Model {
    lead::Model {
        id: id.to_string(),
        name: client.to_string(),
        lead_name: deal_name.to_string(),
        email: None,
        phone: None,
        address: None,
        deal_status: if connected {
            lead::DealStatus::Connected
        } else {
            lead::DealStatus::Disconnected
        },
        message: None,
        date: None,
    }
}
