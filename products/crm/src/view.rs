//! Read-side projection of the two remote collections into board cards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use entity::{Amount, Stage, deal, quotation};

/// Which collection backs a card.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardSource {
    Deal,
    Quotation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    /// Deal id for deal-backed cards, quotation id for Proposal cards.
    pub id: String,
    pub source: CardSource,
    pub client_name: String,
    pub deal_name: String,
    pub stage: Stage,
    pub amount: Amount,
    pub scheduled_meeting: Option<DateTime<Utc>>,
    pub quotation_no: Option<String>,
    pub total_amount: Option<Amount>,
    pub date: Option<String>,
}

impl Card {
    pub fn from_deal(deal: &deal::Model) -> Self {
        Self {
            id: deal.id.clone(),
            source: CardSource::Deal,
            client_name: deal.name.clone(),
            deal_name: deal.lead_name.clone(),
            stage: deal.stage,
            amount: deal.amount,
            scheduled_meeting: deal.scheduled_meeting,
            quotation_no: deal.quotation_no.clone(),
            total_amount: None,
            date: None,
        }
    }

    /// Synthetic Proposal card for a quotation.
    pub fn from_quotation(quotation: &quotation::Model) -> Self {
        let total = quotation.total();
        Self {
            id: quotation.id.clone(),
            source: CardSource::Quotation,
            client_name: quotation.client_name.clone(),
            deal_name: quotation.deal_name.clone(),
            stage: Stage::Proposal,
            amount: total,
            scheduled_meeting: None,
            quotation_no: Some(quotation.quotation_no.clone()).filter(|no| !no.is_empty()),
            total_amount: Some(total),
            date: Some(quotation.date.clone()).filter(|date| !date.is_empty()),
        }
    }

    pub fn is_quotation(&self) -> bool {
        self.source == CardSource::Quotation
    }

    /// Name shown on the card, falling back to the client when the deal has none.
    pub fn title(&self) -> &str {
        if self.deal_name.is_empty() {
            &self.client_name
        } else {
            &self.deal_name
        }
    }
}

/// One board column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column<'a> {
    pub stage: Stage,
    pub cards: Vec<&'a Card>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineView {
    pub cards: Vec<Card>,
    /// Sum of quotation totals per client name.
    pub client_totals: BTreeMap<String, Amount>,
}

impl PipelineView {
    /// Deal-store records other than Proposal mirrors, followed by one
    /// Proposal card per quotation.
    pub fn derive(deals: &[deal::Model], quotations: &[quotation::Model]) -> Self {
        let mut cards: Vec<Card> = deals
            .iter()
            .filter(|deal| deal.stage != Stage::Proposal)
            .map(Card::from_deal)
            .collect();
        cards.extend(quotations.iter().map(Card::from_quotation));

        let mut client_totals = BTreeMap::new();
        for quotation in quotations {
            *client_totals
                .entry(quotation.client_name.clone())
                .or_insert(Amount::ZERO) += quotation.total();
        }

        Self {
            cards,
            client_totals,
        }
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn column(&self, stage: Stage) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |card| card.stage == stage)
    }

    /// The four board columns in order; archived deals are left out.
    pub fn board(&self) -> Vec<Column<'_>> {
        Stage::BOARD
            .iter()
            .map(|&stage| Column {
                stage,
                cards: self.column(stage).collect(),
            })
            .collect()
    }

    pub fn client_total(&self, client_name: &str) -> Option<Amount> {
        self.client_totals.get(client_name).copied()
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.cards.len();
        self.cards.retain(|card| card.id != id);
        self.cards.len() != before
    }
}
