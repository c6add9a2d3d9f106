//! "Send Quotation" form.

use chrono::NaiveDate;
use entity::{Amount, quotation};

use crate::{
    error::{PipelineError, PipelineResult},
    view::Card,
};

pub const REQUIRED_FIELDS: &str = "Please fill out all required fields.";
pub const NO_ITEMS: &str = "Please add at least one item with a description and amount.";
pub const INVALID_ITEM: &str = "Please enter valid item details.";

/// One line of the draft as typed; the amount is parsed on validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftItem {
    pub description: String,
    pub amount: String,
}

impl DraftItem {
    pub fn new(description: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
        }
    }

    fn is_blank(&self) -> bool {
        self.description.trim().is_empty() && self.amount.trim().is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuotationDraft {
    pub quotation_no: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub deal_name: String,
    pub client_name: String,
    pub items: Vec<DraftItem>,
    pub details: quotation::Details,
}

impl QuotationDraft {
    /// Draft pre-filled from a Contacted card.
    pub fn for_card(card: &Card) -> Self {
        Self {
            deal_name: card.deal_name.clone(),
            client_name: card.client_name.clone(),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, description: impl Into<String>, amount: impl Into<String>) -> Self {
        self.items.push(DraftItem::new(description, amount));
        self
    }

    /// Check the form and build the request body. Rows left completely
    /// empty are ignored.
    pub fn validate(&self) -> PipelineResult<quotation::NewQuotation> {
        let required = [
            &self.quotation_no,
            &self.date,
            &self.deal_name,
            &self.client_name,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(PipelineError::validation(REQUIRED_FIELDS));
        }
        let date = self.date.trim();
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(PipelineError::validation(format!(
                "Quotation date `{date}` must look like 2024-03-01."
            )));
        }

        let rows: Vec<&DraftItem> = self.items.iter().filter(|item| !item.is_blank()).collect();
        if rows.is_empty() {
            return Err(PipelineError::validation(NO_ITEMS));
        }
        let items = rows
            .into_iter()
            .map(|item| {
                let description = item.description.trim();
                match Amount::parse_positive(&item.amount) {
                    Ok(amount) if !description.is_empty() => Ok(quotation::Item {
                        description: description.to_string(),
                        amount,
                    }),
                    _ => Err(PipelineError::validation(INVALID_ITEM)),
                }
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(quotation::NewQuotation {
            deal_name: self.deal_name.trim().to_string(),
            client_name: self.client_name.trim().to_string(),
            quotation_no: self.quotation_no.trim().to_string(),
            date: date.to_string(),
            items,
            details: self.details.clone(),
        })
    }
}
