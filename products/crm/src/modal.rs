//! Prompt and confirm dialogs as plain state machines.
//!
//! `Idle -> CollectingInput -> Confirmed | Cancelled`. Front-ends drive the
//! transitions; the transition engine only reads the final state.

use std::fmt::Display;

use entity::Amount;

use crate::view::Card;

pub const QUALIFY_PROMPT: &str = "Enter the Qualified amount for this deal:";
pub const ARCHIVE_PROMPT: &str = "Are you sure you want to archive this deal?";

#[derive(Clone, Debug, PartialEq)]
pub enum ModalState<T> {
    Idle,
    CollectingInput { prompt: String, input: String },
    Confirmed(T),
    Cancelled { reason: Option<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Modal<T> {
    state: ModalState<T>,
}

impl<T> Default for Modal<T> {
    fn default() -> Self {
        Self {
            state: ModalState::Idle,
        }
    }
}

impl<T> Modal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalState<T> {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::CollectingInput { .. })
    }

    /// Open the dialog; ignored while it is already collecting input.
    pub fn open(&mut self, prompt: impl Into<String>, prefill: impl Into<String>) -> bool {
        if self.is_open() {
            return false;
        }
        self.state = ModalState::CollectingInput {
            prompt: prompt.into(),
            input: prefill.into(),
        };
        true
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.state {
            ModalState::CollectingInput { prompt, .. } => Some(prompt),
            _ => None,
        }
    }

    /// Replace the typed text.
    pub fn set_input(&mut self, text: impl Into<String>) -> bool {
        match &mut self.state {
            ModalState::CollectingInput { input, .. } => {
                *input = text.into();
                true
            }
            _ => false,
        }
    }

    /// Validate the typed text. Invalid input cancels the dialog with the
    /// parse error as reason.
    pub fn submit<E: Display>(
        &mut self,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> &ModalState<T> {
        if let ModalState::CollectingInput { input, .. } = &self.state {
            self.state = match parse(input) {
                Ok(value) => ModalState::Confirmed(value),
                Err(err) => ModalState::Cancelled {
                    reason: Some(err.to_string()),
                },
            };
        }
        &self.state
    }

    pub fn cancel(&mut self) {
        if !matches!(self.state, ModalState::Confirmed(_)) {
            self.state = ModalState::Cancelled { reason: None };
        }
    }

    /// Take the confirmed value, resetting the dialog to idle.
    pub fn take_confirmed(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, ModalState::Idle) {
            ModalState::Confirmed(value) => Some(value),
            other => {
                self.state = other;
                None
            }
        }
    }
}

impl Modal<()> {
    /// Yes/no dialog asking `prompt`.
    pub fn confirmation(prompt: impl Into<String>) -> Self {
        let mut modal = Self::new();
        modal.open(prompt, "");
        modal
    }

    pub fn confirm(&mut self) {
        if self.is_open() {
            self.state = ModalState::Confirmed(());
        }
    }
}

impl Modal<Amount> {
    /// Amount prompt for the Proposal -> Qualified move, prefilled with the
    /// card's current amount.
    pub fn qualified_amount(card: &Card) -> Self {
        let mut modal = Self::new();
        let prefill = if card.amount == Amount::ZERO {
            String::new()
        } else {
            card.amount.to_string()
        };
        modal.open(QUALIFY_PROMPT, prefill);
        modal
    }

    pub fn submit_amount(&mut self) -> &ModalState<Amount> {
        self.submit(|input| Amount::parse_positive(input))
    }
}

impl<T> Modal<T> {
    /// Why the dialog was cancelled, when the input was refused.
    pub fn cancel_reason(&self) -> Option<&str> {
        match &self.state {
            ModalState::Cancelled { reason } => reason.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::quotation;

    fn proposal_card() -> Card {
        Card::from_quotation(&quotation("q1", "Acme", "Website", &["500"]))
    }

    #[test]
    fn amount_prompt_confirms_positive_numbers() {
        let mut modal = Modal::qualified_amount(&proposal_card());
        assert_eq!(modal.prompt(), Some(QUALIFY_PROMPT));
        assert_eq!(
            modal.state(),
            &ModalState::CollectingInput {
                prompt: QUALIFY_PROMPT.into(),
                input: "500.00".into()
            }
        );

        modal.set_input("750");
        assert_eq!(
            modal.submit_amount(),
            &ModalState::Confirmed(Amount::from_cents(75_000))
        );
        assert_eq!(modal.take_confirmed(), Some(Amount::from_cents(75_000)));
        assert_eq!(modal.state(), &ModalState::Idle);
    }

    #[test]
    fn invalid_amount_cancels_with_reason() {
        for input in ["-5", "0", "five hundred", ""] {
            let mut modal = Modal::qualified_amount(&proposal_card());
            modal.set_input(input);
            let state = modal.submit_amount().clone();
            assert!(
                matches!(state, ModalState::Cancelled { reason: Some(_) }),
                "{input:?} gave {state:?}"
            );
            assert!(modal.cancel_reason().is_some());
            assert_eq!(modal.take_confirmed(), None);
        }
    }

    #[test]
    fn confirmation_can_be_declined() {
        let mut modal = Modal::confirmation(ARCHIVE_PROMPT);
        assert!(modal.is_open());
        modal.cancel();
        assert_eq!(modal.state(), &ModalState::Cancelled { reason: None });
        modal.confirm();
        assert_eq!(modal.take_confirmed(), None);

        let mut modal = Modal::confirmation(ARCHIVE_PROMPT);
        modal.confirm();
        assert_eq!(modal.take_confirmed(), Some(()));
    }

    #[test]
    fn open_is_ignored_while_collecting() {
        let mut modal: Modal<Amount> = Modal::new();
        assert!(modal.open("first", ""));
        assert!(!modal.open("second", ""));
        assert_eq!(modal.prompt(), Some("first"));
        assert!(!Modal::<Amount>::new().set_input("1"));
    }
}
