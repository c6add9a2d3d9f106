//! Plain-text rendering of the board and the recycle bin.

use std::fmt::Write;

use entity::deal;
use products_crm::{Card, PipelineView};

pub fn board(view: &PipelineView) -> String {
    let mut out = String::new();
    for column in view.board() {
        let _ = writeln!(out, "== {} ({}) ==", column.stage, column.cards.len());
        if column.cards.is_empty() {
            let _ = writeln!(out, "  (empty)");
        }
        for card in column.cards {
            let _ = writeln!(out, "  {}", card_line(card, view));
        }
    }
    out
}

fn card_line(card: &Card, view: &PipelineView) -> String {
    let mut line = format!("[{}] {} / {}", card.id, card.title(), card.client_name);
    if card.is_quotation() {
        if let Some(no) = &card.quotation_no {
            let _ = write!(line, "  #{no}");
        }
        if let Some(date) = &card.date {
            let _ = write!(line, "  {date}");
        }
        if let Some(total) = card.total_amount {
            let _ = write!(line, "  total {total}");
        }
        if let Some(client_total) = view.client_total(&card.client_name) {
            let _ = write!(line, "  (client {client_total})");
        }
    } else {
        let _ = write!(line, "  amount {}", card.amount);
        if let Some(meeting) = card.scheduled_meeting {
            let _ = write!(line, "  meeting {}", meeting.format("%Y-%m-%d %H:%M"));
        }
    }
    line
}

pub fn recycle_bin(archived: &[deal::Model]) -> String {
    if archived.is_empty() {
        return "Recycle bin is empty.\n".to_string();
    }
    let mut out = String::new();
    for deal in archived {
        let _ = writeln!(
            out,
            "[{}] {} / {}  amount {}",
            deal.id, deal.lead_name, deal.name, deal.amount
        );
    }
    out
}
