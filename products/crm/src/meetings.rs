//! "Schedule Meeting" form.

use chrono::{NaiveDate, NaiveTime};
use entity::meeting::NewMeeting;

use crate::{
    error::{PipelineError, PipelineResult},
    view::Card,
};

pub const INCOMPLETE: &str = "Please fill in all meeting details.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeetingForm {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`, 24-hour.
    pub start_time: String,
    pub end_time: String,
    pub note: String,
}

impl MeetingForm {
    pub fn for_card(card: &Card) -> Self {
        Self {
            note: format!("Client name: {}\n", card.client_name),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> PipelineResult<NewMeeting> {
        let note = self.note.trim();
        let fields = [&self.date, &self.start_time, &self.end_time];
        if note.is_empty() || fields.iter().any(|field| field.trim().is_empty()) {
            return Err(PipelineError::validation(INCOMPLETE));
        }

        let day = self.date.trim();
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| {
            PipelineError::validation(format!("Meeting date `{day}` must look like 2024-03-01."))
        })?;
        let start_time = parse_clock(&self.start_time)?;
        let end_time = parse_clock(&self.end_time)?;
        if end_time <= start_time {
            return Err(PipelineError::validation("The meeting must end after it starts."));
        }

        Ok(NewMeeting {
            date,
            start_time,
            end_time,
            note: note.to_string(),
        })
    }
}

fn parse_clock(value: &str) -> PipelineResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        PipelineError::validation(format!("Meeting time `{value}` must look like 14:30."))
    })
}
