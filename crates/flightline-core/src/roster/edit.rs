//! Form values to member records.
//!
//! Everything typed by a user passes through here before it reaches the
//! promotion engine: dates are validated strictly and the team/status rules
//! for flight leads are applied.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{Member, Rank, Team, FLIGHT_COMMANDER};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateInputError {
    #[error("'{0}' is not a YYYY-MM-DD date")]
    Malformed(String),

    #[error("'{0}' is not a real calendar date")]
    OutOfRange(String),
}

/// Parse a typed date. Only `YYYY-MM-DD` naming a real day is accepted.
pub fn parse_date_input(input: &str) -> Result<NaiveDate, DateInputError> {
    let text = input.trim();
    let bytes = text.as_bytes();

    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(DateInputError::Malformed(text.to_string()));
    }

    let year: i32 = text[0..4].parse().map_err(|_| DateInputError::Malformed(text.to_string()))?;
    let month: u32 = text[5..7].parse().map_err(|_| DateInputError::Malformed(text.to_string()))?;
    let day: u32 = text[8..10].parse().map_err(|_| DateInputError::Malformed(text.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateInputError::OutOfRange(text.to_string()))
}

/// Like [`parse_date_input`], but a blank input clears the date.
pub fn parse_optional_date_input(input: &str) -> Result<Option<NaiveDate>, DateInputError> {
    if input.trim().is_empty() {
        Ok(None)
    } else {
        parse_date_input(input).map(Some)
    }
}

/// Id for a newly added member: `card-<unix millis>`.
pub fn new_member_id(now: DateTime<Utc>) -> String {
    format!("card-{}", now.timestamp_millis())
}

/// Id for a newly added custom field: `field_<unix millis>`.
pub fn new_field_id(now: DateTime<Utc>) -> String {
    format!("field_{}", now.timestamp_millis())
}

/// Raw values from the add/edit member form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberDraft {
    /// `None` when adding a new member.
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub rank: String,
    pub tis_date: String,
    pub dor_date: String,
    pub supervisor: String,
    pub sup_start_date: String,
    pub team: Option<Team>,
    pub duty_title: String,
    pub status: String,
    pub hometown: String,
    pub medical_profile: String,
    /// Custom field id to value.
    pub custom: BTreeMap<String, String>,
}

impl MemberDraft {
    /// Prefill the form from a stored member.
    pub fn from_member(member: &Member) -> Self {
        let date_text = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        Self {
            id: Some(member.id.clone()),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            rank: member.rank.as_str().to_string(),
            tis_date: date_text(member.tis_date),
            dor_date: date_text(member.dor_date),
            supervisor: member.supervisor.clone().unwrap_or_default(),
            sup_start_date: date_text(member.sup_start_date),
            team: Some(member.team),
            duty_title: member.duty_title.clone().unwrap_or_default(),
            status: member.status.clone().unwrap_or_default(),
            hometown: member.hometown.clone().unwrap_or_default(),
            medical_profile: member.medical_profile.clone().unwrap_or_default(),
            custom: member.custom_data.clone(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Build the member to persist.
    ///
    /// Editing starts from `existing`, so board outcomes and keys this form
    /// does not show survive, and custom values are merged over the stored
    /// ones. Flight Chief and Flight Commander always land in flight leads
    /// without a status; a Flight Commander has no supervisor.
    pub fn into_member(self, existing: Option<&Member>, now: DateTime<Utc>) -> Result<Member, DateInputError> {
        let tis_date = parse_optional_date_input(&self.tis_date)?;
        let dor_date = parse_optional_date_input(&self.dor_date)?;
        let sup_start_date = parse_optional_date_input(&self.sup_start_date)?;

        let mut member = existing.cloned().unwrap_or_default();
        member.id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| new_member_id(now));
        member.first_name = self.first_name.trim().to_string();
        member.last_name = self.last_name.trim().to_string();
        member.rank = Rank::parse(&self.rank);
        member.tis_date = tis_date;
        member.dor_date = dor_date;
        member.supervisor = non_empty(self.supervisor);
        member.sup_start_date = sup_start_date;
        member.team = self.team.unwrap_or_default();
        member.duty_title = non_empty(self.duty_title);
        member.status = non_empty(self.status);
        member.hometown = non_empty(self.hometown);
        member.medical_profile = non_empty(self.medical_profile);

        for (field_id, value) in self.custom {
            member.custom_data.insert(field_id, value);
        }

        if member.is_flight_lead() {
            member.team = Team::FlightLeads;
            member.status = None;
        }
        if member.duty_title.as_deref() == Some(FLIGHT_COMMANDER) {
            member.supervisor = None;
            member.sup_start_date = None;
        }

        Ok(member)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
