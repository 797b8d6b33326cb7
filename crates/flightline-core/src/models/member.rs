use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::organization::Team;
use super::rank::Rank;

/// Duty titles that place a member in the flight-leads team.
pub const FLIGHT_CHIEF: &str = "Flight Chief";
pub const FLIGHT_COMMANDER: &str = "Flight Commander";

/// Below-the-Zone board outcome. Only meaningful for E-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum BtzStatus {
    #[default]
    #[serde(alias = "")]
    None,
    Selected,
    NotSelected,
}

impl BtzStatus {
    pub fn is_none(&self) -> bool {
        matches!(self, BtzStatus::None)
    }
}

/// Selection board outcome for E-4 through E-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum BoardStatus {
    #[default]
    #[serde(alias = "")]
    None,
    Selected,
    NotSelected,
}

impl BoardStatus {
    pub fn is_none(&self) -> bool {
        matches!(self, BoardStatus::None)
    }
}

/// One roster entry as stored in a team array.
///
/// Keys the application does not model are kept in `extra` so saving a member
/// never drops data written by other clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Member {
    #[serde(rename = "rowId")]
    pub id: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub rank: Rank,
    #[serde(
        rename = "tisDate",
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub tis_date: Option<NaiveDate>,
    #[serde(
        rename = "dorDate",
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub dor_date: Option<NaiveDate>,
    #[serde(
        rename = "originalDor",
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_dor: Option<NaiveDate>,
    #[serde(rename = "btzStatus", default, skip_serializing_if = "BtzStatus::is_none")]
    pub btz_status: BtzStatus,
    #[serde(rename = "promotionStatus", default, skip_serializing_if = "BoardStatus::is_none")]
    pub promotion_status: BoardStatus,
    #[serde(
        rename = "promotionDate",
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub promotion_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<String>,
    #[serde(
        rename = "supStartDate",
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub sup_start_date: Option<NaiveDate>,
    #[serde(rename = "teamSelect", default, deserialize_with = "deserialize_team")]
    pub team: Team,
    #[serde(rename = "dutyTitle", default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub duty_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(rename = "medicalProfile", default, deserialize_with = "deserialize_optional_string", skip_serializing_if = "Option::is_none")]
    pub medical_profile: Option<String>,
    #[serde(rename = "customData", default, deserialize_with = "deserialize_custom_data")]
    pub custom_data: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Member {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// "SrA Smith, Jane"
    pub fn rank_display_name(&self) -> String {
        format!("{} {}", self.rank.abbreviation(), self.display_name())
    }

    /// "SrA Smith", the compact form used in supervisor references and the chart.
    pub fn short_name(&self) -> String {
        format!("{} {}", self.rank.abbreviation(), self.last_name)
    }

    pub fn duty_title_display(&self) -> &str {
        self.duty_title.as_deref().unwrap_or("N/A")
    }

    pub fn status_display(&self) -> &str {
        self.status.as_deref().unwrap_or("N/A")
    }

    /// Flight Chief and Flight Commander sit in flight leads and carry no status.
    pub fn is_flight_lead(&self) -> bool {
        matches!(self.duty_title.as_deref(), Some(FLIGHT_CHIEF) | Some(FLIGHT_COMMANDER))
    }

    pub fn is_commander(&self) -> bool {
        self.duty_title.as_deref() == Some(FLIGHT_COMMANDER)
    }

    pub fn has_permanent_profile(&self) -> bool {
        self.medical_profile.as_deref() == Some("Permanent")
    }

    /// Normalize a team payload into members.
    ///
    /// Team rosters come back as arrays with null holes, as index-keyed
    /// objects, or as `null` for an empty team. Entries that fail to parse or
    /// carry no id are dropped.
    pub fn list_from_value(value: serde_json::Value) -> Vec<Member> {
        let entries: Vec<serde_json::Value> = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            _ => Vec::new(),
        };

        entries
            .into_iter()
            .filter(|v| !v.is_null())
            .filter_map(|v| match serde_json::from_value::<Member>(v) {
                Ok(member) if !member.id.is_empty() => Some(member),
                Ok(_) => {
                    debug!("Dropping roster entry without rowId");
                    None
                }
                Err(e) => {
                    debug!(error = %e, "Dropping unreadable roster entry");
                    None
                }
            })
            .collect()
    }
}

/// Display helper for optional dates: ISO text or "N/A".
pub fn date_display(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

// Stored dates are form values: "YYYY-MM-DD", "" when cleared, or missing.
// Anything unparseable is treated as missing; strict validation happens where
// dates are typed in.
fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct DateVisitor;

    impl<'de> de::Visitor<'de> for DateVisitor {
        type Value = Option<NaiveDate>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a YYYY-MM-DD date string or null")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(date) => Ok(Some(date)),
                Err(e) => {
                    debug!(value = %trimmed, error = %e, "Ignoring unparseable stored date");
                    Ok(None)
                }
            }
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(DateVisitor)
}

// Empty strings from cleared form inputs mean "not set".
fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn deserialize_team<'de, D>(deserializer: D) -> Result<Team, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .and_then(|s| Team::ALL.into_iter().find(|t| format!("{}-container", t.path()) == s))
        .unwrap_or_default())
}

// Custom values may have been written as numbers or booleans by older clients.
fn deserialize_custom_data<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => return None,
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect())
}
