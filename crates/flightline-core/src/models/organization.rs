use std::fmt;

use serde::{Deserialize, Serialize};

/// Team a member is assigned to. Each team is stored as its own roster array
/// at `/<path>` in the database; members carry it as `"<path>-container"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Team {
    #[serde(rename = "inbound-container")]
    #[default]
    Inbound,
    #[serde(rename = "flight-leads-container")]
    FlightLeads,
    #[serde(rename = "brass-container")]
    Brass,
    #[serde(rename = "sbirs-container")]
    Sbirs,
}

impl Team {
    pub const ALL: [Team; 4] = [Team::Inbound, Team::FlightLeads, Team::Brass, Team::Sbirs];

    /// Database path holding this team's roster array.
    pub fn path(&self) -> &'static str {
        match self {
            Team::Inbound => "inbound",
            Team::FlightLeads => "flight-leads",
            Team::Brass => "brass",
            Team::Sbirs => "sbirs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Team::Inbound => "Inbound",
            Team::FlightLeads => "Flight Leads",
            Team::Brass => "Brass",
            Team::Sbirs => "SBIRS",
        }
    }

    /// Next team in display order (wrapping), used for quick reassignment.
    pub fn next(&self) -> Self {
        match self {
            Team::Inbound => Team::FlightLeads,
            Team::FlightLeads => Team::Brass,
            Team::Brass => Team::Sbirs,
            Team::Sbirs => Team::Inbound,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
