use std::fmt;

use serde::{Deserialize, Serialize};

/// Enlisted ladder walked by promotions, lowest to highest.
pub const PROMOTION_LADDER: [Rank; 9] = [
    Rank::E1,
    Rank::E2,
    Rank::E3,
    Rank::E4,
    Rank::E5,
    Rank::E6,
    Rank::E7,
    Rank::E8,
    Rank::E9,
];

/// Pay grade of a member.
///
/// Stored as its grade text (`"E-4"`, `"O-2"`). Anything the store holds that
/// is not a known grade is kept verbatim in `Unrecognized` so it survives a
/// round trip and still reaches the manual-review path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rank {
    E1,
    E2,
    E3,
    E4,
    E5,
    E6,
    E7,
    E8,
    E9,
    O1,
    O2,
    O3,
    O4,
    Unrecognized(String),
}

impl Default for Rank {
    fn default() -> Self {
        Rank::Unrecognized(String::new())
    }
}

impl Rank {
    /// Parse grade text. Never fails: unknown text becomes `Unrecognized`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "E-1" => Rank::E1,
            "E-2" => Rank::E2,
            "E-3" => Rank::E3,
            "E-4" => Rank::E4,
            "E-5" => Rank::E5,
            "E-6" => Rank::E6,
            "E-7" => Rank::E7,
            "E-8" => Rank::E8,
            "E-9" => Rank::E9,
            "O-1" => Rank::O1,
            "O-2" => Rank::O2,
            "O-3" => Rank::O3,
            "O-4" => Rank::O4,
            other => Rank::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Rank::E1 => "E-1",
            Rank::E2 => "E-2",
            Rank::E3 => "E-3",
            Rank::E4 => "E-4",
            Rank::E5 => "E-5",
            Rank::E6 => "E-6",
            Rank::E7 => "E-7",
            Rank::E8 => "E-8",
            Rank::E9 => "E-9",
            Rank::O1 => "O-1",
            Rank::O2 => "O-2",
            Rank::O3 => "O-3",
            Rank::O4 => "O-4",
            Rank::Unrecognized(s) => s.as_str(),
        }
    }

    /// Short display form (SrA, TSgt, Capt...). Unknown grades show their raw text.
    pub fn abbreviation(&self) -> &str {
        match self {
            Rank::E1 => "AB",
            Rank::E2 => "Amn",
            Rank::E3 => "A1C",
            Rank::E4 => "SrA",
            Rank::E5 => "SSgt",
            Rank::E6 => "TSgt",
            Rank::E7 => "MSgt",
            Rank::E8 => "SMSgt",
            Rank::E9 => "CMSgt",
            Rank::O1 => "2d Lt",
            Rank::O2 => "1st Lt",
            Rank::O3 => "Capt",
            Rank::O4 => "Maj",
            Rank::Unrecognized(s) => s.as_str(),
        }
    }

    /// Sort weight: enlisted 1-9, officers 10-13, anything else 0.
    pub fn order(&self) -> usize {
        match self {
            Rank::E1 => 1,
            Rank::E2 => 2,
            Rank::E3 => 3,
            Rank::E4 => 4,
            Rank::E5 => 5,
            Rank::E6 => 6,
            Rank::E7 => 7,
            Rank::E8 => 8,
            Rank::E9 => 9,
            Rank::O1 => 10,
            Rank::O2 => 11,
            Rank::O3 => 12,
            Rank::O4 => 13,
            Rank::Unrecognized(_) => 0,
        }
    }

    pub fn is_officer(&self) -> bool {
        match self {
            Rank::O1 | Rank::O2 | Rank::O3 | Rank::O4 => true,
            Rank::Unrecognized(s) => s.starts_with("O-"),
            _ => false,
        }
    }

    /// Grades that may appear as someone's supervisor.
    pub fn can_supervise(&self) -> bool {
        matches!(
            self,
            Rank::E5 | Rank::E6 | Rank::E7 | Rank::E8 | Rank::E9
                | Rank::O1 | Rank::O2 | Rank::O3 | Rank::O4
        )
    }

    /// Grades promoted through a selection board (E-4 through E-8).
    pub fn is_board_grade(&self) -> bool {
        matches!(
            self,
            Rank::E4 | Rank::E5 | Rank::E6 | Rank::E7 | Rank::E8
        )
    }

    /// Position in [`PROMOTION_LADDER`], if the grade is on it.
    pub fn ladder_index(&self) -> Option<usize> {
        PROMOTION_LADDER.iter().position(|r| r == self)
    }

    /// The next grade up the enlisted ladder. `None` at E-9 or off the ladder.
    pub fn next_in_ladder(&self) -> Option<Rank> {
        self.ladder_index()
            .and_then(|i| PROMOTION_LADDER.get(i + 1))
            .cloned()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Rank {
    fn from(s: String) -> Self {
        Rank::parse(&s)
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_grades() {
        assert_eq!(Rank::parse("E-1"), Rank::E1);
        assert_eq!(Rank::parse("E-9"), Rank::E9);
        assert_eq!(Rank::parse("O-4"), Rank::O4);
        assert_eq!(Rank::parse(" E-5 "), Rank::E5);
    }

    #[test]
    fn test_parse_unknown_keeps_text() {
        assert_eq!(Rank::parse("O-5"), Rank::Unrecognized("O-5".to_string()));
        assert_eq!(Rank::parse(""), Rank::default());
        assert_eq!(Rank::parse("CIV").as_str(), "CIV");
    }

    #[test]
    fn test_serde_uses_grade_text() {
        let json = serde_json::to_string(&Rank::E4).unwrap();
        assert_eq!(json, "\"E-4\"");
        let back: Rank = serde_json::from_str("\"O-2\"").unwrap();
        assert_eq!(back, Rank::O2);
        let odd: Rank = serde_json::from_str("\"WO-1\"").unwrap();
        assert_eq!(odd, Rank::Unrecognized("WO-1".to_string()));
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(Rank::E4.abbreviation(), "SrA");
        assert_eq!(Rank::E9.abbreviation(), "CMSgt");
        assert_eq!(Rank::O1.abbreviation(), "2d Lt");
        assert_eq!(Rank::parse("CIV").abbreviation(), "CIV");
    }

    #[test]
    fn test_ordering_weights() {
        assert!(Rank::O4.order() > Rank::O1.order());
        assert!(Rank::O1.order() > Rank::E9.order());
        assert!(Rank::E2.order() > Rank::E1.order());
        assert_eq!(Rank::parse("CIV").order(), 0);
    }

    #[test]
    fn test_officer_detection() {
        assert!(Rank::O3.is_officer());
        assert!(Rank::parse("O-6").is_officer());
        assert!(!Rank::E7.is_officer());
        assert!(!Rank::parse("CIV").is_officer());
    }

    #[test]
    fn test_supervisor_grades() {
        assert!(!Rank::E4.can_supervise());
        assert!(Rank::E5.can_supervise());
        assert!(Rank::O2.can_supervise());
        assert!(!Rank::parse("CIV").can_supervise());
    }

    #[test]
    fn test_ladder_navigation() {
        assert_eq!(Rank::E1.next_in_ladder(), Some(Rank::E2));
        assert_eq!(Rank::E8.next_in_ladder(), Some(Rank::E9));
        assert_eq!(Rank::E9.next_in_ladder(), None);
        assert_eq!(Rank::O1.next_in_ladder(), None);
        assert_eq!(Rank::E9.ladder_index(), Some(8));
        assert_eq!(Rank::O1.ladder_index(), None);
    }
}
