//! Promotion eligibility rules.
//!
//! [`evaluate`] maps one member and a reference date to a [`Verdict`]. It is a
//! pure function of its inputs: nothing is cached, nothing is mutated, and the
//! verdict is recomputed on every render.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::models::{BoardStatus, BtzStatus, Member, Rank};

use super::dates::{add_months, day_after, months_between};
use super::quarter::Quarter;

// ============================================================================
// Thresholds
// ============================================================================

/// E-1 to E-2: months of service and months in grade.
pub const E1_MIN_TIS_MONTHS: i32 = 6;
pub const E1_MIN_TIG_MONTHS: i32 = 6;

/// E-2 to E-3: months in grade.
pub const E2_MIN_TIG_MONTHS: i32 = 10;

/// E-3 to E-4 standard path: whichever of these completes first.
pub const E3_STANDARD_TIS_MONTHS: i32 = 36;
pub const E3_STANDARD_TIG_MONTHS: i32 = 28;

/// Below-the-Zone promotions land this many months ahead of the standard date.
pub const BTZ_LEAD_MONTHS: i32 = 6;

/// Minimum (TIS, TIG) months to meet a selection board, by current grade.
pub fn board_requirement(rank: &Rank) -> Option<(i32, i32)> {
    match rank {
        Rank::E4 => Some((36, 6)),
        Rank::E5 => Some((60, 23)),
        Rank::E6 => Some((96, 24)),
        Rank::E7 => Some((132, 20)),
        Rank::E8 => Some((168, 21)),
        _ => None,
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// What the presentation layer should show for a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    InfoNeeded,
    ManualReview,
    BtzSelect,
    Eligible,
    NotEligible,
    BtzNotSelected,
    BtzTwoQ,
    BtzNextQ,
    BtzThisQ,
    BoardConcluded,
    PromoSelected,
    PromoNotSelected,
    PromoEligible,
}

/// Control a presentation layer should offer next to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Manual promotion with a new date of rank.
    Promote,
    /// Record the BTZ board outcome (selected / not selected).
    BtzDecision,
    /// Record the selection board outcome (selected with a date / not selected).
    BoardDecision,
}

/// Upcoming BTZ board markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// Board convenes next quarter.
    Urgent,
    /// Board convenes in two quarters.
    Warning,
}

impl Classification {
    /// Stable kebab-case tag, e.g. `"btz-this-q"`.
    pub fn tag(&self) -> &'static str {
        match self {
            Classification::InfoNeeded => "info-needed",
            Classification::ManualReview => "manual-review",
            Classification::BtzSelect => "btz-select",
            Classification::Eligible => "eligible",
            Classification::NotEligible => "not-eligible",
            Classification::BtzNotSelected => "btz-not-selected",
            Classification::BtzTwoQ => "btz-two-q",
            Classification::BtzNextQ => "btz-next-q",
            Classification::BtzThisQ => "btz-this-q",
            Classification::BoardConcluded => "board-concluded",
            Classification::PromoSelected => "promo-selected",
            Classification::PromoNotSelected => "promo-not-selected",
            Classification::PromoEligible => "promo-eligible",
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Classification::Eligible => Action::Promote,
            Classification::BtzThisQ | Classification::BoardConcluded => Action::BtzDecision,
            Classification::PromoEligible | Classification::PromoNotSelected => {
                Action::BoardDecision
            }
            Classification::InfoNeeded
            | Classification::ManualReview
            | Classification::BtzSelect
            | Classification::NotEligible
            | Classification::BtzNotSelected
            | Classification::BtzTwoQ
            | Classification::BtzNextQ
            | Classification::PromoSelected => Action::None,
        }
    }

    pub fn alert(&self) -> Option<Alert> {
        match self {
            Classification::BtzNextQ => Some(Alert::Urgent),
            Classification::BtzTwoQ => Some(Alert::Warning),
            _ => None,
        }
    }
}

/// Eligibility result for one member on one day. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub status: String,
    pub note: String,
    pub classification: Classification,
    pub promotable: bool,
    /// BTZ promotion date to record if the member is selected.
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub board_promotion_date: Option<NaiveDate>,
}

impl Verdict {
    fn new(status: impl Into<String>, note: impl Into<String>, classification: Classification) -> Self {
        Self {
            status: status.into(),
            note: note.into(),
            classification,
            promotable: classification.action() == Action::Promote,
            board_promotion_date: None,
        }
    }

    fn with_board_date(mut self, date: NaiveDate) -> Self {
        self.board_promotion_date = Some(date);
        self
    }

    pub fn action(&self) -> Action {
        self.classification.action()
    }
}

// ============================================================================
// E-3 board schedule
// ============================================================================

/// Key dates for an E-3 facing the Below-the-Zone board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtzSchedule {
    /// First day the member has completed the standard TIS or TIG period.
    pub standard_date: NaiveDate,
    /// Promotion date if selected below the zone.
    pub btz_date: NaiveDate,
    /// Quarter the board convenes: the quarter before `btz_date`'s quarter.
    pub board_quarter: Quarter,
}

impl BtzSchedule {
    pub fn compute(tis_date: NaiveDate, dor_date: NaiveDate) -> Self {
        let tis_path = add_months(tis_date, E3_STANDARD_TIS_MONTHS);
        let tig_path = add_months(dor_date, E3_STANDARD_TIG_MONTHS);
        let reached = tis_path.min(tig_path);

        let standard_date = day_after(reached);
        let btz_date = day_after(add_months(reached, -BTZ_LEAD_MONTHS));
        let board_quarter = Quarter::of(btz_date).previous();

        Self {
            standard_date,
            btz_date,
            board_quarter,
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate `member` against the clock's current date.
pub fn evaluate_now(member: &Member, clock: &dyn Clock) -> Verdict {
    evaluate(member, clock.today())
}

/// Evaluate `member` as of `today`.
pub fn evaluate(member: &Member, today: NaiveDate) -> Verdict {
    let (tis_date, dor_date) = match (member.tis_date, member.dor_date) {
        (Some(tis), Some(dor)) => (tis, dor),
        _ => {
            if member.rank.is_officer() {
                return Verdict::new("Officer Rank", "Manual tracking.", Classification::ManualReview);
            }
            return Verdict::new("Info Needed", "Enter TIS and DOR.", Classification::InfoNeeded);
        }
    };

    if member.btz_status == BtzStatus::Selected {
        return Verdict::new(
            "BTZ Select!",
            format!("New DOR: {}", dor_date.format("%Y-%m-%d")),
            Classification::BtzSelect,
        );
    }

    let months_tis = months_between(tis_date, today);
    let months_tig = months_between(dor_date, today);

    match &member.rank {
        Rank::E1 => {
            if months_tis >= E1_MIN_TIS_MONTHS && months_tig >= E1_MIN_TIG_MONTHS {
                Verdict::new("Eligible for E-2", "TIS/TIG met.", Classification::Eligible)
            } else {
                Verdict::new("Not Eligible", "Req: 6m TIS/TIG.", Classification::NotEligible)
            }
        }
        Rank::E2 => {
            if months_tig >= E2_MIN_TIG_MONTHS {
                Verdict::new("Eligible for E-3", "TIG met.", Classification::Eligible)
            } else {
                Verdict::new("Not Eligible", "Req: 10m TIG.", Classification::NotEligible)
            }
        }
        Rank::E3 => evaluate_e3(member.btz_status, BtzSchedule::compute(tis_date, dor_date), today),
        rank @ (Rank::E4 | Rank::E5 | Rank::E6 | Rank::E7 | Rank::E8) => {
            evaluate_board_grade(member, rank, months_tis, months_tig)
        }
        Rank::E9 => Verdict::new("Chief!", "Highest enlisted rank.", Classification::ManualReview),
        _ => Verdict::new("Review Manually", "", Classification::ManualReview),
    }
}

fn evaluate_e3(btz_status: BtzStatus, schedule: BtzSchedule, today: NaiveDate) -> Verdict {
    if btz_status == BtzStatus::NotSelected {
        if today >= schedule.standard_date {
            return Verdict::new("Eligible for E-4", "Standard TIS/TIG met.", Classification::Eligible);
        }
        return Verdict::new(
            "Not Selected for BTZ",
            format!(
                "Eligible for {} on {}",
                Rank::E4.abbreviation(),
                schedule.standard_date.format("%Y-%m-%d")
            ),
            Classification::BtzNotSelected,
        );
    }

    let board = schedule.board_quarter;
    let current = Quarter::of(today);
    let next = current.next();
    let two_out = next.next();

    if board == two_out {
        Verdict::new("BTZ Board in 2 Quarters", format!("Board for {}", board), Classification::BtzTwoQ)
    } else if board == next {
        Verdict::new("BTZ Board Next Quarter!", format!("Board for {}", board), Classification::BtzNextQ)
    } else if board == current {
        Verdict::new(
            format!("In {} BTZ Window", board),
            "Board meets this quarter.",
            Classification::BtzThisQ,
        )
        .with_board_date(schedule.btz_date)
    } else if board.ordinal() < current.ordinal() {
        Verdict::new("Board Concluded", format!("Board was {}", board), Classification::BoardConcluded)
            .with_board_date(schedule.btz_date)
    } else {
        Verdict::new("Not Eligible", format!("BTZ board: {}", board), Classification::NotEligible)
    }
}

fn evaluate_board_grade(member: &Member, rank: &Rank, months_tis: i32, months_tig: i32) -> Verdict {
    let next = rank.next_in_ladder().unwrap_or(Rank::E9);

    match (member.promotion_status, member.promotion_date) {
        (BoardStatus::Selected, Some(date)) => {
            return Verdict::new(
                format!("Selected for {}", next),
                format!("Promotes {}.", date.format("%Y-%m-%d")),
                Classification::PromoSelected,
            );
        }
        (BoardStatus::NotSelected, _) => {
            return Verdict::new(
                "Not Selected",
                "Eligible to compete next cycle.",
                Classification::PromoNotSelected,
            );
        }
        _ => {}
    }

    let Some((min_tis, min_tig)) = board_requirement(rank) else {
        return Verdict::new("Review Manually", "", Classification::ManualReview);
    };

    if months_tis >= min_tis && months_tig >= min_tig {
        Verdict::new(
            format!("Board Eligible for {}", next),
            format!("TIS/TIG met for {}. Awaiting board.", next.abbreviation()),
            Classification::PromoEligible,
        )
    } else {
        Verdict::new(
            "Not Eligible",
            format!("Req: {}m TIS & {}m TIG.", min_tis, min_tig),
            Classification::NotEligible,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(rank: Rank, tis: Option<NaiveDate>, dor: Option<NaiveDate>) -> Member {
        Member {
            id: "card-1".to_string(),
            rank,
            tis_date: tis,
            dor_date: dor,
            ..Default::default()
        }
    }

    // -------------------------------------------------------------------------
    // Missing data
    // -------------------------------------------------------------------------

    #[test]
    fn test_missing_dates_enlisted_needs_info() {
        let today = date(2025, 6, 15);
        for (tis, dor) in [(None, Some(today)), (Some(today), None), (None, None)] {
            let mut m = member(Rank::E3, tis, dor);
            m.btz_status = BtzStatus::Selected;
            let verdict = evaluate(&m, today);
            assert_eq!(verdict.classification, Classification::InfoNeeded);
            assert!(!verdict.promotable);
        }
    }

    #[test]
    fn test_missing_dates_officer_is_manual() {
        let verdict = evaluate(&member(Rank::O2, None, None), date(2025, 6, 15));
        assert_eq!(verdict.classification, Classification::ManualReview);
        assert_eq!(verdict.status, "Officer Rank");

        let verdict = evaluate(&member(Rank::parse("O-5"), None, None), date(2025, 6, 15));
        assert_eq!(verdict.classification, Classification::ManualReview);
    }

    #[test]
    fn test_unrecognized_rank_without_dates_needs_info() {
        let verdict = evaluate(&member(Rank::parse("CIV"), None, None), date(2025, 6, 15));
        assert_eq!(verdict.classification, Classification::InfoNeeded);
    }

    // -------------------------------------------------------------------------
    // BTZ select short circuit
    // -------------------------------------------------------------------------

    #[test]
    fn test_btz_selected_short_circuits_any_rank() {
        let mut m = member(Rank::E4, Some(date(2022, 1, 1)), Some(date(2025, 4, 1)));
        m.btz_status = BtzStatus::Selected;
        let verdict = evaluate(&m, date(2025, 6, 15));
        assert_eq!(verdict.classification, Classification::BtzSelect);
        assert_eq!(verdict.note, "New DOR: 2025-04-01");
    }

    // -------------------------------------------------------------------------
    // E-1 / E-2
    // -------------------------------------------------------------------------

    #[test]
    fn test_e1_exactly_six_months_is_eligible() {
        let today = date(2025, 7, 31);
        let m = member(Rank::E1, Some(date(2025, 1, 31)), Some(date(2025, 1, 31)));
        let verdict = evaluate(&m, today);
        assert_eq!(verdict.classification, Classification::Eligible);
        assert!(verdict.promotable);
        assert_eq!(verdict.action(), Action::Promote);
    }

    #[test]
    fn test_e1_one_day_short_is_not_eligible() {
        let today = date(2025, 7, 31);
        let m = member(Rank::E1, Some(date(2025, 2, 1)), Some(date(2025, 2, 1)));
        let verdict = evaluate(&m, today);
        assert_eq!(verdict.classification, Classification::NotEligible);
        assert!(!verdict.promotable);
        assert_eq!(verdict.note, "Req: 6m TIS/TIG.");
    }

    #[test]
    fn test_e1_needs_both_tis_and_tig() {
        let today = date(2025, 7, 31);
        let m = member(Rank::E1, Some(date(2024, 1, 1)), Some(date(2025, 5, 1)));
        assert_eq!(evaluate(&m, today).classification, Classification::NotEligible);
    }

    #[test]
    fn test_e2_uses_tig_only() {
        let today = date(2025, 11, 1);
        let eligible = member(Rank::E2, Some(date(2025, 1, 1)), Some(date(2025, 1, 1)));
        assert_eq!(evaluate(&eligible, today).classification, Classification::Eligible);

        let short = member(Rank::E2, Some(date(2020, 1, 1)), Some(date(2025, 2, 1)));
        let verdict = evaluate(&short, today);
        assert_eq!(verdict.classification, Classification::NotEligible);
        assert_eq!(verdict.note, "Req: 10m TIG.");
    }

    // -------------------------------------------------------------------------
    // E-3
    // -------------------------------------------------------------------------

    #[test]
    fn test_btz_schedule_dates() {
        let schedule = BtzSchedule::compute(date(2023, 2, 10), date(2024, 1, 10));
        // TIS path 2026-02-10 beats TIG path 2026-05-10
        assert_eq!(schedule.standard_date, date(2026, 2, 11));
        assert_eq!(schedule.btz_date, date(2025, 8, 11));
        assert_eq!(schedule.board_quarter, Quarter::of(schedule.btz_date).previous());
        assert_eq!(schedule.board_quarter, Quarter { year: 2025, quarter: 2 });
    }

    #[test]
    fn test_e3_standard_path_after_btz_not_selected() {
        let today = date(2025, 6, 15);
        // 3 years + 1 day TIS, 28 months + 1 day TIG
        let mut m = member(Rank::E3, Some(date(2022, 6, 14)), Some(date(2023, 2, 14)));
        m.btz_status = BtzStatus::NotSelected;
        let verdict = evaluate(&m, today);
        assert_eq!(verdict.classification, Classification::Eligible);
        assert!(verdict.promotable);
    }

    #[test]
    fn test_e3_not_selected_before_standard_date() {
        let today = date(2025, 6, 15);
        let mut m = member(Rank::E3, Some(date(2022, 6, 15)), Some(date(2023, 2, 15)));
        m.btz_status = BtzStatus::NotSelected;
        let verdict = evaluate(&m, today);
        assert_eq!(verdict.classification, Classification::BtzNotSelected);
        assert_eq!(verdict.note, "Eligible for SrA on 2025-06-16");
        assert!(!verdict.promotable);
    }

    fn btz_candidate() -> Member {
        // Board quarter Q2 2025, BTZ date 2025-08-11
        member(Rank::E3, Some(date(2023, 2, 10)), Some(date(2024, 1, 10)))
    }

    #[test]
    fn test_e3_board_this_quarter_carries_btz_date() {
        let verdict = evaluate(&btz_candidate(), date(2025, 5, 15));
        assert_eq!(verdict.classification, Classification::BtzThisQ);
        assert_eq!(verdict.classification.tag(), "btz-this-q");
        assert_eq!(verdict.board_promotion_date, Some(date(2025, 8, 11)));
        assert_eq!(verdict.status, "In Q2 2025 BTZ Window");
        assert_eq!(verdict.action(), Action::BtzDecision);
        assert!(!verdict.promotable);
    }

    #[test]
    fn test_e3_board_next_quarter_alerts() {
        let verdict = evaluate(&btz_candidate(), date(2025, 2, 1));
        assert_eq!(verdict.classification, Classification::BtzNextQ);
        assert_eq!(verdict.classification.alert(), Some(Alert::Urgent));
        assert_eq!(verdict.note, "Board for Q2 2025");
        assert_eq!(verdict.board_promotion_date, None);
    }

    #[test]
    fn test_e3_board_two_quarters_out_warns() {
        let verdict = evaluate(&btz_candidate(), date(2024, 11, 1));
        assert_eq!(verdict.classification, Classification::BtzTwoQ);
        assert_eq!(verdict.classification.alert(), Some(Alert::Warning));
        assert_eq!(verdict.action(), Action::None);
    }

    #[test]
    fn test_e3_board_concluded_still_actionable() {
        let verdict = evaluate(&btz_candidate(), date(2025, 10, 1));
        assert_eq!(verdict.classification, Classification::BoardConcluded);
        assert_eq!(verdict.note, "Board was Q2 2025");
        assert_eq!(verdict.board_promotion_date, Some(date(2025, 8, 11)));
        assert_eq!(verdict.action(), Action::BtzDecision);
    }

    #[test]
    fn test_e3_board_far_out_not_eligible() {
        let verdict = evaluate(&btz_candidate(), date(2024, 6, 1));
        assert_eq!(verdict.classification, Classification::NotEligible);
        assert_eq!(verdict.note, "BTZ board: Q2 2025");
    }

    #[test]
    fn test_e3_board_quarter_across_year_boundary() {
        // Reached 2026-07-20 -> BTZ 2026-01-21 (Q1 2026) -> board Q4 2025
        let m = member(Rank::E3, Some(date(2023, 7, 20)), Some(date(2024, 12, 1)));
        let verdict = evaluate(&m, date(2025, 11, 5));
        assert_eq!(verdict.classification, Classification::BtzThisQ);
        assert_eq!(verdict.board_promotion_date, Some(date(2026, 1, 21)));
    }

    // -------------------------------------------------------------------------
    // E-4 through E-9
    // -------------------------------------------------------------------------

    #[test]
    fn test_e4_meeting_requirements_is_board_eligible() {
        let today = date(2025, 6, 15);
        let m = member(Rank::E4, Some(date(2022, 6, 14)), Some(date(2024, 12, 14)));
        let verdict = evaluate(&m, today);
        assert_eq!(verdict.classification, Classification::PromoEligible);
        assert_eq!(verdict.status, "Board Eligible for E-5");
        assert_eq!(verdict.action(), Action::BoardDecision);
        assert!(!verdict.promotable);
    }

    #[test]
    fn test_board_grades_report_specific_requirement() {
        let today = date(2025, 6, 15);
        let cases = [
            (Rank::E5, "Req: 60m TIS & 23m TIG."),
            (Rank::E6, "Req: 96m TIS & 24m TIG."),
            (Rank::E7, "Req: 132m TIS & 20m TIG."),
            (Rank::E8, "Req: 168m TIS & 21m TIG."),
        ];
        for (rank, note) in cases {
            let m = member(rank, Some(date(2024, 1, 1)), Some(date(2025, 1, 1)));
            let verdict = evaluate(&m, today);
            assert_eq!(verdict.classification, Classification::NotEligible);
            assert_eq!(verdict.note, note);
        }
    }

    #[test]
    fn test_board_grade_thresholds_are_inclusive() {
        let today = date(2025, 6, 15);
        // E-7: 132 months TIS, 20 months TIG
        let m = member(Rank::E7, Some(date(2014, 6, 1)), Some(date(2023, 10, 1)));
        assert_eq!(evaluate(&m, today).classification, Classification::PromoEligible);
    }

    #[test]
    fn test_board_selected_with_date() {
        let mut m = member(Rank::E5, Some(date(2015, 1, 1)), Some(date(2020, 1, 1)));
        m.promotion_status = BoardStatus::Selected;
        m.promotion_date = Some(date(2025, 9, 1));
        let verdict = evaluate(&m, date(2025, 6, 15));
        assert_eq!(verdict.classification, Classification::PromoSelected);
        assert_eq!(verdict.status, "Selected for E-6");
        assert_eq!(verdict.note, "Promotes 2025-09-01.");
    }

    #[test]
    fn test_board_selected_without_date_falls_through() {
        let mut m = member(Rank::E5, Some(date(2015, 1, 1)), Some(date(2020, 1, 1)));
        m.promotion_status = BoardStatus::Selected;
        let verdict = evaluate(&m, date(2025, 6, 15));
        assert_eq!(verdict.classification, Classification::PromoEligible);
    }

    #[test]
    fn test_board_not_selected() {
        let mut m = member(Rank::E6, Some(date(2010, 1, 1)), Some(date(2020, 1, 1)));
        m.promotion_status = BoardStatus::NotSelected;
        let verdict = evaluate(&m, date(2025, 6, 15));
        assert_eq!(verdict.classification, Classification::PromoNotSelected);
        assert_eq!(verdict.note, "Eligible to compete next cycle.");
        assert_eq!(verdict.action(), Action::BoardDecision);
    }

    #[test]
    fn test_e9_is_chief() {
        let m = member(Rank::E9, Some(date(2000, 1, 1)), Some(date(2020, 1, 1)));
        let verdict = evaluate(&m, date(2025, 6, 15));
        assert_eq!(verdict.status, "Chief!");
        assert_eq!(verdict.classification, Classification::ManualReview);
    }

    #[test]
    fn test_officer_with_dates_reviews_manually() {
        let m = member(Rank::O3, Some(date(2015, 1, 1)), Some(date(2021, 1, 1)));
        let verdict = evaluate(&m, date(2025, 6, 15));
        assert_eq!(verdict.status, "Review Manually");
        assert_eq!(verdict.classification, Classification::ManualReview);
    }

    #[test]
    fn test_evaluate_now_uses_clock() {
        let m = member(Rank::E1, Some(date(2025, 1, 31)), Some(date(2025, 1, 31)));
        let verdict = evaluate_now(&m, &FixedClock(date(2025, 7, 31)));
        assert_eq!(verdict.classification, Classification::Eligible);
    }

    #[test]
    fn test_evaluate_does_not_mutate() {
        let m = btz_candidate();
        let before = m.clone();
        let _ = evaluate(&m, date(2025, 5, 15));
        assert_eq!(m, before);
    }

    #[test]
    fn test_classification_serializes_as_tag() {
        let json = serde_json::to_string(&Classification::PromoEligible).unwrap();
        assert_eq!(json, "\"promo-eligible\"");
        assert_eq!(Classification::BoardConcluded.tag(), "board-concluded");
    }
}
