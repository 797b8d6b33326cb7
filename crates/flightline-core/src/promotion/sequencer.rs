//! Rank transitions.
//!
//! Every function here takes a member by reference and returns a new value.
//! A refused transition comes back as a [`PromotionError`] and the caller's
//! member is left as it was.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::models::{BoardStatus, BtzStatus, Member, Rank};

use super::dates::{add_months, day_after, months_between};
use super::eligibility::{
    BtzSchedule, E1_MIN_TIG_MONTHS, E1_MIN_TIS_MONTHS, E2_MIN_TIG_MONTHS,
};
use super::error::PromotionError;

/// How a promotion in a sweep was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionKind {
    /// A recorded board selection whose date has arrived.
    Board,
    /// TIS/TIG thresholds for E-1, E-2 or a non-selected E-3.
    Automatic,
}

/// One promotion applied during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRecord {
    pub member_id: String,
    pub name: String,
    pub from: Rank,
    pub to: Rank,
    pub dor: NaiveDate,
    pub kind: PromotionKind,
}

/// Result of [`process_auto_promotions`].
#[derive(Debug, Clone, Default)]
pub struct SweepOutcome {
    /// Members that were promoted, in their new state. Unchanged members are omitted.
    pub updated: Vec<Member>,
    pub promotions: Vec<PromotionRecord>,
}

impl SweepOutcome {
    /// Whether anything needs to be persisted.
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Advance one grade up the ladder with `new_date` as the date of rank.
pub fn apply_board_promotion(member: &Member, new_date: NaiveDate) -> Result<Member, PromotionError> {
    let next = next_grade(&member.rank)?;

    let mut promoted = member.clone();
    promoted.rank = next;
    promoted.dor_date = Some(new_date);
    Ok(promoted)
}

/// Threshold-based promotion for E-1, E-2 and E-3 members not selected for BTZ.
///
/// Returns `None` when the member does not qualify. E-4 and above always need
/// a board selection, and members with a BTZ selection on record are skipped.
pub fn apply_automatic_promotion(member: &Member, today: NaiveDate) -> Option<Member> {
    let new_dor = automatic_dor(member, today)?;
    apply_board_promotion(member, new_dor).ok()
}

/// The date of rank an automatic promotion would carry, if one is due.
fn automatic_dor(member: &Member, today: NaiveDate) -> Option<NaiveDate> {
    let (tis, dor) = (member.tis_date?, member.dor_date?);
    if member.btz_status == BtzStatus::Selected {
        return None;
    }

    let new_dor = match member.rank {
        Rank::E1 => {
            let met = months_between(tis, today) >= E1_MIN_TIS_MONTHS
                && months_between(dor, today) >= E1_MIN_TIG_MONTHS;
            if !met {
                return None;
            }
            let tis_path = day_after(add_months(tis, E1_MIN_TIS_MONTHS));
            let tig_path = day_after(add_months(dor, E1_MIN_TIG_MONTHS));
            tis_path.max(tig_path)
        }
        Rank::E2 => {
            if months_between(dor, today) < E2_MIN_TIG_MONTHS {
                return None;
            }
            day_after(add_months(dor, E2_MIN_TIG_MONTHS))
        }
        Rank::E3 => {
            if member.btz_status != BtzStatus::NotSelected {
                return None;
            }
            let standard = BtzSchedule::compute(tis, dor).standard_date;
            if today < standard {
                return None;
            }
            standard
        }
        _ => return None,
    };

    Some(new_dor)
}

/// Record the BTZ board outcome.
///
/// Selected: rank becomes E-4, the prior date of rank moves to
/// `original_dor` and `new_dor` takes its place. Not selected: only the
/// status changes, and the member follows the standard path from then on.
pub fn apply_btz_selection(
    member: &Member,
    selected: bool,
    new_dor: Option<NaiveDate>,
) -> Result<Member, PromotionError> {
    let mut updated = member.clone();

    if selected {
        let new_dor = new_dor.ok_or(PromotionError::MissingDate("BTZ date of rank"))?;
        updated.btz_status = BtzStatus::Selected;
        updated.original_dor = member.dor_date;
        updated.dor_date = Some(new_dor);
        updated.rank = Rank::E4;
    } else {
        updated.btz_status = BtzStatus::NotSelected;
    }

    Ok(updated)
}

/// Record a selection board outcome for E-4 through E-8.
///
/// A selection is stored with its promotion date and applied by the next
/// sweep on or after that date.
pub fn apply_board_selection(
    member: &Member,
    selected: bool,
    promotion_date: Option<NaiveDate>,
) -> Result<Member, PromotionError> {
    if !member.rank.is_board_grade() {
        return Err(PromotionError::NotBoardRank(member.rank.clone()));
    }

    let mut updated = member.clone();

    if selected {
        let date = promotion_date.ok_or(PromotionError::MissingDate("promotion date"))?;
        updated.promotion_status = BoardStatus::Selected;
        updated.promotion_date = Some(date);
    } else {
        updated.promotion_status = BoardStatus::NotSelected;
        updated.promotion_date = None;
    }

    Ok(updated)
}

/// Apply a recorded board selection once its date has arrived.
///
/// Returns `Ok(None)` when nothing is due.
pub fn apply_due_board_promotion(
    member: &Member,
    today: NaiveDate,
) -> Result<Option<Member>, PromotionError> {
    let Some(date) = due_board_date(member, today) else {
        return Ok(None);
    };

    let mut promoted = apply_board_promotion(member, date)?;
    promoted.promotion_status = BoardStatus::None;
    promoted.promotion_date = None;
    Ok(Some(promoted))
}

fn due_board_date(member: &Member, today: NaiveDate) -> Option<NaiveDate> {
    match (member.promotion_status, member.promotion_date) {
        (BoardStatus::Selected, Some(date)) if today >= date => Some(date),
        _ => None,
    }
}

/// Run one promotion pass over the whole roster.
///
/// `today` is read from the clock once and every member is judged against
/// it. Each member gets at most one promotion per pass: a due board
/// promotion first, otherwise a threshold-based one.
pub fn process_auto_promotions(members: &[Member], clock: &dyn Clock) -> SweepOutcome {
    let today = clock.today();
    let mut outcome = SweepOutcome::default();

    for member in members {
        if let Some((updated, record)) = sweep_member(member, today) {
            info!(
                member = %record.member_id,
                from = %record.from,
                to = %record.to,
                dor = %record.dor,
                kind = ?record.kind,
                "Applied promotion"
            );
            outcome.updated.push(updated);
            outcome.promotions.push(record);
        }
    }

    outcome
}

fn sweep_member(member: &Member, today: NaiveDate) -> Option<(Member, PromotionRecord)> {
    let board = due_board_date(member, today).and_then(|date| match apply_due_board_promotion(member, today) {
        Ok(promoted) => promoted.map(|m| (m, date)),
        Err(e) => {
            warn!(member = %member.id, rank = %member.rank, error = %e, "Scheduled board promotion not applied");
            None
        }
    });

    let (updated, kind, dor) = match board {
        Some((promoted, date)) => (promoted, PromotionKind::Board, date),
        None => {
            let dor = automatic_dor(member, today)?;
            let promoted = apply_board_promotion(member, dor).ok()?;
            (promoted, PromotionKind::Automatic, dor)
        }
    };

    let record = PromotionRecord {
        member_id: member.id.clone(),
        name: member.display_name(),
        from: member.rank.clone(),
        to: updated.rank.clone(),
        dor,
        kind,
    };
    Some((updated, record))
}

fn next_grade(rank: &Rank) -> Result<Rank, PromotionError> {
    if rank.ladder_index().is_none() {
        return Err(PromotionError::InvalidRank(rank.clone()));
    }
    rank.next_in_ladder()
        .ok_or_else(|| PromotionError::LadderExhausted(rank.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::promotion::eligibility::{evaluate, Classification};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(id: &str, rank: Rank, tis: NaiveDate, dor: NaiveDate) -> Member {
        Member {
            id: id.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Doe".to_string(),
            rank,
            tis_date: Some(tis),
            dor_date: Some(dor),
            ..Default::default()
        }
    }

    // ===== Board promotion =====

    #[test]
    fn test_board_promotion_advances_one_grade() {
        let m = member("card-1", Rank::E4, date(2020, 1, 1), date(2022, 1, 1));
        let promoted = apply_board_promotion(&m, date(2025, 6, 1)).unwrap();
        assert_eq!(promoted.rank, Rank::E5);
        assert_eq!(promoted.dor_date, Some(date(2025, 6, 1)));
        assert_eq!(promoted.tis_date, m.tis_date);
    }

    #[test]
    fn test_board_promotion_at_e9_fails_without_mutation() {
        let m = member("card-1", Rank::E9, date(1995, 1, 1), date(2020, 1, 1));
        let before = m.clone();
        let result = apply_board_promotion(&m, date(2025, 6, 1));
        assert_eq!(result, Err(PromotionError::LadderExhausted(Rank::E9)));
        assert_eq!(m, before);
    }

    #[test]
    fn test_board_promotion_off_ladder_is_invalid() {
        let officer = member("card-1", Rank::O2, date(2020, 1, 1), date(2022, 1, 1));
        assert_eq!(
            apply_board_promotion(&officer, date(2025, 6, 1)),
            Err(PromotionError::InvalidRank(Rank::O2))
        );

        let unknown = member("card-2", Rank::parse("CIV"), date(2020, 1, 1), date(2022, 1, 1));
        assert!(matches!(
            apply_board_promotion(&unknown, date(2025, 6, 1)),
            Err(PromotionError::InvalidRank(_))
        ));
    }

    // ===== Automatic promotion =====

    #[test]
    fn test_auto_e1_takes_later_of_both_paths() {
        let m = member("card-1", Rank::E1, date(2024, 10, 15), date(2024, 11, 20));
        let promoted = apply_automatic_promotion(&m, date(2025, 6, 1)).unwrap();
        assert_eq!(promoted.rank, Rank::E2);
        assert_eq!(promoted.dor_date, Some(date(2025, 5, 21)));
    }

    #[test]
    fn test_auto_e1_not_due() {
        let m = member("card-1", Rank::E1, date(2025, 1, 1), date(2025, 1, 1));
        assert!(apply_automatic_promotion(&m, date(2025, 6, 30)).is_none());
    }

    #[test]
    fn test_auto_e2_uses_tig_path() {
        let m = member("card-1", Rank::E2, date(2023, 1, 1), date(2024, 8, 10));
        let promoted = apply_automatic_promotion(&m, date(2025, 6, 15)).unwrap();
        assert_eq!(promoted.rank, Rank::E3);
        assert_eq!(promoted.dor_date, Some(date(2025, 6, 11)));
    }

    #[test]
    fn test_auto_e3_requires_btz_not_selected() {
        let today = date(2025, 6, 15);
        let mut m = member("card-1", Rank::E3, date(2022, 6, 14), date(2023, 2, 14));

        // Undecided BTZ status never auto-promotes, even past the standard date.
        assert!(apply_automatic_promotion(&m, today).is_none());

        m.btz_status = BtzStatus::NotSelected;
        let promoted = apply_automatic_promotion(&m, today).unwrap();
        assert_eq!(promoted.rank, Rank::E4);
        assert_eq!(promoted.dor_date, Some(today));
    }

    #[test]
    fn test_auto_skips_btz_selected_and_board_grades() {
        let today = date(2025, 6, 15);
        let mut selected = member("card-1", Rank::E4, date(2020, 1, 1), date(2021, 1, 1));
        selected.btz_status = BtzStatus::Selected;
        assert!(apply_automatic_promotion(&selected, today).is_none());

        let board = member("card-2", Rank::E5, date(2010, 1, 1), date(2015, 1, 1));
        assert!(apply_automatic_promotion(&board, today).is_none());
    }

    #[test]
    fn test_auto_needs_both_dates() {
        let mut m = member("card-1", Rank::E1, date(2020, 1, 1), date(2020, 1, 1));
        m.dor_date = None;
        assert!(apply_automatic_promotion(&m, date(2025, 6, 15)).is_none());
    }

    // ===== BTZ selection =====

    #[test]
    fn test_btz_selection_selected() {
        let m = member("card-1", Rank::E3, date(2023, 1, 1), date(2024, 1, 10));
        let updated = apply_btz_selection(&m, true, Some(date(2025, 4, 1))).unwrap();
        assert_eq!(updated.rank, Rank::E4);
        assert_eq!(updated.dor_date, Some(date(2025, 4, 1)));
        assert_eq!(updated.original_dor, Some(date(2024, 1, 10)));
        assert_eq!(updated.btz_status, BtzStatus::Selected);

        let value = serde_json::to_value(&updated).unwrap();
        assert_eq!(value["btzStatus"], "selected");
        assert_eq!(value["dorDate"], "2025-04-01");
    }

    #[test]
    fn test_btz_selection_not_selected_keeps_rank() {
        let m = member("card-1", Rank::E3, date(2023, 1, 1), date(2024, 1, 10));
        let updated = apply_btz_selection(&m, false, None).unwrap();
        assert_eq!(updated.rank, Rank::E3);
        assert_eq!(updated.dor_date, m.dor_date);
        assert_eq!(updated.btz_status, BtzStatus::NotSelected);
    }

    #[test]
    fn test_btz_selection_requires_date() {
        let m = member("card-1", Rank::E3, date(2023, 1, 1), date(2024, 1, 10));
        assert_eq!(
            apply_btz_selection(&m, true, None),
            Err(PromotionError::MissingDate("BTZ date of rank"))
        );
    }

    // ===== Board selection =====

    #[test]
    fn test_board_selection_records_outcome() {
        let m = member("card-1", Rank::E6, date(2010, 1, 1), date(2020, 1, 1));
        let selected = apply_board_selection(&m, true, Some(date(2025, 9, 1))).unwrap();
        assert_eq!(selected.promotion_status, BoardStatus::Selected);
        assert_eq!(selected.promotion_date, Some(date(2025, 9, 1)));
        assert_eq!(selected.rank, Rank::E6);

        let passed = apply_board_selection(&selected, false, None).unwrap();
        assert_eq!(passed.promotion_status, BoardStatus::NotSelected);
        assert_eq!(passed.promotion_date, None);
    }

    #[test]
    fn test_board_selection_rejects_other_grades() {
        let m = member("card-1", Rank::E3, date(2023, 1, 1), date(2024, 1, 1));
        assert_eq!(
            apply_board_selection(&m, true, Some(date(2025, 9, 1))),
            Err(PromotionError::NotBoardRank(Rank::E3))
        );
        let chief = member("card-2", Rank::E9, date(1995, 1, 1), date(2020, 1, 1));
        assert!(apply_board_selection(&chief, false, None).is_err());
    }

    // ===== Sweep =====

    #[test]
    fn test_e4_board_scenario_end_to_end() {
        let today = date(2025, 6, 15);
        let m = member("card-4", Rank::E4, date(2022, 6, 14), date(2024, 12, 14));
        assert_eq!(evaluate(&m, today).classification, Classification::PromoEligible);

        let selected = apply_board_selection(&m, true, Some(date(2025, 8, 1))).unwrap();

        // Not yet due
        let early = process_auto_promotions(&[selected.clone()], &FixedClock(date(2025, 7, 31)));
        assert!(!early.changed());

        let outcome = process_auto_promotions(&[selected], &FixedClock(date(2025, 8, 1)));
        assert!(outcome.changed());
        let promoted = &outcome.updated[0];
        assert_eq!(promoted.rank, Rank::E5);
        assert_eq!(promoted.dor_date, Some(date(2025, 8, 1)));
        assert_eq!(promoted.promotion_status, BoardStatus::None);
        assert_eq!(promoted.promotion_date, None);
        assert_eq!(outcome.promotions[0].kind, PromotionKind::Board);
        assert_eq!(outcome.promotions[0].from, Rank::E4);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let clock = FixedClock(date(2025, 6, 15));
        let mut roster = vec![
            member("card-1", Rank::E1, date(2024, 11, 1), date(2024, 11, 1)),
            member("card-2", Rank::E2, date(2024, 1, 1), date(2024, 8, 1)),
            member("card-3", Rank::E5, date(2015, 1, 1), date(2020, 1, 1)),
        ];
        roster[2].promotion_status = BoardStatus::Selected;
        roster[2].promotion_date = Some(date(2025, 6, 1));

        let first = process_auto_promotions(&roster, &clock);
        assert_eq!(first.promotions.len(), 3);

        for updated in first.updated {
            if let Some(slot) = roster.iter_mut().find(|m| m.id == updated.id) {
                *slot = updated;
            }
        }

        let second = process_auto_promotions(&roster, &clock);
        assert!(!second.changed());
        assert!(second.promotions.is_empty());
    }

    #[test]
    fn test_sweep_records_date_of_rank_from_each_path() {
        let mut board = member("card-5", Rank::E5, date(2015, 1, 1), date(2020, 1, 1));
        board.promotion_status = BoardStatus::Selected;
        board.promotion_date = Some(date(2025, 6, 1));
        let auto = member("card-2", Rank::E2, date(2024, 1, 1), date(2024, 8, 1));

        let outcome = process_auto_promotions(&[board, auto], &FixedClock(date(2025, 6, 15)));
        assert_eq!(outcome.promotions.len(), 2);
        assert_eq!(outcome.promotions[0].kind, PromotionKind::Board);
        assert_eq!(outcome.promotions[0].dor, date(2025, 6, 1));
        assert_eq!(outcome.promotions[1].kind, PromotionKind::Automatic);
        assert_eq!(outcome.promotions[1].dor, date(2025, 6, 2));
        for (updated, record) in outcome.updated.iter().zip(&outcome.promotions) {
            assert_eq!(updated.dor_date, Some(record.dor));
        }
    }

    #[test]
    fn test_sweep_applies_one_promotion_per_member() {
        // Due board promotion at E-4; the automatic path must not also fire.
        let mut m = member("card-1", Rank::E4, date(2010, 1, 1), date(2015, 1, 1));
        m.promotion_status = BoardStatus::Selected;
        m.promotion_date = Some(date(2025, 1, 1));
        let outcome = process_auto_promotions(&[m], &FixedClock(date(2025, 6, 15)));
        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(outcome.updated[0].rank, Rank::E5);
    }

    #[test]
    fn test_sweep_skips_exhausted_board_promotion() {
        let mut m = member("card-1", Rank::E9, date(1995, 1, 1), date(2020, 1, 1));
        m.promotion_status = BoardStatus::Selected;
        m.promotion_date = Some(date(2025, 1, 1));
        let outcome = process_auto_promotions(&[m], &FixedClock(date(2025, 6, 15)));
        assert!(!outcome.changed());
    }

    #[test]
    fn test_sweep_leaves_input_untouched() {
        let roster = vec![member("card-1", Rank::E1, date(2020, 1, 1), date(2020, 1, 1))];
        let before = roster.clone();
        let outcome = process_auto_promotions(&roster, &FixedClock(date(2025, 6, 15)));
        assert!(outcome.changed());
        assert_eq!(roster, before);
    }
}
