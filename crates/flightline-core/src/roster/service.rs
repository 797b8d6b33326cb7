//! Roster operations over a [`RosterStore`].
//!
//! The promotion engine works on member values; this layer fetches them,
//! hands them to the engine, and writes the results back. It keeps one
//! explicit snapshot of the last fetch that callers can invalidate.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::models::{CustomField, FieldType, Member, Team};
use crate::promotion::{self, SweepOutcome};

use super::chart::{supervisees, would_create_cycle};
use super::edit::new_field_id;
use super::error::RosterError;
use super::store::RosterStore;

type TeamLists = Vec<(Team, Vec<Member>)>;

pub struct RosterService<S> {
    store: S,
    snapshot: RwLock<Option<Vec<Member>>>,
}

impl<S: RosterStore> RosterService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            snapshot: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ===== Reading =====

    /// Every member across all teams, straight from the store.
    pub async fn fetch_all(&self) -> Result<Vec<Member>, RosterError> {
        let teams = self.fetch_teams().await?;
        let members = distinct_members(&teams);
        debug!(count = members.len(), "Fetched roster");
        Ok(members)
    }

    /// The last fetched roster, fetching when there is none or when forced.
    pub async fn members(&self, force_refresh: bool) -> Result<Vec<Member>, RosterError> {
        if !force_refresh {
            if let Some(ref members) = *self.snapshot.read().await {
                return Ok(members.clone());
            }
        }

        let members = self.fetch_all().await?;
        *self.snapshot.write().await = Some(members.clone());
        Ok(members)
    }

    /// Drop the snapshot so the next read goes to the store.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    async fn fetch_teams(&self) -> Result<TeamLists, RosterError> {
        let fetches = Team::ALL
            .into_iter()
            .map(|team| async move { (team, self.store.fetch_team(team).await) });
        let results = join_all(fetches).await;

        let mut teams = Vec::with_capacity(results.len());
        for (team, result) in results {
            match result {
                Ok(mut list) => {
                    // The array a member sits in wins over its teamSelect value.
                    for member in list.iter_mut() {
                        if member.team != team {
                            debug!(member = %member.id, stored = %member.team, actual = %team, "Correcting team assignment");
                            member.team = team;
                        }
                    }
                    teams.push((team, list));
                }
                Err(e) => {
                    warn!(team = %team, error = %e, "Failed to fetch team roster");
                    return Err(RosterError::Store(e));
                }
            }
        }
        Ok(teams)
    }

    async fn find(&self, id: &str) -> Result<Member, RosterError> {
        self.fetch_all()
            .await?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| RosterError::MemberNotFound(id.to_string()))
    }

    // ===== Writing =====

    /// Insert or update a member in the team it names.
    ///
    /// An existing record's custom values and unknown keys are kept unless
    /// the new value overrides them. If the member moved teams, the old entry
    /// is removed in the same write.
    pub async fn persist(&self, member: Member) -> Result<(), RosterError> {
        let mut teams = self.fetch_teams().await?;
        let touched = upsert(&mut teams, member);
        self.write_teams(teams, &touched).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Remove a member. Refused while anyone lists them as supervisor.
    pub async fn delete(&self, id: &str) -> Result<Member, RosterError> {
        let members = self.fetch_all().await?;
        let reports = supervisees(&members, id).len();
        if reports > 0 {
            return Err(RosterError::HasSupervisees {
                id: id.to_string(),
                count: reports,
            });
        }

        let mut teams = self.fetch_teams().await?;
        let (team, removed) = remove(&mut teams, id).ok_or_else(|| RosterError::MemberNotFound(id.to_string()))?;
        self.write_teams(teams, &[team]).await?;
        self.invalidate().await;

        info!(member = %id, team = %team, "Deleted member");
        Ok(removed)
    }

    /// Reassign a member to another team with one multi-path write.
    pub async fn move_to_team(&self, id: &str, team: Team) -> Result<(), RosterError> {
        let mut teams = self.fetch_teams().await?;
        let (old_team, mut member) = remove(&mut teams, id).ok_or_else(|| RosterError::MemberNotFound(id.to_string()))?;
        if old_team == team {
            return Ok(());
        }

        member.team = team;
        let touched = upsert(&mut teams, member);
        let mut all_touched = vec![old_team];
        all_touched.extend(touched);
        self.write_teams(teams, &all_touched).await?;
        self.invalidate().await;

        debug!(member = %id, from = %old_team, to = %team, "Moved member");
        Ok(())
    }

    /// Set or clear a member's supervisor.
    ///
    /// A new supervisor also restarts `sup_start_date` at `today`. Picking the
    /// same supervisor again changes nothing.
    pub async fn assign_supervisor(
        &self,
        id: &str,
        supervisor: Option<&str>,
        today: NaiveDate,
    ) -> Result<Member, RosterError> {
        let members = self.fetch_all().await?;
        let mut member = members
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| RosterError::MemberNotFound(id.to_string()))?;

        if member.supervisor.as_deref() == supervisor {
            return Ok(member);
        }

        match supervisor {
            Some(sup) => {
                if sup == id {
                    return Err(RosterError::SelfSupervision(id.to_string()));
                }
                if !members.iter().any(|m| m.id == sup) {
                    return Err(RosterError::MemberNotFound(sup.to_string()));
                }
                if would_create_cycle(&members, id, sup) {
                    return Err(RosterError::SupervisionCycle {
                        id: id.to_string(),
                        supervisor: sup.to_string(),
                    });
                }
                member.supervisor = Some(sup.to_string());
                member.sup_start_date = Some(today);
            }
            None => {
                member.supervisor = None;
                member.sup_start_date = None;
            }
        }

        self.persist(member.clone()).await?;
        Ok(member)
    }

    // ===== Promotion actions =====

    /// Manual promotion to the next grade with `new_dor`.
    pub async fn promote(&self, id: &str, new_dor: NaiveDate) -> Result<Member, RosterError> {
        let member = self.find(id).await?;
        let promoted = promotion::apply_board_promotion(&member, new_dor)?;
        self.persist(promoted.clone()).await?;
        info!(member = %id, from = %member.rank, to = %promoted.rank, dor = %new_dor, "Promoted member");
        Ok(promoted)
    }

    pub async fn record_btz(
        &self,
        id: &str,
        selected: bool,
        new_dor: Option<NaiveDate>,
    ) -> Result<Member, RosterError> {
        let member = self.find(id).await?;
        let updated = promotion::apply_btz_selection(&member, selected, new_dor)?;
        self.persist(updated.clone()).await?;
        info!(member = %id, selected, "Recorded BTZ outcome");
        Ok(updated)
    }

    pub async fn record_board(
        &self,
        id: &str,
        selected: bool,
        promotion_date: Option<NaiveDate>,
    ) -> Result<Member, RosterError> {
        let member = self.find(id).await?;
        let updated = promotion::apply_board_selection(&member, selected, promotion_date)?;
        self.persist(updated.clone()).await?;
        info!(member = %id, selected, "Recorded board outcome");
        Ok(updated)
    }

    /// Fetch the roster, run one promotion sweep and write back every team
    /// that changed in a single update.
    pub async fn run_sweep(&self, clock: &dyn Clock) -> Result<SweepOutcome, RosterError> {
        let mut teams = self.fetch_teams().await?;
        let members = distinct_members(&teams);

        let outcome = promotion::process_auto_promotions(&members, clock);
        if !outcome.changed() {
            debug!("Sweep found nothing to promote");
            return Ok(outcome);
        }

        let mut touched = Vec::new();
        for updated in &outcome.updated {
            touched.extend(upsert(&mut teams, updated.clone()));
        }
        self.write_teams(teams, &touched).await?;
        self.invalidate().await;

        info!(count = outcome.promotions.len(), "Sweep applied promotions");
        Ok(outcome)
    }

    // ===== Custom fields =====

    pub async fn fields(&self) -> Result<Vec<CustomField>, RosterError> {
        Ok(self.store.fetch_fields().await?)
    }

    pub async fn add_field(
        &self,
        name: &str,
        field_type: FieldType,
        show_on_card: bool,
        now: DateTime<Utc>,
    ) -> Result<CustomField, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyFieldName);
        }

        let field = CustomField {
            id: new_field_id(now),
            name: name.to_string(),
            field_type,
            show_on_card,
        };
        let mut fields = self.store.fetch_fields().await?;
        fields.push(field.clone());
        self.store.replace_fields(&fields).await?;
        debug!(field = %field.id, "Added custom field");
        Ok(field)
    }

    /// Remove a field definition. Values already stored on members are left alone.
    pub async fn delete_field(&self, id: &str) -> Result<(), RosterError> {
        let mut fields = self.store.fetch_fields().await?;
        fields.retain(|f| f.id != id);
        self.store.replace_fields(&fields).await?;
        Ok(())
    }

    pub async fn set_field_on_card(&self, id: &str, show_on_card: bool) -> Result<(), RosterError> {
        let mut fields = self.store.fetch_fields().await?;
        if let Some(field) = fields.iter_mut().find(|f| f.id == id) {
            field.show_on_card = show_on_card;
        }
        self.store.replace_fields(&fields).await?;
        Ok(())
    }

    async fn write_teams(&self, teams: TeamLists, touched: &[Team]) -> Result<(), RosterError> {
        let mut changed: Vec<(Team, Vec<Member>)> = teams
            .into_iter()
            .filter(|(team, _)| touched.contains(team))
            .collect();

        let result = if changed.len() == 1 {
            let (team, list) = changed.remove(0);
            self.store.replace_team(team, &list).await
        } else {
            self.store.replace_teams(&changed).await
        };

        result.map_err(|e| {
            warn!(error = %e, "Failed to write roster");
            RosterError::Store(e)
        })
    }
}

/// Place `member` in its team's list, replacing an entry with the same id
/// anywhere. Returns the teams whose lists changed.
/// One entry per id in team order. A repeated id keeps its first entry,
/// which is also the one `upsert` updates.
fn distinct_members(teams: &TeamLists) -> Vec<Member> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut members = Vec::new();
    for (_, list) in teams {
        for member in list {
            if seen.insert(member.id.as_str()) {
                members.push(member.clone());
            } else {
                warn!(member = %member.id, team = %member.team, "Ignoring duplicate roster entry");
            }
        }
    }
    members
}

fn upsert(teams: &mut TeamLists, mut member: Member) -> Vec<Team> {
    let mut touched = Vec::new();

    let existing = teams.iter().enumerate().find_map(|(ti, (_, list))| {
        list.iter().position(|m| m.id == member.id).map(|pos| (ti, pos))
    });

    if let Some((ti, pos)) = existing {
        let (old_team, list) = &mut teams[ti];
        merge_stored(&mut member, &list[pos]);
        if *old_team == member.team {
            list[pos] = member;
            return vec![*old_team];
        }
        list.remove(pos);
        touched.push(*old_team);
    }

    let team = member.team;
    match teams.iter_mut().find(|(t, _)| *t == team) {
        Some((_, list)) => list.push(member),
        None => teams.push((team, vec![member])),
    }
    touched.push(team);
    touched
}

/// Keep stored custom values and unknown keys the update does not override.
fn merge_stored(member: &mut Member, stored: &Member) {
    for (key, value) in &stored.custom_data {
        member.custom_data.entry(key.clone()).or_insert_with(|| value.clone());
    }
    for (key, value) in &stored.extra {
        member.extra.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

fn remove(teams: &mut TeamLists, id: &str) -> Option<(Team, Member)> {
    for (team, list) in teams.iter_mut() {
        if let Some(pos) = list.iter().position(|m| m.id == id) {
            return Some((*team, list.remove(pos)));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{BoardStatus, Rank};
    use crate::roster::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(id: &str, rank: Rank, team: Team) -> Member {
        Member {
            id: id.to_string(),
            last_name: id.to_uppercase(),
            rank,
            team,
            ..Default::default()
        }
    }

    fn service(members: Vec<Member>) -> RosterService<MemoryStore> {
        RosterService::new(MemoryStore::with_members(members, Vec::new()))
    }

    #[tokio::test]
    async fn test_fetch_all_dedupes_and_corrects_team() {
        let svc = service(Vec::new());
        let mut misfiled = member("card-1", Rank::E3, Team::Inbound);
        misfiled.team = Team::Inbound;
        svc.store()
            .replace_teams(&[
                (Team::Brass, vec![misfiled.clone()]),
                (Team::Sbirs, vec![member("card-1", Rank::E5, Team::Sbirs)]),
            ])
            .await
            .unwrap();

        let all = svc.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].team, Team::Brass);
    }

    #[tokio::test]
    async fn test_snapshot_until_invalidated() {
        let svc = service(vec![member("card-1", Rank::E3, Team::Inbound)]);
        assert_eq!(svc.members(false).await.unwrap().len(), 1);

        svc.store()
            .replace_team(Team::Brass, &[member("card-2", Rank::E4, Team::Brass)])
            .await
            .unwrap();
        assert_eq!(svc.members(false).await.unwrap().len(), 1);

        svc.invalidate().await;
        assert_eq!(svc.members(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_persist_updates_in_place_and_merges_custom_data() {
        let mut stored = member("card-1", Rank::E3, Team::Inbound);
        stored.custom_data.insert("field_1".to_string(), "Days".to_string());
        let svc = service(vec![member("card-0", Rank::E2, Team::Inbound), stored.clone()]);

        let mut edit = stored.clone();
        edit.custom_data.clear();
        edit.custom_data.insert("field_2".to_string(), "X".to_string());
        edit.hometown = Some("Dayton".to_string());
        svc.persist(edit).await.unwrap();

        let inbound = svc.store().fetch_team(Team::Inbound).await.unwrap();
        assert_eq!(inbound.len(), 2);
        assert_eq!(inbound[1].id, "card-1");
        assert_eq!(inbound[1].custom_data["field_1"], "Days");
        assert_eq!(inbound[1].custom_data["field_2"], "X");
        assert_eq!(inbound[1].hometown.as_deref(), Some("Dayton"));
    }

    #[tokio::test]
    async fn test_persist_team_change_removes_old_entry() {
        let svc = service(vec![member("card-1", Rank::E3, Team::Inbound)]);
        let mut moved = member("card-1", Rank::E3, Team::Sbirs);
        moved.first_name = "Moved".to_string();
        svc.persist(moved).await.unwrap();

        assert!(svc.store().fetch_team(Team::Inbound).await.unwrap().is_empty());
        assert_eq!(svc.store().fetch_team(Team::Sbirs).await.unwrap()[0].first_name, "Moved");
    }

    #[tokio::test]
    async fn test_delete_refused_with_supervisees() {
        let mut report = member("card-2", Rank::E3, Team::Brass);
        report.supervisor = Some("card-1".to_string());
        let svc = service(vec![member("card-1", Rank::E6, Team::Brass), report]);

        match svc.delete("card-1").await {
            Err(RosterError::HasSupervisees { count, .. }) => assert_eq!(count, 1),
            other => panic!("unexpected result: {:?}", other.map(|m| m.id)),
        }

        let removed = svc.delete("card-2").await.unwrap();
        assert_eq!(removed.id, "card-2");
        assert_eq!(svc.fetch_all().await.unwrap().len(), 1);
        assert!(matches!(svc.delete("card-9").await, Err(RosterError::MemberNotFound(_))));
    }

    #[tokio::test]
    async fn test_move_to_team() {
        let svc = service(vec![member("card-1", Rank::E4, Team::Inbound)]);
        svc.move_to_team("card-1", Team::Brass).await.unwrap();

        let brass = svc.store().fetch_team(Team::Brass).await.unwrap();
        assert_eq!(brass.len(), 1);
        assert_eq!(brass[0].team, Team::Brass);
        assert!(svc.store().fetch_team(Team::Inbound).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_supervisor_rules() {
        let today = date(2025, 6, 15);
        let mut ssgt = member("ssgt", Rank::E5, Team::Brass);
        ssgt.supervisor = Some("msgt".to_string());
        let svc = service(vec![member("msgt", Rank::E7, Team::Brass), ssgt, member("amn", Rank::E2, Team::Brass)]);

        let updated = svc.assign_supervisor("amn", Some("ssgt"), today).await.unwrap();
        assert_eq!(updated.supervisor.as_deref(), Some("ssgt"));
        assert_eq!(updated.sup_start_date, Some(today));

        assert!(matches!(
            svc.assign_supervisor("amn", Some("amn"), today).await,
            Err(RosterError::SelfSupervision(_))
        ));
        assert!(matches!(
            svc.assign_supervisor("msgt", Some("amn"), today).await,
            Err(RosterError::SupervisionCycle { .. })
        ));
        assert!(matches!(
            svc.assign_supervisor("amn", Some("card-gone"), today).await,
            Err(RosterError::MemberNotFound(_))
        ));

        let cleared = svc.assign_supervisor("amn", None, today).await.unwrap();
        assert_eq!(cleared.supervisor, None);
        assert_eq!(cleared.sup_start_date, None);
    }

    #[tokio::test]
    async fn test_promote_failure_leaves_store_untouched() {
        let chief = member("card-9", Rank::E9, Team::FlightLeads);
        let svc = service(vec![chief.clone()]);
        assert!(matches!(
            svc.promote("card-9", date(2025, 6, 1)).await,
            Err(RosterError::Promotion(_))
        ));
        assert_eq!(svc.store().fetch_team(Team::FlightLeads).await.unwrap(), vec![chief]);
    }

    #[tokio::test]
    async fn test_board_selection_then_sweep() {
        let mut sra = member("card-4", Rank::E4, Team::Sbirs);
        sra.tis_date = Some(date(2022, 6, 14));
        sra.dor_date = Some(date(2024, 12, 14));
        let svc = service(vec![sra]);

        svc.record_board("card-4", true, Some(date(2025, 8, 1))).await.unwrap();

        let early = svc.run_sweep(&FixedClock(date(2025, 7, 1))).await.unwrap();
        assert!(!early.changed());

        let outcome = svc.run_sweep(&FixedClock(date(2025, 8, 1))).await.unwrap();
        assert_eq!(outcome.promotions.len(), 1);

        let stored = &svc.store().fetch_team(Team::Sbirs).await.unwrap()[0];
        assert_eq!(stored.rank, Rank::E5);
        assert_eq!(stored.dor_date, Some(date(2025, 8, 1)));
        assert_eq!(stored.promotion_status, BoardStatus::None);

        let again = svc.run_sweep(&FixedClock(date(2025, 8, 1))).await.unwrap();
        assert!(!again.changed());
    }

    #[tokio::test]
    async fn test_sweep_writes_every_touched_team() {
        let mut a = member("card-1", Rank::E1, Team::Inbound);
        a.tis_date = Some(date(2024, 1, 1));
        a.dor_date = Some(date(2024, 1, 1));
        let mut b = member("card-2", Rank::E2, Team::Brass);
        b.tis_date = Some(date(2023, 1, 1));
        b.dor_date = Some(date(2024, 6, 1));
        let svc = service(vec![a, b, member("card-3", Rank::E6, Team::Brass)]);

        let outcome = svc.run_sweep(&FixedClock(date(2025, 6, 15))).await.unwrap();
        assert_eq!(outcome.promotions.len(), 2);
        assert_eq!(svc.store().fetch_team(Team::Inbound).await.unwrap()[0].rank, Rank::E2);
        let brass = svc.store().fetch_team(Team::Brass).await.unwrap();
        assert_eq!(brass.len(), 2);
        assert_eq!(brass[0].rank, Rank::E3);
        assert_eq!(brass[1].rank, Rank::E6);
    }

    #[tokio::test]
    async fn test_sweep_promotes_duplicated_member_once() {
        let mut airman = member("card-1", Rank::E1, Team::Inbound);
        airman.tis_date = Some(date(2024, 9, 1));
        airman.dor_date = Some(date(2024, 9, 1));
        let mut copy = airman.clone();
        copy.team = Team::Brass;

        let svc = service(Vec::new());
        svc.store()
            .replace_teams(&[(Team::Inbound, vec![airman]), (Team::Brass, vec![copy])])
            .await
            .unwrap();

        let today = FixedClock(date(2025, 6, 15));
        let first = svc.run_sweep(&today).await.unwrap();
        assert_eq!(first.promotions.len(), 1);
        assert_eq!(svc.store().fetch_team(Team::Inbound).await.unwrap()[0].rank, Rank::E2);

        let second = svc.run_sweep(&today).await.unwrap();
        assert!(!second.changed());

        let all = svc.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rank, Rank::E2);
    }

    #[tokio::test]
    async fn test_custom_field_lifecycle() {
        let svc = service(Vec::new());
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();

        assert!(matches!(
            svc.add_field("   ", FieldType::Text, false, now).await,
            Err(RosterError::EmptyFieldName)
        ));

        let field = svc.add_field(" Shift ", FieldType::Text, false, now).await.unwrap();
        assert_eq!(field.id, "field_1700000000000");
        assert_eq!(field.name, "Shift");

        svc.set_field_on_card(&field.id, true).await.unwrap();
        assert!(svc.fields().await.unwrap()[0].show_on_card);

        svc.delete_field(&field.id).await.unwrap();
        assert!(svc.fields().await.unwrap().is_empty());
    }
}
