use std::collections::HashMap;
use std::future::Future;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::api::RealtimeDbClient;
use crate::models::{CustomField, Member, Team};

/// Backing store for team rosters and the custom field list.
///
/// Each team is one array written as a whole; there is no per-member
/// update. Writers race with last-write-wins semantics.
pub trait RosterStore: Send + Sync {
    fn fetch_team(&self, team: Team) -> impl Future<Output = Result<Vec<Member>>> + Send;

    fn replace_team(&self, team: Team, members: &[Member]) -> impl Future<Output = Result<()>> + Send;

    /// Replace several team arrays in one write.
    fn replace_teams(&self, teams: &[(Team, Vec<Member>)]) -> impl Future<Output = Result<()>> + Send;

    fn fetch_fields(&self) -> impl Future<Output = Result<Vec<CustomField>>> + Send;

    fn replace_fields(&self, fields: &[CustomField]) -> impl Future<Output = Result<()>> + Send;
}

/// In-process store. Used for offline sessions seeded from the cache and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    teams: RwLock<HashMap<Team, Vec<Member>>>,
    fields: RwLock<Vec<CustomField>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a flat member list, grouping by each member's team.
    pub fn with_members(members: Vec<Member>, fields: Vec<CustomField>) -> Self {
        let mut teams: HashMap<Team, Vec<Member>> = HashMap::new();
        for member in members {
            teams.entry(member.team).or_default().push(member);
        }
        Self {
            teams: RwLock::new(teams),
            fields: RwLock::new(fields),
        }
    }
}

impl RosterStore for MemoryStore {
    async fn fetch_team(&self, team: Team) -> Result<Vec<Member>> {
        Ok(self.teams.read().await.get(&team).cloned().unwrap_or_default())
    }

    async fn replace_team(&self, team: Team, members: &[Member]) -> Result<()> {
        self.teams.write().await.insert(team, members.to_vec());
        Ok(())
    }

    async fn replace_teams(&self, teams: &[(Team, Vec<Member>)]) -> Result<()> {
        let mut guard = self.teams.write().await;
        for (team, members) in teams {
            guard.insert(*team, members.clone());
        }
        Ok(())
    }

    async fn fetch_fields(&self) -> Result<Vec<CustomField>> {
        Ok(self.fields.read().await.clone())
    }

    async fn replace_fields(&self, fields: &[CustomField]) -> Result<()> {
        *self.fields.write().await = fields.to_vec();
        Ok(())
    }
}

/// Either backend, picked at startup.
pub enum AnyStore {
    Remote(RealtimeDbClient),
    Memory(MemoryStore),
}

impl AnyStore {
    pub fn is_remote(&self) -> bool {
        matches!(self, AnyStore::Remote(_))
    }
}

impl RosterStore for AnyStore {
    async fn fetch_team(&self, team: Team) -> Result<Vec<Member>> {
        match self {
            AnyStore::Remote(s) => s.fetch_team(team).await,
            AnyStore::Memory(s) => s.fetch_team(team).await,
        }
    }

    async fn replace_team(&self, team: Team, members: &[Member]) -> Result<()> {
        match self {
            AnyStore::Remote(s) => s.replace_team(team, members).await,
            AnyStore::Memory(s) => s.replace_team(team, members).await,
        }
    }

    async fn replace_teams(&self, teams: &[(Team, Vec<Member>)]) -> Result<()> {
        match self {
            AnyStore::Remote(s) => s.replace_teams(teams).await,
            AnyStore::Memory(s) => s.replace_teams(teams).await,
        }
    }

    async fn fetch_fields(&self) -> Result<Vec<CustomField>> {
        match self {
            AnyStore::Remote(s) => s.fetch_fields().await,
            AnyStore::Memory(s) => s.fetch_fields().await,
        }
    }

    async fn replace_fields(&self, fields: &[CustomField]) -> Result<()> {
        match self {
            AnyStore::Remote(s) => s.replace_fields(fields).await,
            AnyStore::Memory(s) => s.replace_fields(fields).await,
        }
    }
}
