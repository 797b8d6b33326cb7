//! Application state management for flightline.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, the loaded roster, and background task coordination.
//! Every store operation runs in a spawned task and reports back through an
//! mpsc channel, so the draw loop never waits on the network.

use std::cmp::Ordering;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use flightline_core::api::RealtimeDbClient;
use flightline_core::auth::CredentialStore;
use flightline_core::cache::CacheManager;
use flightline_core::promotion::{evaluate, Action};
use flightline_core::roster::{
    build_chart, parse_date_input, supervisor_candidates, AnyStore, MemberDraft, MemoryStore,
    RosterError,
};
use flightline_core::{Clock, CustomField, FieldType, Member, RosterService, SystemClock, Team};

use crate::config::Config;
use crate::utils::contains_ignore_case;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Maximum length for any single text input.
pub const MAX_INPUT_LENGTH: usize = 64;

// ============================================================================
// Navigation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Roster,
    Chart,
    Fields,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Roster => "Roster",
            Tab::Chart => "Chart",
            Tab::Fields => "Fields",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Roster => Tab::Chart,
            Tab::Chart => Tab::Fields,
            Tab::Fields => Tab::Roster,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Roster => Tab::Fields,
            Tab::Chart => Tab::Roster,
            Tab::Fields => Tab::Chart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    Prompting,
    EditingMember,
    ConfirmingDelete,
    ConfirmingOffline,
    ConfirmingOnline,
    ConfirmingQuit,
    Quitting,
}

// ============================================================================
// Prompts and forms
// ============================================================================

/// What a one-line prompt is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// New date of rank for a manual promotion.
    PromoteDor { id: String },
    /// Promotion date for a BTZ selection.
    BtzDate { id: String },
    /// Promotion date for a board selection.
    BoardDate { id: String },
    /// Name of a new custom field.
    NewField,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::PromoteDor { .. } => "Promote: new date of rank (YYYY-MM-DD)",
            PromptKind::BtzDate { .. } => "BTZ selected: promotion date (YYYY-MM-DD)",
            PromptKind::BoardDate { .. } => "Board selected: promotion date (YYYY-MM-DD)",
            PromptKind::NewField => "New field name",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    /// Only used by `PromptKind::NewField`.
    pub field_type: FieldType,
    pub error: Option<String>,
}

impl Prompt {
    fn new(kind: PromptKind, input: String) -> Self {
        Self {
            kind,
            input,
            field_type: FieldType::Text,
            error: None,
        }
    }
}

/// One row of the add/edit member form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Rank,
    TisDate,
    DorDate,
    Team,
    Supervisor,
    SupStartDate,
    DutyTitle,
    Status,
    Hometown,
    MedicalProfile,
    /// Custom field, by field id.
    Custom(String),
}

impl FormField {
    const STANDARD: [FormField; 12] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Rank,
        FormField::TisDate,
        FormField::DorDate,
        FormField::Team,
        FormField::Supervisor,
        FormField::SupStartDate,
        FormField::DutyTitle,
        FormField::Status,
        FormField::Hometown,
        FormField::MedicalProfile,
    ];

    pub fn label(&self, fields: &[CustomField]) -> String {
        let label = match self {
            FormField::FirstName => "First name",
            FormField::LastName => "Last name",
            FormField::Rank => "Rank",
            FormField::TisDate => "TIS date",
            FormField::DorDate => "DOR",
            FormField::Team => "Team",
            FormField::Supervisor => "Supervisor",
            FormField::SupStartDate => "Sup. start",
            FormField::DutyTitle => "Duty title",
            FormField::Status => "Status",
            FormField::Hometown => "Hometown",
            FormField::MedicalProfile => "Medical",
            FormField::Custom(id) => {
                return fields
                    .iter()
                    .find(|f| &f.id == id)
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| id.clone());
            }
        };
        label.to_string()
    }

    /// Team and supervisor are picked with left/right instead of typed.
    pub fn is_choice(&self) -> bool {
        matches!(self, FormField::Team | FormField::Supervisor)
    }
}

/// State of the add/edit member overlay.
#[derive(Debug, Clone)]
pub struct MemberForm {
    pub draft: MemberDraft,
    pub fields: Vec<FormField>,
    pub selection: usize,
    pub error: Option<String>,
}

impl MemberForm {
    pub fn new(draft: MemberDraft, custom_fields: &[CustomField]) -> Self {
        let mut fields: Vec<FormField> = FormField::STANDARD.to_vec();
        fields.extend(custom_fields.iter().map(|f| FormField::Custom(f.id.clone())));
        Self {
            draft,
            fields,
            selection: 0,
            error: None,
        }
    }

    pub fn current(&self) -> Option<&FormField> {
        self.fields.get(self.selection)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.selection = (self.selection + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.selection = (self.selection + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Typed text behind a field, or `None` for choice fields.
    pub fn text(&self, field: &FormField) -> Option<&str> {
        let draft = &self.draft;
        let value = match field {
            FormField::FirstName => &draft.first_name,
            FormField::LastName => &draft.last_name,
            FormField::Rank => &draft.rank,
            FormField::TisDate => &draft.tis_date,
            FormField::DorDate => &draft.dor_date,
            FormField::SupStartDate => &draft.sup_start_date,
            FormField::DutyTitle => &draft.duty_title,
            FormField::Status => &draft.status,
            FormField::Hometown => &draft.hometown,
            FormField::MedicalProfile => &draft.medical_profile,
            FormField::Custom(id) => return Some(draft.custom.get(id).map(String::as_str).unwrap_or("")),
            FormField::Team | FormField::Supervisor => return None,
        };
        Some(value.as_str())
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        let field = self.fields.get(self.selection)?.clone();
        let draft = &mut self.draft;
        match field {
            FormField::FirstName => Some(&mut draft.first_name),
            FormField::LastName => Some(&mut draft.last_name),
            FormField::Rank => Some(&mut draft.rank),
            FormField::TisDate => Some(&mut draft.tis_date),
            FormField::DorDate => Some(&mut draft.dor_date),
            FormField::SupStartDate => Some(&mut draft.sup_start_date),
            FormField::DutyTitle => Some(&mut draft.duty_title),
            FormField::Status => Some(&mut draft.status),
            FormField::Hometown => Some(&mut draft.hometown),
            FormField::MedicalProfile => Some(&mut draft.medical_profile),
            FormField::Custom(id) => Some(draft.custom.entry(id).or_default()),
            FormField::Team | FormField::Supervisor => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(text) = self.text_mut() {
            if text.chars().count() < MAX_INPUT_LENGTH {
                text.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    /// Step a choice field forward or backward.
    pub fn cycle_choice(&mut self, members: &[Member], forward: bool) {
        match self.current() {
            Some(FormField::Team) => {
                let current = self.draft.team.unwrap_or_default();
                self.draft.team = Some(cycle(&Team::ALL, &current, forward));
            }
            Some(FormField::Supervisor) => {
                let mut options: Vec<String> = vec![String::new()];
                options.extend(
                    supervisor_candidates(members, self.draft.id.as_deref())
                        .into_iter()
                        .map(|m| m.id.clone()),
                );
                self.draft.supervisor = cycle(&options, &self.draft.supervisor, forward);
            }
            _ => {}
        }
    }
}

/// Next (or previous) entry after `current`, wrapping. Unknown values start at the first entry.
fn cycle<T: Clone + PartialEq>(options: &[T], current: &T, forward: bool) -> T {
    let len = options.len();
    match options.iter().position(|o| o == current) {
        Some(i) if forward => options[(i + 1) % len].clone(),
        Some(i) => options[(i + len - 1) % len].clone(),
        None => options[0].clone(),
    }
}

/// Target of a pending delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Member { id: String, name: String },
    Field { id: String, name: String },
}

// ============================================================================
// Ordering and search
// ============================================================================

fn team_index(team: Team) -> usize {
    Team::ALL.iter().position(|t| *t == team).unwrap_or(0)
}

/// Team display order, then highest rank, then name.
pub fn roster_order(a: &Member, b: &Member) -> Ordering {
    team_index(a.team)
        .cmp(&team_index(b.team))
        .then_with(|| b.rank.order().cmp(&a.rank.order()))
        .then_with(|| a.last_name.cmp(&b.last_name))
        .then_with(|| a.first_name.cmp(&b.first_name))
}

pub fn matches_query(member: &Member, query: &str) -> bool {
    query.is_empty()
        || contains_ignore_case(&member.display_name(), query)
        || contains_ignore_case(member.rank.abbreviation(), query)
        || contains_ignore_case(member.duty_title_display(), query)
        || contains_ignore_case(member.team.display_name(), query)
}

/// Members matching `query`, in roster order.
pub fn visible_members<'a>(members: &'a [Member], query: &str) -> Vec<&'a Member> {
    let mut list: Vec<&Member> = members.iter().filter(|m| matches_query(m, query)).collect();
    list.sort_by(|a, b| roster_order(a, b));
    list
}

// ============================================================================
// Background tasks
// ============================================================================

/// Messages from spawned store tasks back to the UI loop.
enum TaskResult {
    Loaded {
        members: Vec<Member>,
        fields: Vec<CustomField>,
        message: Option<String>,
    },
    Failed(String),
}

type Service = RosterService<AnyStore>;

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    pub service: Arc<Service>,
    pub cache: CacheManager,
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub search_query: String,

    pub members: Vec<Member>,
    pub fields: Vec<CustomField>,
    pub cache_age: String,

    pub roster_selection: usize,
    pub chart_selection: usize,
    pub field_selection: usize,

    /// Member picked up on the chart, waiting to be dropped on a supervisor.
    pub chart_pick: Option<String>,
    pub prompt: Option<Prompt>,
    pub form: Option<MemberForm>,
    pub pending_delete: Option<DeleteTarget>,

    pub status_message: Option<String>,
    pub offline_mode: bool,
    pub busy: bool,

    /// Source of "today" for verdicts and sweeps.
    clock: Arc<dyn Clock>,

    task_tx: mpsc::Sender<TaskResult>,
    task_rx: mpsc::Receiver<TaskResult>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to local cache directory");
            PathBuf::from("./cache")
        });
        let cache = CacheManager::new(cache_dir)?;
        debug!(cache_dir = %cache.cache_dir().display(), "Cache ready");

        let offline_mode = config.offline_mode || config.database_url().is_none();
        let store = build_store(&config, offline_mode, Vec::new(), Vec::new());
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let status_message = if config.database_url().is_none() {
            Some("No database configured; working from local cache".to_string())
        } else {
            None
        };

        Ok(Self {
            config,
            service: Arc::new(RosterService::new(store)),
            cache,
            state: AppState::Normal,
            current_tab: Tab::Roster,
            focus: Focus::List,
            search_query: String::new(),
            members: Vec::new(),
            fields: Vec::new(),
            cache_age: "never".to_string(),
            roster_selection: 0,
            chart_selection: 0,
            field_selection: 0,
            chart_pick: None,
            prompt: None,
            form: None,
            pending_delete: None,
            status_message,
            offline_mode,
            busy: false,
            clock: Arc::new(SystemClock),
            task_tx,
            task_rx,
        })
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// One clock reading. Callers judging several members read it once.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn unit_title(&self) -> &str {
        self.config.unit_name.as_deref().unwrap_or("Flightline")
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Load the last snapshot. Offline sessions also reseed the in-memory store.
    pub fn load_from_cache(&mut self) {
        match self.cache.load_members() {
            Ok(Some(cached)) => self.members = cached.data,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load member cache"),
        }
        match self.cache.load_fields() {
            Ok(Some(cached)) => self.fields = cached.data,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load field cache"),
        }
        self.cache_age = self.cache.members_age();

        if self.offline_mode {
            let store = AnyStore::Memory(MemoryStore::with_members(self.members.clone(), self.fields.clone()));
            self.service = Arc::new(RosterService::new(store));
        }
        self.clamp_selections();
    }

    pub fn is_cache_stale(&self) -> bool {
        self.cache.is_stale()
    }

    fn save_to_cache(&mut self) {
        if let Err(e) = self.cache.save_members(&self.members) {
            warn!(error = %e, "Failed to save member cache");
        }
        if let Err(e) = self.cache.save_fields(&self.fields) {
            warn!(error = %e, "Failed to save field cache");
        }
        self.cache_age = self.cache.members_age();
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send task result - channel closed");
        }
    }

    /// Apply due promotions, then fetch the roster and field definitions.
    async fn load_roster(service: &Service, clock: &dyn Clock, message: Option<String>) -> TaskResult {
        let promoted = match service.run_sweep(clock).await {
            Ok(outcome) => outcome.promotions.len(),
            Err(e) => {
                warn!(error = %e, "Promotion sweep failed");
                return TaskResult::Failed(e.to_string());
            }
        };
        let message = match (message, promoted) {
            (message, 0) => message,
            (Some(message), n) => Some(format!("{} ({} promoted)", message, n)),
            (None, n) => Some(format!("Promoted {} member(s)", n)),
        };

        let (members, fields) = tokio::join!(service.members(true), service.fields());
        match (members, fields) {
            (Ok(members), Ok(fields)) => TaskResult::Loaded { members, fields, message },
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to load roster");
                TaskResult::Failed(e.to_string())
            }
        }
    }

    /// Spawn a background task to reload members and fields
    pub fn refresh_all_background(&mut self) {
        info!("Starting background refresh");
        let service = Arc::clone(&self.service);
        let clock = Arc::clone(&self.clock);
        let tx = self.task_tx.clone();
        self.busy = true;
        self.status_message = Some("Refreshing roster...".to_string());

        tokio::spawn(async move {
            let result = Self::load_roster(&service, clock.as_ref(), None).await;
            Self::send_result(&tx, result).await;
        });
    }

    /// Run a store operation in the background, then reload the roster.
    fn spawn_action<F, Fut>(&mut self, label: &str, action: F)
    where
        F: FnOnce(Arc<Service>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, RosterError>> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let clock = Arc::clone(&self.clock);
        let tx = self.task_tx.clone();
        self.busy = true;
        self.status_message = Some(format!("{}...", label));

        tokio::spawn(async move {
            let result = match action(Arc::clone(&service)).await {
                Ok(message) => Self::load_roster(&service, clock.as_ref(), Some(message)).await,
                Err(e) => {
                    warn!(error = %e, "Roster action failed");
                    TaskResult::Failed(e.to_string())
                }
            };
            Self::send_result(&tx, result).await;
        });
    }

    /// Apply any results that arrived from background tasks.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.busy = false;
            match result {
                TaskResult::Loaded { members, fields, message } => {
                    debug!(members = members.len(), fields = fields.len(), "Roster loaded");
                    self.members = members;
                    self.fields = fields;
                    self.save_to_cache();
                    self.clamp_selections();
                    self.status_message = message;
                }
                TaskResult::Failed(message) => {
                    self.status_message = Some(format!("Error: {}", message));
                }
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn visible_members(&self) -> Vec<&Member> {
        visible_members(&self.members, &self.search_query)
    }

    pub fn selected_member(&self) -> Option<&Member> {
        self.visible_members().get(self.roster_selection).copied()
    }

    pub fn chart_rows(&self) -> Vec<(usize, &Member)> {
        build_chart(&self.members).rows()
    }

    pub fn selected_chart_member(&self) -> Option<&Member> {
        self.chart_rows().get(self.chart_selection).map(|(_, m)| *m)
    }

    pub fn selected_field(&self) -> Option<&CustomField> {
        self.fields.get(self.field_selection)
    }

    fn current_len(&self) -> usize {
        match self.current_tab {
            Tab::Roster => self.visible_members().len(),
            Tab::Chart => self.chart_rows().len(),
            Tab::Fields => self.fields.len(),
        }
    }

    fn current_selection_mut(&mut self) -> &mut usize {
        match self.current_tab {
            Tab::Roster => &mut self.roster_selection,
            Tab::Chart => &mut self.chart_selection,
            Tab::Fields => &mut self.field_selection,
        }
    }

    /// Move the current tab's selection by `delta`, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_len();
        let selection = self.current_selection_mut();
        if len == 0 {
            *selection = 0;
            return;
        }
        let next = (*selection as isize + delta).clamp(0, len as isize - 1);
        *selection = next as usize;
    }

    pub fn select_first(&mut self) {
        *self.current_selection_mut() = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.current_len();
        *self.current_selection_mut() = len.saturating_sub(1);
    }

    pub fn clamp_selections(&mut self) {
        let roster = self.visible_members().len();
        let chart = self.chart_rows().len();
        let fields = self.fields.len();
        self.roster_selection = self.roster_selection.min(roster.saturating_sub(1));
        self.chart_selection = self.chart_selection.min(chart.saturating_sub(1));
        self.field_selection = self.field_selection.min(fields.saturating_sub(1));
    }

    // =========================================================================
    // Promotion Actions
    // =========================================================================

    /// Open the date-of-rank prompt for an eligible member.
    pub fn begin_promote(&mut self) {
        let Some(member) = self.selected_member() else {
            return;
        };
        if evaluate(member, self.today()).action() != Action::Promote {
            self.status_message = Some(format!("{} is not eligible for promotion", member.short_name()));
            return;
        }
        let kind = PromptKind::PromoteDor { id: member.id.clone() };
        let today = self.today().format("%Y-%m-%d").to_string();
        self.prompt = Some(Prompt::new(kind, today));
        self.state = AppState::Prompting;
    }

    /// Record a board outcome for the selected member.
    ///
    /// Selection asks for the promotion date first, prefilled with the
    /// computed BTZ date when there is one.
    pub fn begin_decision(&mut self, selected: bool) {
        let Some(member) = self.selected_member() else {
            return;
        };
        let verdict = evaluate(member, self.today());
        let id = member.id.clone();
        let name = member.short_name();

        match (verdict.action(), selected) {
            (Action::BtzDecision, true) => {
                let input = verdict
                    .board_promotion_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                self.prompt = Some(Prompt::new(PromptKind::BtzDate { id }, input));
                self.state = AppState::Prompting;
            }
            (Action::BtzDecision, false) => {
                self.spawn_action("Recording BTZ outcome", move |service| async move {
                    service.record_btz(&id, false, None).await?;
                    Ok(format!("{} not selected for BTZ", name))
                });
            }
            (Action::BoardDecision, true) => {
                self.prompt = Some(Prompt::new(PromptKind::BoardDate { id }, String::new()));
                self.state = AppState::Prompting;
            }
            (Action::BoardDecision, false) => {
                self.spawn_action("Recording board outcome", move |service| async move {
                    service.record_board(&id, false, None).await?;
                    Ok(format!("{} not selected by the board", name))
                });
            }
            _ => {
                self.status_message = Some(format!("No board decision pending for {}", name));
            }
        }
    }

    /// Sweep on demand. Every reload already applies due promotions, so this
    /// is a reload that always reports the outcome.
    pub fn run_sweep(&mut self) {
        self.spawn_action("Running promotion sweep", |_| async move {
            Ok("Sweep complete".to_string())
        });
    }

    // =========================================================================
    // Prompt Handling
    // =========================================================================

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
        self.state = AppState::Normal;
    }

    /// Validate the prompt input and dispatch the matching action.
    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.clone() else {
            self.state = AppState::Normal;
            return;
        };

        if prompt.kind == PromptKind::NewField {
            let name = prompt.input.trim().to_string();
            if name.is_empty() {
                self.set_prompt_error(RosterError::EmptyFieldName.to_string());
                return;
            }
            let field_type = prompt.field_type;
            self.cancel_prompt();
            self.spawn_action("Adding field", move |service| async move {
                let field = service.add_field(&name, field_type, false, Utc::now()).await?;
                Ok(format!("Added field {}", field.name))
            });
            return;
        }

        let date = match parse_date_input(&prompt.input) {
            Ok(date) => date,
            Err(e) => {
                self.set_prompt_error(e.to_string());
                return;
            }
        };
        self.cancel_prompt();

        match prompt.kind {
            PromptKind::PromoteDor { id } => {
                self.spawn_action("Promoting", move |service| async move {
                    let member = service.promote(&id, date).await?;
                    Ok(format!("Promoted {} to {}", member.display_name(), member.rank))
                });
            }
            PromptKind::BtzDate { id } => {
                self.spawn_action("Recording BTZ outcome", move |service| async move {
                    let member = service.record_btz(&id, true, Some(date)).await?;
                    Ok(format!("{} selected for BTZ", member.short_name()))
                });
            }
            PromptKind::BoardDate { id } => {
                self.spawn_action("Recording board outcome", move |service| async move {
                    let member = service.record_board(&id, true, Some(date)).await?;
                    Ok(format!("{} selected, promotes {}", member.short_name(), date))
                });
            }
            PromptKind::NewField => {}
        }
    }

    fn set_prompt_error(&mut self, message: String) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.error = Some(message);
        }
    }

    // =========================================================================
    // Member Edits
    // =========================================================================

    pub fn begin_add_member(&mut self) {
        let draft = MemberDraft {
            team: Some(Team::Inbound),
            ..Default::default()
        };
        self.form = Some(MemberForm::new(draft, &self.fields));
        self.state = AppState::EditingMember;
    }

    pub fn begin_edit_member(&mut self) {
        let Some(member) = self.current_member() else {
            return;
        };
        let draft = MemberDraft::from_member(member);
        self.form = Some(MemberForm::new(draft, &self.fields));
        self.state = AppState::EditingMember;
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    /// Build the member from the form and persist it.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            self.state = AppState::Normal;
            return;
        };
        let existing = form
            .draft
            .id
            .as_deref()
            .and_then(|id| self.members.iter().find(|m| m.id == id));

        match form.draft.clone().into_member(existing, Utc::now()) {
            Ok(member) => {
                let name = member.display_name();
                self.cancel_form();
                self.spawn_action("Saving member", move |service| async move {
                    service.persist(member).await?;
                    Ok(format!("Saved {}", name))
                });
            }
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(e.to_string());
                }
            }
        }
    }

    /// The member under the cursor on whichever tab shows members.
    fn current_member(&self) -> Option<&Member> {
        match self.current_tab {
            Tab::Chart => self.selected_chart_member(),
            _ => self.selected_member(),
        }
    }

    pub fn move_to_next_team(&mut self) {
        let Some(member) = self.selected_member() else {
            return;
        };
        let id = member.id.clone();
        let name = member.short_name();
        let team = member.team.next();
        self.spawn_action("Moving member", move |service| async move {
            service.move_to_team(&id, team).await?;
            Ok(format!("Moved {} to {}", name, team))
        });
    }

    pub fn request_delete_member(&mut self) {
        if let Some(member) = self.current_member() {
            self.pending_delete = Some(DeleteTarget::Member {
                id: member.id.clone(),
                name: member.rank_display_name(),
            });
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn request_delete_field(&mut self) {
        if let Some(field) = self.selected_field() {
            self.pending_delete = Some(DeleteTarget::Field {
                id: field.id.clone(),
                name: field.name.clone(),
            });
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        match self.pending_delete.take() {
            Some(DeleteTarget::Member { id, name }) => {
                self.spawn_action("Deleting member", move |service| async move {
                    service.delete(&id).await?;
                    Ok(format!("Deleted {}", name))
                });
            }
            Some(DeleteTarget::Field { id, name }) => {
                self.spawn_action("Deleting field", move |service| async move {
                    service.delete_field(&id).await?;
                    Ok(format!("Deleted field {}", name))
                });
            }
            None => {}
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    // =========================================================================
    // Chart
    // =========================================================================

    /// Pick up the selected member, or drop the picked one onto the selection.
    pub fn chart_pick_or_drop(&mut self) {
        let Some(target) = self.selected_chart_member() else {
            return;
        };

        let Some(picked) = self.chart_pick.clone() else {
            let id = target.id.clone();
            self.status_message = Some(format!(
                "Moving {}: select a new supervisor and press Enter",
                target.short_name()
            ));
            self.chart_pick = Some(id);
            return;
        };

        if picked == target.id {
            self.chart_pick = None;
            self.status_message = None;
            return;
        }
        if !target.rank.can_supervise() {
            self.status_message = Some(format!("{} cannot supervise", target.short_name()));
            return;
        }

        let supervisor = target.id.clone();
        let supervisor_name = target.short_name();
        let today = self.today();
        self.chart_pick = None;
        self.spawn_action("Reassigning supervisor", move |service| async move {
            let member = service.assign_supervisor(&picked, Some(&supervisor), today).await?;
            Ok(format!("{} now reports to {}", member.short_name(), supervisor_name))
        });
    }

    /// Detach the selected member from their supervisor.
    pub fn chart_clear_supervisor(&mut self) {
        let Some(member) = self.selected_chart_member() else {
            return;
        };
        if member.supervisor.is_none() {
            return;
        }
        let id = member.id.clone();
        let today = self.today();
        self.spawn_action("Clearing supervisor", move |service| async move {
            let member = service.assign_supervisor(&id, None, today).await?;
            Ok(format!("{} has no supervisor", member.short_name()))
        });
    }

    // =========================================================================
    // Custom Fields
    // =========================================================================

    pub fn begin_add_field(&mut self) {
        self.prompt = Some(Prompt::new(PromptKind::NewField, String::new()));
        self.state = AppState::Prompting;
    }

    pub fn toggle_field_on_card(&mut self) {
        let Some(field) = self.selected_field() else {
            return;
        };
        let id = field.id.clone();
        let name = field.name.clone();
        let show = !field.show_on_card;
        self.spawn_action("Updating field", move |service| async move {
            service.set_field_on_card(&id, show).await?;
            Ok(if show {
                format!("{} shown on cards", name)
            } else {
                format!("{} hidden from cards", name)
            })
        });
    }

    // =========================================================================
    // Offline Mode
    // =========================================================================

    /// Work from the local snapshot. Edits stay local until the next online refresh.
    pub fn go_offline(&mut self) {
        info!("Entering offline mode");
        let store = AnyStore::Memory(MemoryStore::with_members(self.members.clone(), self.fields.clone()));
        self.service = Arc::new(RosterService::new(store));
        self.save_to_cache();

        self.offline_mode = true;
        self.config.offline_mode = true;
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        self.status_message = Some("Offline: working from local cache".to_string());
    }

    /// Reconnect to the database and reload.
    pub fn go_online(&mut self) {
        if self.config.database_url().is_none() {
            self.status_message = Some("No database URL configured".to_string());
            return;
        }

        info!("Exiting offline mode");
        self.offline_mode = false;
        self.config.offline_mode = false;
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        let store = build_store(&self.config, false, self.members.clone(), self.fields.clone());
        self.service = Arc::new(RosterService::new(store));
        self.refresh_all_background();
    }
}

/// Pick the backend: the Realtime Database when online and configured,
/// otherwise an in-memory store seeded with what we already have.
fn build_store(config: &Config, offline: bool, members: Vec<Member>, fields: Vec<CustomField>) -> AnyStore {
    let url = match config.database_url() {
        Some(url) if !offline => url,
        _ => return AnyStore::Memory(MemoryStore::with_members(members, fields)),
    };

    match RealtimeDbClient::new(&url) {
        Ok(client) => {
            if !CredentialStore::has_credentials(&url) {
                debug!("No database secret stored; using unauthenticated access");
                return AnyStore::Remote(client);
            }
            match CredentialStore::get(&url) {
                Ok(secret) => AnyStore::Remote(client.with_secret(secret)),
                Err(e) => {
                    warn!(error = %e, "Failed to read database secret");
                    AnyStore::Remote(client)
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to create database client, staying offline");
            AnyStore::Memory(MemoryStore::with_members(members, fields))
        }
    }
}
