use std::collections::VecDeque;

use chrono::{Local, TimeZone, Utc};

use crate::catalog;
use crate::farm_fetch::FetchError;
use crate::render::{self, AnimalCard, FieldCard};
use crate::settings::{CredentialSources, Settings};
use crate::throttle;
use crate::timers::LiveTimers;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldState {
    Harvesting,
    Growing,
    Planting,
    Cultivating,
    Other(String),
}

impl FieldState {
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "harvesting" => FieldState::Harvesting,
            "growing" => FieldState::Growing,
            "planting" => FieldState::Planting,
            "cultivating" => FieldState::Cultivating,
            _ => FieldState::Other(raw.trim().to_string()),
        }
    }

    /// Lower sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            FieldState::Harvesting => 1,
            FieldState::Growing => 2,
            FieldState::Planting => 3,
            FieldState::Cultivating => 4,
            FieldState::Other(_) => 5,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FieldState::Harvesting => "harvesting",
            FieldState::Growing => "growing",
            FieldState::Planting => "planting",
            FieldState::Cultivating => "cultivating",
            FieldState::Other(raw) if raw.is_empty() => "unknown",
            FieldState::Other(raw) => raw.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub name: String,
    pub crop_name: Option<String>,
    pub state: FieldState,
    /// Epoch seconds.
    pub time_planted: Option<i64>,
    /// Epoch seconds.
    pub harvest_time: Option<i64>,
    pub fertilized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimalRecord {
    pub int_name: String,
    pub total: u32,
    pub feed_level: i64,
    pub feed_max: i64,
    /// Epoch seconds.
    pub collection_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub fields: Vec<FieldRecord>,
    pub animals: Vec<AnimalRecord>,
    /// Epoch milliseconds.
    pub captured_at_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Fields,
    Animals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Fetch { seq: u64, api_key: String },
}

#[derive(Debug, Clone)]
pub enum Delta {
    SnapshotReady { seq: u64, snapshot: Snapshot },
    FetchFailed { seq: u64, error: FetchError },
    Log(String),
}

/// What the caller should do after asking for a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// Throttled; the current cards stay as they are.
    UseCached,
    MissingKey,
    InFlight,
    Issue { seq: u64, api_key: String },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub explicit_key: Option<String>,
    pub host_key: Option<String>,
    pub snapshot: Option<Snapshot>,
    pub last_successful_fetch_ms: i64,
    pub fields: Vec<FieldCard>,
    pub animals: Vec<AnimalCard>,
    pub timers: LiveTimers,
    pub status: StatusMessage,
    pub logs: VecDeque<String>,
    pub tab: Tab,
    pub fields_scroll: usize,
    pub animals_scroll: usize,
    pub minimized: bool,
    pub help_overlay: bool,
    /// Key being typed in the settings overlay, `None` when it is closed.
    pub key_editor: Option<String>,
    pub loading: bool,
    next_seq: u64,
    applied_seq: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let mut state = Self {
            settings,
            explicit_key: None,
            host_key: None,
            snapshot: None,
            last_successful_fetch_ms: 0,
            fields: Vec::with_capacity(catalog::FIELDS.len()),
            animals: Vec::with_capacity(catalog::ANIMALS.len()),
            timers: LiveTimers::default(),
            status: StatusMessage {
                text: "Press r to load data".to_string(),
                is_error: false,
            },
            logs: VecDeque::with_capacity(MAX_LOGS),
            tab: Tab::Fields,
            fields_scroll: 0,
            animals_scroll: 0,
            minimized: false,
            help_overlay: false,
            key_editor: None,
            loading: false,
            next_seq: 0,
            applied_seq: 0,
        };
        state.rerender(now_secs());
        state
    }

    pub fn credentials(&self) -> CredentialSources {
        CredentialSources {
            explicit: self.explicit_key.clone(),
            host: self.host_key.clone(),
            stored: self.settings.api_key.clone(),
        }
    }

    pub fn begin_fetch(&mut self, now_ms: i64, force: bool) -> FetchDecision {
        if !throttle::should_fetch(now_ms, self.last_successful_fetch_ms, force) {
            self.set_status("Using cached data. Refresh to force.", false);
            return FetchDecision::UseCached;
        }

        let Some(api_key) = self.credentials().resolve() else {
            self.set_status(FetchError::MissingCredential.to_string(), true);
            return FetchDecision::MissingKey;
        };

        if force && self.loading {
            self.set_status("Fetch already in progress...", false);
            return FetchDecision::InFlight;
        }

        self.next_seq += 1;
        self.loading = true;
        self.set_status("Fetching latest data...", false);
        FetchDecision::Issue {
            seq: self.next_seq,
            api_key,
        }
    }

    /// Rebuilds every card from the catalog and the current snapshot.
    pub fn rerender(&mut self, now: i64) {
        let (fields, animals) = match &self.snapshot {
            Some(snapshot) => (
                render::render_fields(catalog::FIELDS, &snapshot.fields, now),
                render::render_animals(catalog::ANIMALS, &snapshot.animals, now),
            ),
            None => (
                render::render_fields(catalog::FIELDS, &[], now),
                render::render_animals(catalog::ANIMALS, &[], now),
            ),
        };
        self.timers = LiveTimers::from_cards(&fields, &animals, now);
        self.fields = fields;
        self.animals = animals;
        self.clamp_scroll();
    }

    pub fn tick(&mut self, now: i64) {
        self.timers.tick(now);
    }

    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = StatusMessage {
            text: text.into(),
            is_error,
        };
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn latest_issued_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    pub fn owned_fields(&self) -> usize {
        self.fields.iter().filter(|c| c.is_owned()).count()
    }

    pub fn owned_animals(&self) -> usize {
        self.animals.iter().filter(|c| c.is_owned()).count()
    }

    pub fn toggle_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Fields => Tab::Animals,
            Tab::Animals => Tab::Fields,
        };
    }

    pub fn scroll_down(&mut self) {
        match self.tab {
            Tab::Fields => self.fields_scroll += 1,
            Tab::Animals => self.animals_scroll += 1,
        }
        self.clamp_scroll();
    }

    pub fn scroll_up(&mut self) {
        match self.tab {
            Tab::Fields => self.fields_scroll = self.fields_scroll.saturating_sub(1),
            Tab::Animals => self.animals_scroll = self.animals_scroll.saturating_sub(1),
        }
    }

    fn clamp_scroll(&mut self) {
        self.fields_scroll = self.fields_scroll.min(self.fields.len().saturating_sub(1));
        self.animals_scroll = self
            .animals_scroll
            .min(self.animals.len().saturating_sub(1));
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    apply_delta_at(state, delta, now_secs());
}

pub fn apply_delta_at(state: &mut AppState, delta: Delta, now: i64) {
    match delta {
        Delta::SnapshotReady { seq, snapshot } => {
            if seq >= state.next_seq {
                state.loading = false;
            }
            if seq <= state.applied_seq {
                state.push_log(format!(
                    "[INFO] Dropped snapshot #{seq}, #{} already applied",
                    state.applied_seq
                ));
                return;
            }
            state.applied_seq = seq;
            state.last_successful_fetch_ms = snapshot.captured_at_ms;
            let fields = snapshot.fields.len();
            let animals = snapshot.animals.len();
            state.snapshot = Some(snapshot);
            state.rerender(now);
            let updated = format_clock_ms(state.last_successful_fetch_ms);
            state.set_status(format!("Updated: {updated}"), false);
            state.push_log(format!(
                "[INFO] Snapshot #{seq}: {fields} fields, {animals} animals"
            ));
        }
        Delta::FetchFailed { seq, error } => {
            if seq >= state.next_seq {
                state.loading = false;
            }
            state.push_log(format!("[WARN] Fetch #{seq} failed: {error}"));
            if seq < state.applied_seq {
                return;
            }
            state.set_status(format!("Error: {error}"), true);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Local wall-clock time of an epoch-millisecond instant, e.g. `14:03:27`.
pub fn format_clock_ms(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
