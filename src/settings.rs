use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const REFRESH_STEP_SECS: u64 = 15;
pub const MAX_REFRESH_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Green,
    Blue,
    Purple,
    Red,
    Pink,
    Black,
    Yellow,
    Orange,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Green,
        Theme::Blue,
        Theme::Purple,
        Theme::Red,
        Theme::Pink,
        Theme::Black,
        Theme::Yellow,
        Theme::Orange,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Green => "green",
            Theme::Blue => "blue",
            Theme::Purple => "purple",
            Theme::Red => "red",
            Theme::Pink => "pink",
            Theme::Black => "black",
            Theme::Yellow => "yellow",
            Theme::Orange => "orange",
        }
    }

    /// Accent colour as RGB.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Theme::Green => (0x2e, 0x7d, 0x32),
            Theme::Blue => (0x0d, 0x47, 0xa1),
            Theme::Purple => (0x4a, 0x14, 0x8c),
            Theme::Red => (0xb7, 0x1c, 0x1c),
            Theme::Pink => (0xad, 0x14, 0x57),
            Theme::Black => (0x21, 0x21, 0x21),
            Theme::Yellow => (0xf5, 0x7c, 0x00),
            Theme::Orange => (0xe6, 0x51, 0x00),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Single,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub opacity: u8,
    pub theme: Theme,
    pub mode: Mode,
    pub layout: Layout,
    /// Seconds between scheduled fetches; 0 turns the schedule off.
    pub refresh_interval: u64,
    pub api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opacity: 100,
            theme: Theme::Green,
            mode: Mode::Dark,
            layout: Layout::Single,
            refresh_interval: DEFAULT_REFRESH_SECS,
            api_key: String::new(),
        }
    }
}

impl Settings {
    /// Overlays a stored settings object onto the defaults one key at a time.
    /// Keys that are missing or carry the wrong type keep their default.
    pub fn merged_from_json(raw: &str) -> Self {
        let mut out = Settings::default();
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
            return out;
        };

        if let Some(opacity) = map.get("opacity").and_then(|v| v.as_f64()) {
            out.opacity = opacity.round().clamp(0.0, 100.0) as u8;
        }
        if let Some(theme) = map.get("theme").and_then(|v| v.as_str()) {
            out.theme = parse_theme(theme);
        }
        if let Some(mode) = map.get("mode").and_then(|v| v.as_str()) {
            out.mode = match mode {
                "light" => Mode::Light,
                _ => Mode::Dark,
            };
        }
        if let Some(layout) = map.get("layout").and_then(|v| v.as_str()) {
            out.layout = match layout {
                "grid" => Layout::Grid,
                _ => Layout::Single,
            };
        }
        if let Some(secs) = map.get("refreshInterval").and_then(as_secs) {
            out.refresh_interval = secs.min(MAX_REFRESH_SECS);
        }
        if let Some(key) = map.get("apiKey").and_then(|v| v.as_str()) {
            out.api_key = key.trim().to_string();
        }
        out
    }

    pub fn bump_refresh(&mut self, up: bool) {
        self.refresh_interval = if up {
            (self.refresh_interval + REFRESH_STEP_SECS).min(MAX_REFRESH_SECS)
        } else {
            self.refresh_interval.saturating_sub(REFRESH_STEP_SECS)
        };
    }

    pub fn bump_opacity(&mut self, up: bool) {
        self.opacity = if up {
            self.opacity.saturating_add(10).min(100)
        } else {
            self.opacity.saturating_sub(10)
        };
    }
}

fn parse_theme(raw: &str) -> Theme {
    Theme::ALL
        .into_iter()
        .find(|t| t.label() == raw.trim())
        .unwrap_or(Theme::Green)
}

fn as_secs(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    value.as_str().and_then(|s| s.trim().parse::<u64>().ok())
}

/// Where a credential can come from, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Typed into the settings overlay during this session.
    pub explicit: Option<String>,
    /// Handed over by the embedding host (`pkey`).
    pub host: Option<String>,
    pub stored: String,
}

impl CredentialSources {
    pub fn resolve(&self) -> Option<String> {
        self.explicit
            .as_deref()
            .and_then(non_empty)
            .or_else(|| self.host.as_deref().and_then(non_empty))
            .or_else(|| non_empty(&self.stored))
            .map(str::to_string)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
