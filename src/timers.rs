//! Time-derived card fields, refreshed once per second without re-rendering.

use std::collections::HashMap;

use crate::render::{AnimalCard, FieldCard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Countdown {
    NotAvailable,
    Ready,
    Remaining(String),
}

impl Countdown {
    pub fn text(&self) -> &str {
        match self {
            Countdown::NotAvailable => "N/A",
            Countdown::Ready => "Ready!",
            Countdown::Remaining(hms) => hms,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Countdown::Ready)
    }
}

pub fn countdown(end: Option<i64>, now: i64) -> Countdown {
    let Some(end) = end.filter(|ts| *ts > 0) else {
        return Countdown::NotAvailable;
    };
    let remaining = end - now;
    if remaining <= 0 {
        Countdown::Ready
    } else {
        Countdown::Remaining(format_hms(remaining))
    }
}

/// Zero-padded `HH:MM:SS`; hours keep growing past 99.
pub fn format_hms(remaining: i64) -> String {
    let remaining = remaining.max(0);
    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    let seconds = remaining % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Growth in percent, clamped to `0..=100`. `None` when the window is unusable,
/// in which case the caller keeps whatever it showed before.
pub fn growth_progress(start: Option<i64>, end: Option<i64>, now: i64) -> Option<f64> {
    let start = start.filter(|ts| *ts > 0)?;
    let end = end.filter(|ts| *ts > 0)?;
    if end == start {
        return None;
    }
    let progress = (now - start) as f64 / (end - start) as f64 * 100.0;
    Some(progress.clamp(0.0, 100.0))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Harvest(String),
    Collection(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountdownTarget {
    pub end: Option<i64>,
    pub display: Countdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTarget {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub percent: f64,
}

/// Live values for the cards of the last render, keyed by card identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveTimers {
    countdowns: HashMap<TimerKey, CountdownTarget>,
    progress: HashMap<String, ProgressTarget>,
}

impl LiveTimers {
    /// Registers a target for every card that shows a timer, then runs one tick
    /// so nothing is blank before the next second.
    pub fn from_cards(fields: &[FieldCard], animals: &[AnimalCard], now: i64) -> Self {
        let mut timers = LiveTimers::default();
        for card in fields {
            let Some((planted, harvest)) = card.growth_window() else {
                continue;
            };
            timers.countdowns.insert(
                TimerKey::Harvest(card.name().to_string()),
                CountdownTarget {
                    end: Some(harvest),
                    display: Countdown::NotAvailable,
                },
            );
            timers.progress.insert(
                card.name().to_string(),
                ProgressTarget {
                    start: Some(planted),
                    end: Some(harvest),
                    percent: 0.0,
                },
            );
        }
        for card in animals {
            let Some(record) = &card.record else {
                continue;
            };
            timers.countdowns.insert(
                TimerKey::Collection(card.int_name().to_string()),
                CountdownTarget {
                    end: record.collection_time,
                    display: Countdown::NotAvailable,
                },
            );
        }
        timers.tick(now);
        timers
    }

    pub fn tick(&mut self, now: i64) {
        for target in self.countdowns.values_mut() {
            target.display = countdown(target.end, now);
        }
        for target in self.progress.values_mut() {
            if let Some(percent) = growth_progress(target.start, target.end, now) {
                target.percent = percent;
            }
        }
    }

    pub fn countdown(&self, key: &TimerKey) -> Option<&Countdown> {
        self.countdowns.get(key).map(|t| &t.display)
    }

    pub fn harvest(&self, field: &str) -> Option<&Countdown> {
        self.countdown(&TimerKey::Harvest(field.to_string()))
    }

    pub fn collection(&self, int_name: &str) -> Option<&Countdown> {
        self.countdown(&TimerKey::Collection(int_name.to_string()))
    }

    pub fn progress(&self, field: &str) -> Option<f64> {
        self.progress.get(field).map(|t| t.percent)
    }

    pub fn len(&self) -> usize {
        self.countdowns.len() + self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{Countdown, countdown, format_hms, growth_progress};

    #[test]
    fn countdown_formats_and_flags_ready() {
        let now = 1_000_000;
        assert_eq!(
            countdown(Some(now + 3661), now),
            Countdown::Remaining("01:01:01".to_string())
        );
        assert_eq!(countdown(Some(now - 5), now), Countdown::Ready);
        assert_eq!(countdown(Some(now), now), Countdown::Ready);
        assert_eq!(countdown(None, now), Countdown::NotAvailable);
        assert_eq!(countdown(Some(0), now), Countdown::NotAvailable);
    }

    #[test]
    fn hms_handles_long_waits() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(100 * 3600 + 59), "100:00:59");
    }

    #[test]
    fn progress_clamps() {
        assert_eq!(growth_progress(Some(100), Some(200), 50), Some(0.0));
        assert_eq!(growth_progress(Some(100), Some(200), 300), Some(100.0));
        assert_eq!(growth_progress(Some(100), Some(200), 150), Some(50.0));
    }

    #[test]
    fn progress_skips_degenerate_windows() {
        assert_eq!(growth_progress(Some(100), Some(100), 150), None);
        assert_eq!(growth_progress(None, Some(100), 150), None);
        assert_eq!(growth_progress(Some(100), None, 150), None);
    }
}
