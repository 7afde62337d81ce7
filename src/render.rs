//! Merges the static catalog with the latest snapshot into ordered display cards.
//!
//! Rendering is a pure function of its inputs: every call builds the full card
//! list from scratch, so callers can throw the previous list away.

use std::cmp::Ordering;

use chrono::{Local, TimeZone};

use crate::catalog::{AnimalInfo, FieldInfo};
use crate::state::{AnimalRecord, FieldRecord, FieldState};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldCard {
    pub info: FieldInfo,
    pub record: Option<FieldRecord>,
}

impl FieldCard {
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn is_owned(&self) -> bool {
        self.record.is_some()
    }

    pub fn state(&self) -> Option<&FieldState> {
        self.record.as_ref().map(|r| &r.state)
    }

    /// `(planted, harvest)` for a growing field with both timestamps known.
    pub fn growth_window(&self) -> Option<(i64, i64)> {
        let record = self.record.as_ref()?;
        if record.state != FieldState::Growing {
            return None;
        }
        Some((record.time_planted?, record.harvest_time?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimalCard {
    pub info: AnimalInfo,
    pub record: Option<AnimalRecord>,
}

impl AnimalCard {
    pub fn int_name(&self) -> &'static str {
        self.info.int_name
    }

    pub fn display_name(&self) -> &'static str {
        self.info.display_name
    }

    pub fn is_owned(&self) -> bool {
        self.record.is_some()
    }

    /// Nothing pending: no collection timestamp, or it has already passed.
    pub fn is_ready(&self, now: i64) -> bool {
        match self.record.as_ref().and_then(|r| r.collection_time) {
            Some(ts) => ts <= now,
            None => true,
        }
    }
}

pub fn render_fields(catalog: &[FieldInfo], records: &[FieldRecord], now: i64) -> Vec<FieldCard> {
    let mut cards: Vec<FieldCard> = catalog
        .iter()
        .map(|info| FieldCard {
            info: *info,
            record: records.iter().find(|r| r.name == info.name).cloned(),
        })
        .collect();
    cards.sort_by(|a, b| compare_fields(a, b, now));
    cards
}

pub fn render_animals(
    catalog: &[AnimalInfo],
    records: &[AnimalRecord],
    now: i64,
) -> Vec<AnimalCard> {
    let mut cards: Vec<AnimalCard> = catalog
        .iter()
        .map(|info| AnimalCard {
            info: *info,
            record: records.iter().find(|r| r.int_name == info.int_name).cloned(),
        })
        .collect();
    cards.sort_by(|a, b| compare_animals(a, b, now));
    cards
}

fn compare_fields(a: &FieldCard, b: &FieldCard, now: i64) -> Ordering {
    let (ra, rb) = match (&a.record, &b.record) {
        (Some(ra), Some(rb)) => (ra, rb),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => return a.name().cmp(b.name()),
    };

    ra.state
        .priority()
        .cmp(&rb.state.priority())
        .then_with(|| {
            if ra.state == FieldState::Growing && rb.state == FieldState::Growing {
                let left = ra.harvest_time.unwrap_or(0) - now;
                let right = rb.harvest_time.unwrap_or(0) - now;
                left.cmp(&right)
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.name().cmp(b.name()))
}

fn compare_animals(a: &AnimalCard, b: &AnimalCard, now: i64) -> Ordering {
    let (ra, rb) = match (&a.record, &b.record) {
        (Some(ra), Some(rb)) => (ra, rb),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => return a.display_name().cmp(b.display_name()),
    };

    b.is_ready(now)
        .cmp(&a.is_ready(now))
        .then_with(|| {
            ra.collection_time
                .unwrap_or(0)
                .cmp(&rb.collection_time.unwrap_or(0))
        })
        .then_with(|| a.display_name().cmp(b.display_name()))
}

/// `$3mil` from a million up, `$750,000` below.
pub fn format_price(price: u64) -> String {
    if price >= 1_000_000 {
        let millions = (price as f64 / 1_000_000.0).round() as u64;
        return format!("${millions}mil");
    }
    format!("${}", group_thousands(price))
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_area(area: f64) -> String {
    format!("{}m²", area.round() as i64)
}

/// Feed fill in percent, clamped to `0..=100`; an empty trough size gives 0.
pub fn feed_percent(feed_level: i64, feed_max: i64) -> f64 {
    if feed_max <= 0 {
        return 0.0;
    }
    (feed_level as f64 / feed_max as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn amount_to_feed(feed_level: i64, feed_max: i64) -> i64 {
    feed_max.saturating_sub(feed_level).max(0)
}

/// Local date and time of an epoch-second timestamp.
pub fn format_local_time(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::{amount_to_feed, feed_percent, format_area, format_price, group_thousands};

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(3_000_000), "$3mil");
        assert_eq!(format_price(750_000), "$750,000");
        assert_eq!(format_price(1_750_000), "$2mil");
        assert_eq!(format_price(30_000), "$30,000");
        assert_eq!(format_price(999), "$999");
    }

    #[test]
    fn grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(123_456_789), "123,456,789");
    }

    #[test]
    fn area_rounds() {
        assert_eq!(format_area(1907.4), "1907m²");
        assert_eq!(format_area(1907.5), "1908m²");
    }

    #[test]
    fn feed_is_clamped() {
        assert_eq!(feed_percent(50, 200), 25.0);
        assert_eq!(feed_percent(300, 200), 100.0);
        assert_eq!(feed_percent(-5, 200), 0.0);
        assert_eq!(feed_percent(5, 0), 0.0);
        assert_eq!(amount_to_feed(150, 200), 50);
        assert_eq!(amount_to_feed(250, 200), 0);
        assert_eq!(amount_to_feed(-1, i64::MAX), i64::MAX);
        assert_eq!(amount_to_feed(i64::MAX, i64::MIN), 0);
    }
}
