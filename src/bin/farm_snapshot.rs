use anyhow::Context;

use farm_terminal::catalog;
use farm_terminal::farm_fetch;
use farm_terminal::persist;
use farm_terminal::render::{
    amount_to_feed, feed_percent, format_area, format_local_time, format_price, render_animals,
    render_fields,
};
use farm_terminal::settings::CredentialSources;
use farm_terminal::state::now_secs;
use farm_terminal::timers::{countdown, growth_progress};

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut args = std::env::args().skip(1);
    let mut explicit = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--key" => explicit = args.next(),
            other => anyhow::bail!("unknown argument: {other} (usage: farm_snapshot [--key KEY])"),
        }
    }

    let sources = CredentialSources {
        explicit,
        host: std::env::var("FARM_HOST_KEY").ok(),
        stored: persist::load_settings().api_key,
    };
    let key = sources.resolve().unwrap_or_default();
    let snapshot = farm_fetch::fetch_snapshot(&key).context("fetch failed")?;

    let now = now_secs();
    println!("== Fields");
    for card in render_fields(catalog::FIELDS, &snapshot.fields, now) {
        let Some(record) = &card.record else {
            println!(
                "{:<12} {:>8} {:>12} lvl {:<3} UNOWNED",
                card.name(),
                format_area(card.info.area),
                format_price(card.info.price),
                card.info.level
            );
            continue;
        };
        let mut line = format!(
            "{:<12} {:>8} {:<14} {}",
            card.name(),
            format_area(card.info.area),
            record.crop_name.as_deref().unwrap_or("None"),
            record.state.label().to_uppercase()
        );
        if let Some((planted, harvest)) = card.growth_window() {
            let left = countdown(Some(harvest), now);
            let grown = growth_progress(Some(planted), Some(harvest), now).unwrap_or(0.0);
            line.push_str(&format!(
                "  {} ({grown:.0}%) ready {}",
                left.text(),
                format_local_time(harvest)
            ));
        }
        println!("{line}");
    }

    println!("== Animals");
    for card in render_animals(catalog::ANIMALS, &snapshot.animals, now) {
        let Some(record) = &card.record else {
            println!(
                "{:<14} 0/10  feed {:<12} UNOWNED",
                card.display_name(),
                card.info.feed_type
            );
            continue;
        };
        println!(
            "{:<14} {}/10  feed {:<12} {:>3.0}% (+{})  collect {}",
            card.display_name(),
            record.total,
            card.info.feed_type,
            feed_percent(record.feed_level, record.feed_max),
            amount_to_feed(record.feed_level, record.feed_max),
            countdown(record.collection_time, now).text()
        );
    }
    Ok(())
}
