use std::fs;
use std::path::PathBuf;

use farm_terminal::farm_fetch::{RawResponse, snapshot_from_responses};
use farm_terminal::state::Snapshot;

/// Epoch seconds the fixtures are built around.
#[allow(dead_code)]
pub const NOW: i64 = 1_700_000_000;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[allow(dead_code)]
pub fn fixture_snapshot(captured_at_ms: i64) -> Snapshot {
    let ok = |name: &str| RawResponse {
        status: 200,
        body: read_fixture(name),
    };
    snapshot_from_responses(ok("fields.json"), ok("animals.json"), captured_at_ms)
        .expect("fixtures should parse")
}
