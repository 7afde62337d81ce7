/// Minimum gap between two non-forced fetches.
pub const CACHE_DURATION_MS: i64 = 30_000;

/// `true` when a fetch may go out: forced, or the last success is at least
/// [`CACHE_DURATION_MS`] old. Timestamps are epoch milliseconds; `0` means
/// nothing has been fetched yet.
pub fn should_fetch(now_ms: i64, last_successful_fetch_ms: i64, force: bool) -> bool {
    force || now_ms - last_successful_fetch_ms >= CACHE_DURATION_MS
}
