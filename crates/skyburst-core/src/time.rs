/// Milliseconds since the Unix epoch, saturating to 0 if the clock is before it.
pub fn unix_millis_now() -> u64 {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_millis() as u64
}

/// Whole seconds since the Unix epoch.
pub fn unix_secs_now() -> u64 {
    unix_millis_now() / 1000
}
