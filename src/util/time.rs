//! Time utilities for game simulation

use std::time::Instant;

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60;
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Delta time for one simulation tick (in seconds)
pub fn tick_delta() -> f64 {
    1.0 / SIMULATION_TPS as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_delta_matches_rate() {
        assert!((tick_delta() * SIMULATION_TPS as f64 - 1.0).abs() < 1e-12);
        assert_eq!(TICK_DURATION_MICROS, 16_666);
    }
}
