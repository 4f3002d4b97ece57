// src/services/state_rates.rs

/// Used when no state is given or the state is not in [`STATE_RATES`].
pub const GENERIC_DEFAULT_RATE: f64 = 0.16;

/// Typical residential retail price by state/territory, USD/kWh.
pub const STATE_RATES: &[(&str, f64)] = &[
    ("AK", 0.24),
    ("AL", 0.15),
    ("AR", 0.12),
    ("AZ", 0.14),
    ("CA", 0.30),
    ("CO", 0.15),
    ("CT", 0.29),
    ("DC", 0.17),
    ("DE", 0.16),
    ("FL", 0.15),
    ("GA", 0.14),
    ("HI", 0.42),
    ("IA", 0.14),
    ("ID", 0.11),
    ("IL", 0.16),
    ("IN", 0.15),
    ("KS", 0.14),
    ("KY", 0.13),
    ("LA", 0.12),
    ("MA", 0.29),
    ("MD", 0.17),
    ("ME", 0.27),
    ("MI", 0.19),
    ("MN", 0.15),
    ("MO", 0.13),
    ("MS", 0.13),
    ("MT", 0.13),
    ("NC", 0.14),
    ("ND", 0.12),
    ("NE", 0.12),
    ("NH", 0.26),
    ("NJ", 0.18),
    ("NM", 0.15),
    ("NV", 0.16),
    ("NY", 0.23),
    ("OH", 0.16),
    ("OK", 0.13),
    ("OR", 0.13),
    ("PA", 0.18),
    ("PR", 0.25),
    ("RI", 0.28),
    ("SC", 0.14),
    ("SD", 0.13),
    ("TN", 0.13),
    ("TX", 0.15),
    ("UT", 0.12),
    ("VA", 0.14),
    ("VT", 0.22),
    ("WA", 0.12),
    ("WI", 0.17),
    ("WV", 0.14),
    ("WY", 0.12),
];

/// Looks up a normalized (uppercase) state code.
pub fn state_rate(state: &str) -> Option<f64> {
    STATE_RATES
        .iter()
        .find(|(code, _)| *code == state)
        .map(|(_, rate)| *rate)
}
