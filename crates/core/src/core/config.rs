use once_cell::sync::Lazy;
use std::env;

/// Стартовые сбережения, начисляемые каждому игроку при старте экономики
/// комнаты.
/// Читается из переменной окружения STARTING_BALANCE, по умолчанию 10000.
pub static STARTING_BALANCE: Lazy<i64> = Lazy::new(|| {
    env::var("STARTING_BALANCE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10_000)
});

/// Credit product configuration.
///
/// Fixed per deployment; `CreditPolicy::default()` picks these up, custom
/// policies can be injected via `CreditService::with_policy`.
pub mod credit {
    /// Loan amounts must be a multiple of this step
    pub const STEP: i64 = 1000;

    /// Minimum loan amount per draw
    pub const MIN_AMOUNT: i64 = 1000;

    /// Maximum cumulative outstanding principal per player
    pub const MAX_CREDIT: i64 = 10_000;

    /// Monthly payment charged per STEP of outstanding principal
    pub const PAYMENT_RATE: i64 = 100;
}

/// Bank transfer limits.
pub mod bank {
    /// Smallest transferable amount
    pub const MIN_TRANSFER_AMOUNT: i64 = 1;

    /// Largest transferable amount
    pub const MAX_TRANSFER_AMOUNT: i64 = 1_000_000;
}
