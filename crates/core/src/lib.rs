//! Kubyshka — game-economy core for the «Энергия денег» board game.
//!
//! This library provides the multiplayer-economy subsystem shared by the
//! game server and its admin surfaces: a player identity registry with
//! presence tracking, and the per-room bank/credit ledger that keeps every
//! balance mutation auditable.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, and shared helpers
//! - `users`: identity registry (stable ids, connections, presence, stats)
//! - `game`: per-room economy (balances, bank operations, credit ledger)
//!
//! Transport (WebSocket/HTTP), persistence, and the Telegram bot live in
//! separate crates; this one owns only the in-memory state machines and
//! their invariants.

pub mod core;
pub mod game;
pub mod users;

// Re-export commonly used types for convenience
pub use crate::core::error::{AppError, AppResult};
pub use crate::game::{BankError, CreditError, CreditPolicy, CreditService, GameRoom, RoomPlayer};
pub use crate::users::{IdentityError, UserIdentity, UserRegistry};
