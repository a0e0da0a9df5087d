use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counterparty index used in transfer history entries for the bank.
pub const BANK_INDEX: i32 = -1;

/// Display name of the bank in transfer history entries.
pub const BANK_NAME: &str = "Банк";

/// One seat in a room's ordered player list. The position in
/// [`GameRoom::players`] is the stable player index used by every ledger
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPlayer {
    /// Registry id of the account occupying this seat
    pub user_id: String,
    /// Display name shown in history entries
    pub name: String,
}

impl RoomPlayer {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }
}

/// Kind of a credit-history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditEntryKind {
    Take,
    Payoff,
}

/// One credit-affecting event. `take` entries carry the payment snapshot
/// computed at draw time; `payoff` entries carry only the amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub player_index: usize,
    #[serde(rename = "type")]
    pub kind: CreditEntryKind,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_credit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_monthly_payment: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Kind of a transfer-history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Deposit,
    Withdrawal,
    Credit,
    CreditPayoff,
}

/// One balance-affecting event between two counterparties. Index `-1`
/// denotes the bank on either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub sender: String,
    pub recipient: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
    pub sender_index: i32,
    pub recipient_index: i32,
    #[serde(rename = "type")]
    pub kind: TransferKind,
    pub description: String,
}

/// Loan state for one room: outstanding principal per player index plus the
/// append-only history of every draw and payoff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditData {
    pub player_credits: Vec<i64>,
    pub credit_history: Vec<CreditEntry>,
}

/// Economic state of one room. Arrays are lazily sized to the player count
/// on first use so rooms created before the economy started stay cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub player_balances: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_data: Option<CreditData>,
    #[serde(default)]
    pub transfers_history: Vec<TransferEntry>,
    /// One-shot flag: starting savings were already granted to this room
    #[serde(default)]
    pub starting_savings_given: bool,
}

/// A game room as seen by the economy: ordered players plus their shared
/// ledger state. Ownership of the room (matchmaking, turns, board state)
/// lives outside this crate; callers pass `&mut GameRoom` and serialize
/// access per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRoom {
    pub name: String,
    pub players: Vec<RoomPlayer>,
    #[serde(default)]
    pub game_data: GameData,
}

impl GameRoom {
    pub fn new(name: impl Into<String>, players: Vec<RoomPlayer>) -> Self {
        Self {
            name: name.into(),
            players,
            game_data: GameData::default(),
        }
    }

    /// Display name for a seat, with the historical «Игрок N» fallback for
    /// empty or missing names.
    pub fn player_name(&self, player_index: usize) -> String {
        match self.players.get(player_index) {
            Some(player) if !player.name.is_empty() => player.name.clone(),
            _ => format!("Игрок {}", player_index + 1),
        }
    }

    /// Current cash balance for a seat; zero when the balances array was
    /// never initialized or the index is out of range.
    pub fn balance(&self, player_index: usize) -> i64 {
        self.game_data
            .player_balances
            .get(player_index)
            .copied()
            .unwrap_or(0)
    }

    /// Outstanding loan principal for a seat; zero when no credit data
    /// exists yet.
    pub fn outstanding_credit(&self, player_index: usize) -> i64 {
        self.game_data
            .credit_data
            .as_ref()
            .and_then(|credit| credit.player_credits.get(player_index))
            .copied()
            .unwrap_or(0)
    }

    /// Grows the balances array to the player count, zero-filling new slots.
    pub(crate) fn ensure_balances(&mut self) {
        let player_count = self.players.len();
        if self.game_data.player_balances.len() < player_count {
            self.game_data.player_balances.resize(player_count, 0);
        }
    }
}
