//! Per-room game economy.
//!
//! A [`GameRoom`] owns the ordered player list and the economic state the
//! ledger operations mutate: flat balance/credit arrays keyed by player
//! index and two append-only histories. The caller is responsible for
//! serializing access per room (one actor per room, or a lock keyed by room
//! id); every operation here takes `&mut GameRoom` and runs to completion
//! without suspending, so the four linked collections are always updated as
//! one indivisible unit.

pub mod bank;
pub mod credit;
pub mod room;

pub use self::bank::{BankError, TransferOutcome};
pub use self::credit::{
    CreditError, CreditPaid, CreditPolicy, CreditService, CreditStatus, CreditTaken,
};
pub use self::room::{
    CreditData, CreditEntry, CreditEntryKind, GameData, GameRoom, RoomPlayer, TransferEntry,
    TransferKind,
};
