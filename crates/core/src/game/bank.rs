//! Банковские операции над экономикой комнаты.
//!
//! Все изменения балансов — пополнения, списания, переводы между игроками,
//! стартовые сбережения и движения по кредитам — проходят через две
//! внутренние функции ([`apply_bank_credit`] / [`apply_bank_debit`]),
//! каждая из которых изменяет баланс и добавляет ровно одну запись в
//! историю переводов. Баланс без записи (или запись без баланса) здесь
//! невозможны по построению.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::core::config;
use crate::core::utils::format_money;
use crate::game::room::{GameRoom, TransferEntry, TransferKind, BANK_INDEX, BANK_NAME};

/// Описание, используемое при начислении стартовых сбережений.
pub const STARTING_SAVINGS_DESCRIPTION: &str = "Стартовые сбережения";

/// Bank operation errors
#[derive(Debug, Error)]
pub enum BankError {
    /// Amount is non-positive or outside the transfer limits
    #[error("invalid amount")]
    InvalidAmount,

    /// Sender balance is lower than the requested amount
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Player index is outside the room's player list
    #[error("player with index {index} not found")]
    UnknownPlayer { index: usize },

    /// Sender and recipient are the same seat
    #[error("cannot transfer funds to yourself")]
    SelfTransfer,

    /// Starting savings were already granted to this room
    #[error("starting savings already granted")]
    AlreadyGranted,
}

/// Результат перевода между игроками.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub sender_balance: i64,
    pub recipient_balance: i64,
}

/// Пополняет баланс игрока со стороны банка.
///
/// Добавляет деньги на баланс и записывает перевод банк → игрок в историю.
/// Возвращает новый баланс.
pub fn deposit(
    room: &mut GameRoom,
    player_index: usize,
    amount: i64,
    description: Option<&str>,
) -> Result<i64, BankError> {
    if amount <= 0 {
        return Err(BankError::InvalidAmount);
    }
    if player_index >= room.players.len() {
        return Err(BankError::UnknownPlayer {
            index: player_index,
        });
    }

    let new_balance = apply_bank_credit(
        room,
        player_index,
        amount,
        TransferKind::Deposit,
        description.unwrap_or("Пополнение баланса").to_string(),
    );
    log::debug!(
        "Пополнение: +${} игроку {} (баланс: ${})",
        format_money(amount),
        room.player_name(player_index),
        format_money(new_balance)
    );
    Ok(new_balance)
}

/// Списывает деньги с баланса игрока в пользу банка.
///
/// Проверяет достаточность средств до любых изменений. Возвращает новый
/// баланс.
pub fn withdraw(
    room: &mut GameRoom,
    player_index: usize,
    amount: i64,
    description: Option<&str>,
) -> Result<i64, BankError> {
    if amount <= 0 {
        return Err(BankError::InvalidAmount);
    }
    if player_index >= room.players.len() {
        return Err(BankError::UnknownPlayer {
            index: player_index,
        });
    }
    if room.balance(player_index) < amount {
        return Err(BankError::InsufficientFunds);
    }

    let new_balance = apply_bank_debit(
        room,
        player_index,
        amount,
        TransferKind::Withdrawal,
        description.unwrap_or("Списание с баланса").to_string(),
    );
    log::debug!(
        "Списание: -${} у игрока {} (баланс: ${})",
        format_money(amount),
        room.player_name(player_index),
        format_money(new_balance)
    );
    Ok(new_balance)
}

/// Перевод между игроками.
///
/// Выполняется как пара списание + пополнение с банком в роли посредника,
/// поэтому в истории остаются две записи с понятными игроку описаниями.
/// Вся валидация происходит до изменений: при любой ошибке комната
/// остается нетронутой.
pub fn transfer(
    room: &mut GameRoom,
    sender_index: usize,
    recipient_index: usize,
    amount: i64,
) -> Result<TransferOutcome, BankError> {
    if amount < config::bank::MIN_TRANSFER_AMOUNT || amount > config::bank::MAX_TRANSFER_AMOUNT {
        return Err(BankError::InvalidAmount);
    }
    if sender_index >= room.players.len() {
        return Err(BankError::UnknownPlayer {
            index: sender_index,
        });
    }
    if recipient_index >= room.players.len() {
        return Err(BankError::UnknownPlayer {
            index: recipient_index,
        });
    }
    if sender_index == recipient_index {
        return Err(BankError::SelfTransfer);
    }
    if room.balance(sender_index) < amount {
        return Err(BankError::InsufficientFunds);
    }

    let sender_name = room.player_name(sender_index);
    let recipient_name = room.player_name(recipient_index);

    let sender_balance = apply_bank_debit(
        room,
        sender_index,
        amount,
        TransferKind::Withdrawal,
        format!("Перевод игроку {}", recipient_name),
    );
    let recipient_balance = apply_bank_credit(
        room,
        recipient_index,
        amount,
        TransferKind::Deposit,
        format!("Перевод от игрока {}", sender_name),
    );

    log::info!(
        "Перевод ${}: {} → {} (балансы: ${} / ${})",
        format_money(amount),
        sender_name,
        recipient_name,
        format_money(sender_balance),
        format_money(recipient_balance)
    );
    Ok(TransferOutcome {
        sender_balance,
        recipient_balance,
    })
}

/// Начисляет стартовые сбережения всем игрокам комнаты.
///
/// Одноразовая операция: повторный вызов возвращает
/// [`BankError::AlreadyGranted`] и ничего не меняет. Возвращает сумму,
/// начисленную каждому игроку.
pub fn grant_starting_savings(room: &mut GameRoom) -> Result<i64, BankError> {
    if room.game_data.starting_savings_given {
        return Err(BankError::AlreadyGranted);
    }

    let amount = *config::STARTING_BALANCE;
    for player_index in 0..room.players.len() {
        apply_bank_credit(
            room,
            player_index,
            amount,
            TransferKind::Deposit,
            STARTING_SAVINGS_DESCRIPTION.to_string(),
        );
    }
    room.game_data.starting_savings_given = true;

    log::info!(
        "Стартовые сбережения начислены: ${} × {} игроков",
        format_money(amount),
        room.players.len()
    );
    Ok(amount)
}

/// Движение банк → игрок: увеличивает баланс и добавляет одну запись в
/// историю переводов. Вызывающая сторона обязана провести валидацию до
/// вызова; индекс должен быть в пределах списка игроков.
pub(crate) fn apply_bank_credit(
    room: &mut GameRoom,
    player_index: usize,
    amount: i64,
    kind: TransferKind,
    description: String,
) -> i64 {
    room.ensure_balances();
    room.game_data.player_balances[player_index] += amount;
    let new_balance = room.game_data.player_balances[player_index];

    let recipient = room.player_name(player_index);
    room.game_data.transfers_history.push(TransferEntry {
        sender: BANK_NAME.to_string(),
        recipient,
        amount,
        timestamp: Utc::now(),
        sender_index: BANK_INDEX,
        recipient_index: player_index as i32,
        kind,
        description,
    });
    new_balance
}

/// Движение игрок → банк: уменьшает баланс и добавляет одну запись в
/// историю переводов. Валидация (достаточность средств, индекс) — на
/// вызывающей стороне.
pub(crate) fn apply_bank_debit(
    room: &mut GameRoom,
    player_index: usize,
    amount: i64,
    kind: TransferKind,
    description: String,
) -> i64 {
    room.ensure_balances();
    room.game_data.player_balances[player_index] -= amount;
    let new_balance = room.game_data.player_balances[player_index];

    let sender = room.player_name(player_index);
    room.game_data.transfers_history.push(TransferEntry {
        sender,
        recipient: BANK_NAME.to_string(),
        amount,
        timestamp: Utc::now(),
        sender_index: player_index as i32,
        recipient_index: BANK_INDEX,
        kind,
        description,
    });
    new_balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::room::RoomPlayer;

    fn two_player_room() -> GameRoom {
        GameRoom::new(
            "test",
            vec![
                RoomPlayer::new("user_a", "Алиса"),
                RoomPlayer::new("user_b", "Боб"),
            ],
        )
    }

    #[test]
    fn test_deposit_updates_balance_and_history() {
        let mut room = two_player_room();
        let balance = deposit(&mut room, 0, 500, None).unwrap();

        assert_eq!(balance, 500);
        assert_eq!(room.balance(0), 500);
        assert_eq!(room.game_data.transfers_history.len(), 1);

        let entry = &room.game_data.transfers_history[0];
        assert_eq!(entry.kind, TransferKind::Deposit);
        assert_eq!(entry.sender, BANK_NAME);
        assert_eq!(entry.sender_index, BANK_INDEX);
        assert_eq!(entry.recipient_index, 0);
        assert_eq!(entry.description, "Пополнение баланса");
    }

    #[test]
    fn test_deposit_rejects_bad_input() {
        let mut room = two_player_room();
        assert!(matches!(
            deposit(&mut room, 0, 0, None),
            Err(BankError::InvalidAmount)
        ));
        assert!(matches!(
            deposit(&mut room, 0, -100, None),
            Err(BankError::InvalidAmount)
        ));
        assert!(matches!(
            deposit(&mut room, 5, 100, None),
            Err(BankError::UnknownPlayer { index: 5 })
        ));
        assert!(room.game_data.transfers_history.is_empty());
    }

    #[test]
    fn test_withdraw_requires_funds() {
        let mut room = two_player_room();
        deposit(&mut room, 0, 300, None).unwrap();

        assert!(matches!(
            withdraw(&mut room, 0, 500, None),
            Err(BankError::InsufficientFunds)
        ));
        // Неудачная попытка ничего не меняет
        assert_eq!(room.balance(0), 300);
        assert_eq!(room.game_data.transfers_history.len(), 1);

        let balance = withdraw(&mut room, 0, 300, Some("Налоги")).unwrap();
        assert_eq!(balance, 0);
        let entry = room.game_data.transfers_history.last().unwrap();
        assert_eq!(entry.kind, TransferKind::Withdrawal);
        assert_eq!(entry.recipient_index, BANK_INDEX);
        assert_eq!(entry.description, "Налоги");
    }

    #[test]
    fn test_transfer_moves_value_between_players() {
        let mut room = two_player_room();
        deposit(&mut room, 0, 1000, None).unwrap();

        let outcome = transfer(&mut room, 0, 1, 400).unwrap();
        assert_eq!(outcome.sender_balance, 600);
        assert_eq!(outcome.recipient_balance, 400);

        // Перевод не создает и не уничтожает деньги
        assert_eq!(room.balance(0) + room.balance(1), 1000);

        // Пара записей: списание у отправителя, пополнение получателю
        let entries = &room.game_data.transfers_history;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].description, "Перевод игроку Боб");
        assert_eq!(entries[2].description, "Перевод от игрока Алиса");
    }

    #[test]
    fn test_transfer_validation() {
        let mut room = two_player_room();
        deposit(&mut room, 0, 1000, None).unwrap();
        let history_len = room.game_data.transfers_history.len();

        assert!(matches!(
            transfer(&mut room, 0, 0, 100),
            Err(BankError::SelfTransfer)
        ));
        assert!(matches!(
            transfer(&mut room, 0, 7, 100),
            Err(BankError::UnknownPlayer { index: 7 })
        ));
        assert!(matches!(
            transfer(&mut room, 0, 1, 0),
            Err(BankError::InvalidAmount)
        ));
        assert!(matches!(
            transfer(&mut room, 0, 1, config::bank::MAX_TRANSFER_AMOUNT + 1),
            Err(BankError::InvalidAmount)
        ));
        assert!(matches!(
            transfer(&mut room, 0, 1, 2000),
            Err(BankError::InsufficientFunds)
        ));

        assert_eq!(room.balance(0), 1000);
        assert_eq!(room.game_data.transfers_history.len(), history_len);
    }

    #[test]
    fn test_starting_savings_is_one_shot() {
        let mut room = two_player_room();
        let amount = grant_starting_savings(&mut room).unwrap();

        assert_eq!(room.balance(0), amount);
        assert_eq!(room.balance(1), amount);
        assert_eq!(room.game_data.transfers_history.len(), 2);
        assert!(room
            .game_data
            .transfers_history
            .iter()
            .all(|entry| entry.description == STARTING_SAVINGS_DESCRIPTION));

        assert!(matches!(
            grant_starting_savings(&mut room),
            Err(BankError::AlreadyGranted)
        ));
        assert_eq!(room.balance(0), amount);
        assert_eq!(room.game_data.transfers_history.len(), 2);
    }
}
