//! Кредитный продукт игровой экономики.
//!
//! Игрок может занимать у банка деньги шагами по $1,000 в пределах общего
//! лимита и гасить долг частично или целиком. Каждая операция атомарно
//! обновляет четыре связанные коллекции комнаты: сумму долга, историю
//! кредитов, баланс и историю переводов.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::core::config;
use crate::core::utils::format_money;
use crate::game::bank::{apply_bank_credit, apply_bank_debit};
use crate::game::room::{CreditData, CreditEntry, CreditEntryKind, GameRoom, TransferKind};

/// Credit ledger errors
#[derive(Debug, Error)]
pub enum CreditError {
    /// Amount fails the step/minimum rule
    #[error("credit amount must be at least {min} and a multiple of {step}")]
    InvalidAmount { min: i64, step: i64 },

    /// Draw would push the player past the credit cap; carries the
    /// remaining headroom so the caller can present it
    #[error("credit limit exceeded, available: {available}")]
    LimitExceeded { available: i64 },

    /// The room has never had credit initialized
    #[error("no credit data for this room")]
    NoCreditData,

    /// The player has nothing to pay off
    #[error("no active credit")]
    NoActiveCredit,

    /// Explicit payoff amount was zero or negative
    #[error("payoff amount must be positive")]
    InvalidPayoffAmount,

    /// Payoff amount exceeds the outstanding principal
    #[error("payoff amount exceeds outstanding credit")]
    Overpayment,

    /// Player balance cannot cover the payoff
    #[error("insufficient funds to pay off credit")]
    InsufficientFunds,

    /// Player index is outside the room's player list
    #[error("player with index {index} not found")]
    UnknownPlayer { index: usize },
}

/// Параметры кредитного продукта. Фиксируются на деплой;
/// [`Default`] берет значения из [`config::credit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPolicy {
    /// Кредит выдается суммами, кратными этому шагу
    pub step: i64,
    /// Минимальная сумма одного кредита
    pub min_amount: i64,
    /// Максимальный суммарный долг игрока
    pub max_credit: i64,
    /// Ежемесячный платеж за каждый шаг долга
    pub payment_rate: i64,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            step: config::credit::STEP,
            min_amount: config::credit::MIN_AMOUNT,
            max_credit: config::credit::MAX_CREDIT,
            payment_rate: config::credit::PAYMENT_RATE,
        }
    }
}

/// Snapshot returned by a successful draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditTaken {
    pub new_balance: i64,
    /// Amount of this specific draw
    pub new_credit_amount: i64,
    /// Outstanding principal after the draw
    pub total_credit: i64,
    /// Monthly payment attributable to this draw alone
    pub new_monthly_payment: i64,
    /// Monthly payment for the full outstanding principal after the draw
    pub total_monthly_payment: i64,
}

/// Snapshot returned by a successful payoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditPaid {
    pub new_balance: i64,
    pub remaining_credit: i64,
    pub paid_amount: i64,
}

/// Current loan standing of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditStatus {
    pub current_credit: i64,
    pub monthly_payment: i64,
    pub max_credit: i64,
    pub available_credit: i64,
    pub can_take_credit: bool,
}

/// Сервис кредитов: проверяет правила продукта и согласованно изменяет
/// кредитные данные комнаты.
///
/// Все операции синхронны и работают над одной комнатой; вызывающая
/// сторона сериализует доступ к комнате. Валидация всегда предшествует
/// изменениям: после любой ошибки комната остается ровно в том состоянии,
/// в котором была.
pub struct CreditService {
    policy: CreditPolicy,
}

impl Default for CreditService {
    fn default() -> Self {
        Self::new()
    }
}

impl CreditService {
    /// Создает сервис с параметрами продукта по умолчанию.
    pub fn new() -> Self {
        Self {
            policy: CreditPolicy::default(),
        }
    }

    /// Создает сервис с кастомными параметрами продукта.
    pub fn with_policy(policy: CreditPolicy) -> Self {
        Self { policy }
    }

    /// Текущие параметры продукта.
    pub fn policy(&self) -> CreditPolicy {
        self.policy
    }

    /// Взять кредит.
    ///
    /// Сумма должна быть не меньше минимальной и кратной шагу; суммарный
    /// долг после выдачи не может превысить лимит. При успехе атомарно:
    /// увеличивает долг игрока, пишет запись `take` в историю кредитов,
    /// увеличивает баланс и пишет перевод банк → игрок.
    ///
    /// Платеж за эту выдачу и платеж за весь долг считаются отдельно:
    /// второй — от округленного вниз *общего* долга, а не суммой платежей
    /// по выдачам.
    pub fn take_credit(
        &self,
        room: &mut GameRoom,
        player_index: usize,
        amount: i64,
    ) -> Result<CreditTaken, CreditError> {
        if amount < self.policy.min_amount || amount % self.policy.step != 0 {
            return Err(CreditError::InvalidAmount {
                min: self.policy.min_amount,
                step: self.policy.step,
            });
        }
        if player_index >= room.players.len() {
            return Err(CreditError::UnknownPlayer {
                index: player_index,
            });
        }

        let current_credit = room.outstanding_credit(player_index);
        let new_total = current_credit + amount;
        if new_total > self.policy.max_credit {
            return Err(CreditError::LimitExceeded {
                available: self.policy.max_credit - current_credit,
            });
        }

        let new_monthly_payment = (amount / self.policy.step) * self.policy.payment_rate;
        let total_monthly_payment = (new_total / self.policy.step) * self.policy.payment_rate;

        let player_count = room.players.len();
        {
            let credit_data = room
                .game_data
                .credit_data
                .get_or_insert_with(CreditData::default);
            if credit_data.player_credits.len() < player_count {
                credit_data.player_credits.resize(player_count, 0);
            }
            credit_data.player_credits[player_index] = new_total;
            credit_data.credit_history.push(CreditEntry {
                player_index,
                kind: CreditEntryKind::Take,
                amount,
                monthly_payment: Some(new_monthly_payment),
                total_credit: Some(new_total),
                total_monthly_payment: Some(total_monthly_payment),
                timestamp: Utc::now(),
                description: format!(
                    "Взят кредит на ${} (общий: ${})",
                    format_money(amount),
                    format_money(new_total)
                ),
            });
        }
        let new_balance = apply_bank_credit(
            room,
            player_index,
            amount,
            TransferKind::Credit,
            format!("Кредит на ${}", format_money(amount)),
        );

        log::info!(
            "Кредит выдан: ${} игроку {} (общий долг: ${}, платеж: ${}/мес)",
            format_money(amount),
            room.player_name(player_index),
            format_money(new_total),
            format_money(total_monthly_payment)
        );
        Ok(CreditTaken {
            new_balance,
            new_credit_amount: amount,
            total_credit: new_total,
            new_monthly_payment,
            total_monthly_payment,
        })
    }

    /// Погасить кредит.
    ///
    /// `amount: None` означает полное погашение. Проверки в строгом
    /// порядке: есть ли кредитные данные, есть ли активный долг, корректна
    /// ли сумма, не превышает ли она долг и хватает ли средств на балансе.
    /// Любая ошибка оставляет комнату нетронутой.
    pub fn payoff_credit(
        &self,
        room: &mut GameRoom,
        player_index: usize,
        amount: Option<i64>,
    ) -> Result<CreditPaid, CreditError> {
        if player_index >= room.players.len() {
            return Err(CreditError::UnknownPlayer {
                index: player_index,
            });
        }
        if room.game_data.credit_data.is_none() {
            return Err(CreditError::NoCreditData);
        }

        let current_credit = room.outstanding_credit(player_index);
        if current_credit <= 0 {
            return Err(CreditError::NoActiveCredit);
        }

        let payoff_amount = match amount {
            Some(explicit) if explicit <= 0 => return Err(CreditError::InvalidPayoffAmount),
            Some(explicit) => explicit,
            None => current_credit,
        };
        if payoff_amount > current_credit {
            return Err(CreditError::Overpayment);
        }
        if payoff_amount > room.balance(player_index) {
            return Err(CreditError::InsufficientFunds);
        }

        let remaining_credit = current_credit - payoff_amount;
        {
            // credit_data существует: проверено выше
            let Some(credit_data) = room.game_data.credit_data.as_mut() else {
                return Err(CreditError::NoCreditData);
            };
            credit_data.player_credits[player_index] = remaining_credit;
            credit_data.credit_history.push(CreditEntry {
                player_index,
                kind: CreditEntryKind::Payoff,
                amount: payoff_amount,
                monthly_payment: None,
                total_credit: None,
                total_monthly_payment: None,
                timestamp: Utc::now(),
                description: format!("Погашен кредит на ${}", format_money(payoff_amount)),
            });
        }
        let new_balance = apply_bank_debit(
            room,
            player_index,
            payoff_amount,
            TransferKind::CreditPayoff,
            format!("Погашение кредита на ${}", format_money(payoff_amount)),
        );

        log::info!(
            "Кредит погашен: ${} игроком {} (остаток долга: ${})",
            format_money(payoff_amount),
            room.player_name(player_index),
            format_money(remaining_credit)
        );
        Ok(CreditPaid {
            new_balance,
            remaining_credit,
            paid_amount: payoff_amount,
        })
    }

    /// Текущее состояние кредита игрока.
    ///
    /// Чистое чтение: не инициализирует кредитные данные. Для комнаты без
    /// кредитов возвращает нулевой снапшот с полным доступным лимитом.
    pub fn player_credit(&self, room: &GameRoom, player_index: usize) -> CreditStatus {
        let current_credit = room.outstanding_credit(player_index);
        let monthly_payment = (current_credit / self.policy.step) * self.policy.payment_rate;
        let available_credit = self.policy.max_credit - current_credit;

        CreditStatus {
            current_credit,
            monthly_payment,
            max_credit: self.policy.max_credit,
            available_credit,
            can_take_credit: available_credit >= self.policy.min_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::room::{RoomPlayer, BANK_INDEX};

    fn room() -> GameRoom {
        GameRoom::new(
            "test",
            vec![
                RoomPlayer::new("user_a", "Алиса"),
                RoomPlayer::new("user_b", "Боб"),
            ],
        )
    }

    #[test]
    fn test_take_credit_rejects_bad_amounts() {
        let service = CreditService::new();
        let mut room = room();

        for amount in [0, -1000, 500, 999, 1500, 2001] {
            assert!(
                matches!(
                    service.take_credit(&mut room, 0, amount),
                    Err(CreditError::InvalidAmount { .. })
                ),
                "{amount} should be rejected"
            );
        }
        // Ничего не инициализировано и не записано
        assert!(room.game_data.credit_data.is_none());
        assert!(room.game_data.transfers_history.is_empty());
    }

    #[test]
    fn test_take_credit_first_draw() {
        let service = CreditService::new();
        let mut room = room();

        let taken = service.take_credit(&mut room, 0, 3000).unwrap();
        assert_eq!(taken.new_credit_amount, 3000);
        assert_eq!(taken.total_credit, 3000);
        assert_eq!(taken.new_monthly_payment, 300);
        assert_eq!(taken.total_monthly_payment, 300);
        assert_eq!(taken.new_balance, 3000);

        // Все четыре коллекции обновлены согласованно
        assert_eq!(room.outstanding_credit(0), 3000);
        assert_eq!(room.balance(0), 3000);

        let credit_data = room.game_data.credit_data.as_ref().unwrap();
        assert_eq!(credit_data.credit_history.len(), 1);
        let entry = &credit_data.credit_history[0];
        assert_eq!(entry.kind, CreditEntryKind::Take);
        assert_eq!(entry.monthly_payment, Some(300));
        assert_eq!(entry.total_credit, Some(3000));
        assert_eq!(entry.description, "Взят кредит на $3,000 (общий: $3,000)");

        let transfer = &room.game_data.transfers_history[0];
        assert_eq!(transfer.kind, TransferKind::Credit);
        assert_eq!(transfer.sender_index, BANK_INDEX);
        assert_eq!(transfer.recipient_index, 0);
        assert_eq!(transfer.amount, 3000);
        assert_eq!(transfer.description, "Кредит на $3,000");
    }

    #[test]
    fn test_take_credit_top_up_uses_combined_total() {
        let service = CreditService::new();
        let mut room = room();

        service.take_credit(&mut room, 0, 3000).unwrap();
        let taken = service.take_credit(&mut room, 0, 2000).unwrap();

        assert_eq!(taken.total_credit, 5000);
        // Платеж этой выдачи — отдельно, платеж всего долга — от общей суммы
        assert_eq!(taken.new_monthly_payment, 200);
        assert_eq!(taken.total_monthly_payment, 500);
        assert_eq!(taken.new_balance, 5000);
    }

    #[test]
    fn test_take_credit_enforces_cap_with_headroom() {
        let service = CreditService::new();
        let mut room = room();
        service.take_credit(&mut room, 0, 5000).unwrap();

        let before = room.clone();
        let err = service.take_credit(&mut room, 0, 6000).unwrap_err();
        assert!(matches!(err, CreditError::LimitExceeded { available: 5000 }));

        // Отказ не оставляет следов
        assert_eq!(room, before);
    }

    #[test]
    fn test_take_credit_unknown_player() {
        let service = CreditService::new();
        let mut room = room();
        assert!(matches!(
            service.take_credit(&mut room, 9, 1000),
            Err(CreditError::UnknownPlayer { index: 9 })
        ));
    }

    #[test]
    fn test_credit_is_per_player() {
        let service = CreditService::new();
        let mut room = room();

        service.take_credit(&mut room, 0, 10_000).unwrap();
        // Лимит соседа не задет
        let taken = service.take_credit(&mut room, 1, 1000).unwrap();
        assert_eq!(taken.total_credit, 1000);
        assert_eq!(room.outstanding_credit(0), 10_000);
        assert_eq!(room.outstanding_credit(1), 1000);
    }

    #[test]
    fn test_payoff_requires_credit_data() {
        let service = CreditService::new();
        let mut room = room();
        assert!(matches!(
            service.payoff_credit(&mut room, 0, None),
            Err(CreditError::NoCreditData)
        ));
    }

    #[test]
    fn test_payoff_requires_active_credit() {
        let service = CreditService::new();
        let mut room = room();
        service.take_credit(&mut room, 0, 1000).unwrap();

        // У второго игрока долга нет
        assert!(matches!(
            service.payoff_credit(&mut room, 1, None),
            Err(CreditError::NoActiveCredit)
        ));
    }

    #[test]
    fn test_payoff_validation_order() {
        let service = CreditService::new();
        let mut room = room();
        service.take_credit(&mut room, 0, 3000).unwrap();

        assert!(matches!(
            service.payoff_credit(&mut room, 0, Some(0)),
            Err(CreditError::InvalidPayoffAmount)
        ));
        assert!(matches!(
            service.payoff_credit(&mut room, 0, Some(-100)),
            Err(CreditError::InvalidPayoffAmount)
        ));
        assert!(matches!(
            service.payoff_credit(&mut room, 0, Some(4000)),
            Err(CreditError::Overpayment)
        ));

        // Баланс потрачен — гасить нечем
        crate::game::bank::withdraw(&mut room, 0, 2500, None).unwrap();
        assert!(matches!(
            service.payoff_credit(&mut room, 0, Some(1000)),
            Err(CreditError::InsufficientFunds)
        ));

        assert_eq!(room.outstanding_credit(0), 3000);
    }

    #[test]
    fn test_full_payoff_clears_credit() {
        let service = CreditService::new();
        let mut room = room();
        service.take_credit(&mut room, 0, 5000).unwrap();

        let paid = service.payoff_credit(&mut room, 0, None).unwrap();
        assert_eq!(paid.paid_amount, 5000);
        assert_eq!(paid.remaining_credit, 0);
        assert_eq!(paid.new_balance, 0);

        let credit_data = room.game_data.credit_data.as_ref().unwrap();
        let entry = credit_data.credit_history.last().unwrap();
        assert_eq!(entry.kind, CreditEntryKind::Payoff);
        assert_eq!(entry.amount, 5000);
        assert_eq!(entry.monthly_payment, None);

        let transfer = room.game_data.transfers_history.last().unwrap();
        assert_eq!(transfer.kind, TransferKind::CreditPayoff);
        assert_eq!(transfer.sender_index, 0);
        assert_eq!(transfer.recipient_index, BANK_INDEX);
    }

    #[test]
    fn test_partial_payoff_keeps_remainder() {
        let service = CreditService::new();
        let mut room = room();
        service.take_credit(&mut room, 0, 5000).unwrap();

        let paid = service.payoff_credit(&mut room, 0, Some(2000)).unwrap();
        assert_eq!(paid.paid_amount, 2000);
        assert_eq!(paid.remaining_credit, 3000);
        assert_eq!(paid.new_balance, 3000);

        let status = service.player_credit(&room, 0);
        assert_eq!(status.current_credit, 3000);
        assert_eq!(status.monthly_payment, 300);
    }

    #[test]
    fn test_player_credit_defaults_without_data() {
        let service = CreditService::new();
        let room = room();

        let status = service.player_credit(&room, 0);
        assert_eq!(status.current_credit, 0);
        assert_eq!(status.monthly_payment, 0);
        assert_eq!(status.max_credit, 10_000);
        assert_eq!(status.available_credit, 10_000);
        assert!(status.can_take_credit);

        // Чтение ничего не инициализирует
        assert!(room.game_data.credit_data.is_none());
    }

    #[test]
    fn test_player_credit_tracks_headroom() {
        let service = CreditService::new();
        let mut room = room();
        service.take_credit(&mut room, 0, 10_000).unwrap();

        let status = service.player_credit(&room, 0);
        assert_eq!(status.current_credit, 10_000);
        assert_eq!(status.monthly_payment, 1000);
        assert_eq!(status.available_credit, 0);
        assert!(!status.can_take_credit);
    }

    #[test]
    fn test_custom_policy() {
        let service = CreditService::with_policy(CreditPolicy {
            step: 500,
            min_amount: 500,
            max_credit: 2000,
            payment_rate: 50,
        });
        let mut room = room();

        let taken = service.take_credit(&mut room, 0, 1500).unwrap();
        assert_eq!(taken.new_monthly_payment, 150);
        assert!(matches!(
            service.take_credit(&mut room, 0, 1000),
            Err(CreditError::LimitExceeded { available: 500 })
        ));
    }
}
