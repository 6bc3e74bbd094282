//! Balance ledger
//!
//! The running balance lives on `users.balance`. Every write goes through
//! [`commit`] and is rounded to cents, and every reservation reads the
//! balance under a row lock inside the caller's transaction. [`UserLocks`]
//! serializes executions of the same user inside this process as well, so
//! backends without row locks (SQLite) get the same guarantee.

use parking_lot::Mutex;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QuerySelect, Set};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::entities::{prelude::Users, users};

/// Allowance every new user starts with
pub const BASE_USER_BALANCE: f64 = 5.0;

/// Decimal places balances are persisted with
pub const BALANCE_PRECISION: i32 = 2;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    // Magnitudes this large have no fractional digits left to round
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

pub fn round_balance(value: f64) -> f64 {
    round_to(value, BALANCE_PRECISION)
}

/// Outcome of checking a debit against a user's balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reservation {
    pub user_id: i32,
    pub prior_balance: f64,
    pub cost: f64,
    /// Already rounded to cents
    pub new_balance: f64,
}

impl Reservation {
    pub fn new(user_id: i32, prior_balance: f64, cost: f64) -> Self {
        Self {
            user_id,
            prior_balance,
            cost,
            new_balance: round_balance(prior_balance - cost),
        }
    }

    pub fn is_affordable(&self) -> bool {
        self.new_balance >= 0.0
    }
}

pub async fn current_balance<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<f64, DbErr> {
    Users::find_by_id(user_id)
        .one(db)
        .await?
        .map(|user| user.balance)
        .ok_or_else(|| DbErr::RecordNotFound(format!("User {} not found", user_id)))
}

/// Read the balance with the user row locked and compute the debit.
///
/// Must run inside a transaction; the lock is held until it ends.
pub async fn reserve<C: ConnectionTrait>(
    txn: &C,
    user_id: i32,
    cost: f64,
) -> Result<Reservation, DbErr> {
    let user = Users::find_by_id(user_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("User {} not found", user_id)))?;

    Ok(Reservation::new(user_id, user.balance, cost))
}

/// Persist the reserved balance. Callers check `is_affordable` first.
pub async fn commit<C: ConnectionTrait>(txn: &C, reservation: &Reservation) -> Result<(), DbErr> {
    debug_assert!(reservation.is_affordable());

    users::ActiveModel {
        id: Set(reservation.user_id),
        balance: Set(round_balance(reservation.new_balance)),
        ..Default::default()
    }
    .update(txn)
    .await?;

    tracing::debug!(
        user_id = reservation.user_id,
        prior_balance = reservation.prior_balance,
        new_balance = reservation.new_balance,
        "Balance debited"
    );
    Ok(())
}

/// One async mutex per user id
#[derive(Clone, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<HashMap<i32, Arc<tokio::sync::Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s balance
    pub async fn lock(&self, user_id: i32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            // An entry only the map references is neither held nor awaited
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}
