// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod deposit;
pub mod delivery;
pub mod goal;
pub mod ticket;
pub mod timeclock;
pub mod tuning;
pub mod user;
pub mod vest;
pub mod weapon;

pub use delivery::{DeliveryStatus, ProductDelivery, ProductLine};
pub use deposit::{CashDeposit, DepositStatus};
pub use goal::{Goal, GoalEvent, GoalPeriod};
pub use ticket::{CashTicket, TicketStatus};
pub use timeclock::{TimeClockEntry, WeeklySummary};
pub use tuning::TuningJob;
pub use user::{Role, Session, User};
pub use vest::{VestRequest, VestStatus};
pub use weapon::{
    LossReason, RequestKind, RequestStatus, WeaponIssuance, WeaponRequest, WeaponStatus,
    WeaponType,
};

/// Require a non-blank free-text field, returning it trimmed.
pub(crate) fn non_blank(value: &str, what: &str) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::Validation(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(trimmed.to_string())
}
