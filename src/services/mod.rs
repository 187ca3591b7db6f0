// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod chat;
pub mod deliveries;
pub mod deposits;
pub mod goals;
pub mod guard;
pub mod password;
pub mod pricing;
pub mod retell;
pub mod tickets;
pub mod timeclock;
pub mod tuning;
pub mod users;
pub mod vests;
pub mod weapons;

pub use chat::ChatRelay;
pub use deliveries::DeliveryService;
pub use deposits::DepositService;
pub use goals::GoalService;
pub use guard::Capabilities;
pub use retell::RetellClient;
pub use tickets::TicketService;
pub use timeclock::TimeClockService;
pub use tuning::TuningService;
pub use users::UserService;
pub use vests::VestService;
pub use weapons::WeaponService;
