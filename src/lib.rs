// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Clan-Ops: operations backend for a role-play clan economy
//!
//! This crate provides the HTTP API behind the clan's internal tool: weapon
//! and equipment issuance, product deliveries, cash tickets and sales goals,
//! deposits, time clocking and tuning quotes, plus a small calling/chat proxy.

#[macro_use]
mod macros;

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{
    ChatRelay, DeliveryService, DepositService, GoalService, RetellClient, TicketService,
    TimeClockService, TuningService, UserService, VestService, WeaponService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub users: UserService,
    pub weapons: WeaponService,
    pub vests: VestService,
    pub deliveries: DeliveryService,
    pub deposits: DepositService,
    pub goals: GoalService,
    pub tickets: TicketService,
    pub timeclock: TimeClockService,
    pub tuning: TuningService,
    pub retell: RetellClient,
    pub chat: ChatRelay,
}

impl AppState {
    /// Wire every service to one store handle.
    pub fn new(config: Config, store: Store) -> Self {
        let tz = config.civil_tz();
        let goals = GoalService::new(store.clone(), tz);

        Self {
            users: UserService::new(store.clone()),
            weapons: WeaponService::new(store.clone()),
            vests: VestService::new(store.clone()),
            deliveries: DeliveryService::new(store.clone()),
            deposits: DepositService::new(store.clone()),
            tickets: TicketService::new(store.clone(), goals.clone()),
            goals,
            timeclock: TimeClockService::new(store.clone(), tz),
            tuning: TuningService::new(store.clone()),
            retell: RetellClient::new(config.retell.clone()),
            chat: ChatRelay::new(config.chat_webhook_url.clone()),
            store,
            config,
        }
    }
}
