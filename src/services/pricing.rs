// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tuning price calculator.
//!
//! Each vehicle category has a flat price table. A full tuning package
//! replaces the a-la-carte performance services (motor, brakes,
//! transmission, turbo); suspension and cosmetic pieces always add on top.
//! Discounts are applied last.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

string_enum! {
    VehicleCategory, "vehicle category" {
        Compacts => "compacts",
        Sedans => "sedans",
        Suvs => "suvs",
        Coupes => "coupes",
        Muscle => "muscle",
        SportsClassics => "sportsclassics",
        Sports => "sports",
        Super => "super",
        Motorcycles => "motorcycles",
        Offroad => "offroad",
    }
}

string_enum! {
    /// Why a discount is granted.
    DiscountKind, "discount kind" {
        Convenio => "convenio",
        Empleado => "empleado",
        Promocion => "promocion",
    }
}

/// Prices for one vehicle category, in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTable {
    pub motor: u64,
    pub frenos: u64,
    pub transmision: u64,
    pub turbo: u64,
    pub suspension: u64,
    pub full_tuning: u64,
    /// Per cosmetic piece
    pub estetica: u64,
}

const fn table(
    motor: u64,
    frenos: u64,
    transmision: u64,
    turbo: u64,
    suspension: u64,
    full_tuning: u64,
    estetica: u64,
) -> PriceTable {
    PriceTable {
        motor,
        frenos,
        transmision,
        turbo,
        suspension,
        full_tuning,
        estetica,
    }
}

impl VehicleCategory {
    pub fn prices(&self) -> PriceTable {
        match self {
            VehicleCategory::Compacts => table(900, 900, 900, 1200, 600, 4500, 200),
            VehicleCategory::Sedans => table(1100, 1100, 1100, 1400, 700, 5500, 250),
            VehicleCategory::Suvs => table(1300, 1300, 1300, 1600, 800, 6500, 300),
            VehicleCategory::Coupes => table(1500, 1500, 1500, 1900, 900, 7500, 300),
            VehicleCategory::Muscle => table(1800, 1800, 1800, 2200, 1000, 8500, 350),
            VehicleCategory::SportsClassics => table(2500, 2500, 2500, 3000, 1200, 11000, 400),
            VehicleCategory::Sports => table(3200, 3200, 3200, 4000, 1550, 14000, 500),
            VehicleCategory::Super => table(4500, 4500, 4500, 5500, 2000, 20000, 750),
            VehicleCategory::Motorcycles => table(700, 700, 700, 900, 400, 3500, 150),
            VehicleCategory::Offroad => table(1200, 1200, 1200, 1500, 900, 6000, 300),
        }
    }
}

/// Which services were selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceSelection {
    pub motor: bool,
    pub frenos: bool,
    pub transmision: bool,
    pub turbo: bool,
    pub suspension: bool,
    pub full_tuning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base: u64,
    pub descuento: u64,
    pub total: u64,
}

/// Compute the price of a tuning job.
///
/// `discount_percent` only applies when a `discount` kind is given.
pub fn calculate_price(
    category: VehicleCategory,
    services: &ServiceSelection,
    cosmetic_units: u32,
    discount: Option<DiscountKind>,
    discount_percent: Option<u32>,
) -> Result<PriceBreakdown> {
    let prices = category.prices();

    let performance = if services.full_tuning {
        prices.full_tuning
    } else {
        [
            (services.motor, prices.motor),
            (services.frenos, prices.frenos),
            (services.transmision, prices.transmision),
            (services.turbo, prices.turbo),
        ]
        .iter()
        .filter(|(selected, _)| *selected)
        .map(|(_, price)| price)
        .sum()
    };

    let suspension = if services.suspension {
        prices.suspension
    } else {
        0
    };
    let cosmetics = prices.estetica * u64::from(cosmetic_units);
    let base = performance + suspension + cosmetics;

    let descuento = match (discount, discount_percent) {
        (Some(_), Some(pct)) if pct > 100 => {
            return Err(AppError::Validation(format!(
                "Discount percentage must be between 0 and 100, got {}",
                pct
            )))
        }
        // Round half up
        (Some(_), Some(pct)) => (base * u64::from(pct) + 50) / 100,
        _ => 0,
    };

    Ok(PriceBreakdown {
        base,
        descuento,
        total: base - descuento,
    })
}
