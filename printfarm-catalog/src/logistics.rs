//! Wildberries logistics estimate.
//!
//! Produces the per-unit delivery figure the operator copies into a product's
//! `wb.logisticsCost`. Tariffs are the published base rates; warehouse grades
//! scale them relative to Kolomna.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    /// Billed by volume: flat up to 5 litres, then per started litre.
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Warehouse {
    Kolomna,
    Kazan,
    Ekb,
    Spb,
    Krasnodar,
    #[serde(other)]
    Other,
}

impl Warehouse {
    /// Percent adjustment against the base tariff.
    fn grade_percent(self) -> Decimal {
        match self {
            Warehouse::Kolomna | Warehouse::Other => Decimal::ZERO,
            Warehouse::Kazan => Decimal::from(-30),
            Warehouse::Ekb => Decimal::from(-20),
            Warehouse::Spb => Decimal::from(10),
            Warehouse::Krasnodar => Decimal::from(-25),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LogisticsError {
    #[error("purchase percent must be in (0, 100], got {0}")]
    PurchasePercentOutOfRange(Decimal),

    #[error("{field} must be in [0, 100], got {value}")]
    PercentOutOfRange { field: &'static str, value: Decimal },

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("{0} is too large to estimate")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogisticsInput {
    pub size_class: SizeClass,
    pub volume_liters: Decimal,
    pub warehouse: Warehouse,
    /// Share of orders the buyer keeps, percent.
    pub purchase_percent: Decimal,
    pub is_fbs: bool,
    /// Storage tariff as a percent of the base rate.
    pub storage_coef: Decimal,
    pub retail_price: Decimal,
    pub discount_percent: Decimal,
    pub spp_percent: Decimal,
}

impl Default for LogisticsInput {
    fn default() -> Self {
        Self {
            size_class: SizeClass::Medium,
            volume_liters: Decimal::from(3),
            warehouse: Warehouse::Kolomna,
            purchase_percent: Decimal::from(70),
            is_fbs: false,
            storage_coef: Decimal::ONE_HUNDRED,
            retail_price: Decimal::ONE_THOUSAND,
            discount_percent: Decimal::from(30),
            spp_percent: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsEstimate {
    pub base_logistics: Decimal,
    pub logistics_with_grade: Decimal,
    /// Return shipping spread over the units that are bought out.
    pub expected_returns: Decimal,
    pub fbs_processing: Decimal,
    pub total_logistics: Decimal,
    pub daily_storage: Decimal,
    pub monthly_storage: Decimal,
    pub price_after_discount: Decimal,
    pub price_after_spp: Decimal,
}

const RETURN_COST: i64 = 33;
const FREE_VOLUME_LITERS: i64 = 5;

fn base_tariff(size_class: SizeClass, volume_liters: Decimal) -> Option<Decimal> {
    match size_class {
        SizeClass::Small => Some(Decimal::from(30)),
        SizeClass::Medium => Some(Decimal::from(55)),
        SizeClass::Large => Some(Decimal::from(80)),
        SizeClass::Volume => extra_liters(volume_liters)
            .ceil()
            .checked_mul(Decimal::from(5))?
            .checked_add(Decimal::from(50)),
    }
}

/// Litres above the flat allowance; `volume_liters` is already known non-negative.
fn extra_liters(volume_liters: Decimal) -> Decimal {
    (volume_liters - Decimal::from(FREE_VOLUME_LITERS)).max(Decimal::ZERO)
}

/// `percent` is in [0, 100], so the result never exceeds `price`.
fn after_percent_off(price: Decimal, percent: Decimal) -> Option<Decimal> {
    price.checked_mul(Decimal::ONE - percent / Decimal::ONE_HUNDRED)
}

fn non_negative(value: Decimal, field: &'static str) -> Result<(), LogisticsError> {
    if value < Decimal::ZERO {
        return Err(LogisticsError::Negative(field));
    }
    Ok(())
}

fn percent_in_range(value: Decimal, field: &'static str) -> Result<(), LogisticsError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(LogisticsError::PercentOutOfRange { field, value });
    }
    Ok(())
}

pub fn estimate_logistics(input: &LogisticsInput) -> Result<LogisticsEstimate, LogisticsError> {
    if input.purchase_percent <= Decimal::ZERO || input.purchase_percent > Decimal::ONE_HUNDRED {
        return Err(LogisticsError::PurchasePercentOutOfRange(input.purchase_percent));
    }
    // Tiny percentages round to a zero share.
    let buyout = input.purchase_percent / Decimal::ONE_HUNDRED;
    if buyout.is_zero() {
        return Err(LogisticsError::PurchasePercentOutOfRange(input.purchase_percent));
    }
    non_negative(input.volume_liters, "volumeLiters")?;
    non_negative(input.storage_coef, "storageCoef")?;
    non_negative(input.retail_price, "retailPrice")?;
    percent_in_range(input.discount_percent, "discountPercent")?;
    percent_in_range(input.spp_percent, "sppPercent")?;

    let base_logistics = base_tariff(input.size_class, input.volume_liters)
        .ok_or(LogisticsError::Overflow("volumeLiters"))?;
    let logistics_with_grade = base_logistics
        .checked_mul(Decimal::ONE + input.warehouse.grade_percent() / Decimal::ONE_HUNDRED)
        .ok_or(LogisticsError::Overflow("volumeLiters"))?;

    let expected_returns = Decimal::from(RETURN_COST) * (Decimal::ONE - buyout);

    let fbs_processing = if input.is_fbs {
        (Decimal::from(20) + logistics_with_grade * Decimal::new(1, 1)).max(Decimal::from(70))
    } else {
        Decimal::ZERO
    };

    let total_logistics = logistics_with_grade
        .checked_add(expected_returns)
        .and_then(|cost| cost.checked_div(buyout))
        .and_then(|cost| cost.checked_add(fbs_processing))
        .ok_or(LogisticsError::Overflow("totalLogistics"))?;

    let daily_storage = (Decimal::new(10, 2) + extra_liters(input.volume_liters) * Decimal::new(1, 2))
        .checked_mul(input.storage_coef)
        .map(|cost| cost / Decimal::ONE_HUNDRED)
        .ok_or(LogisticsError::Overflow("storageCoef"))?;
    let monthly_storage = daily_storage
        .checked_mul(Decimal::from(30))
        .ok_or(LogisticsError::Overflow("storageCoef"))?;

    let price_after_discount = after_percent_off(input.retail_price, input.discount_percent)
        .ok_or(LogisticsError::Overflow("retailPrice"))?;
    let price_after_spp = after_percent_off(price_after_discount, input.spp_percent)
        .ok_or(LogisticsError::Overflow("retailPrice"))?;

    Ok(LogisticsEstimate {
        base_logistics,
        logistics_with_grade,
        expected_returns,
        fbs_processing,
        total_logistics,
        daily_storage,
        monthly_storage,
        price_after_discount,
        price_after_spp,
    })
}
