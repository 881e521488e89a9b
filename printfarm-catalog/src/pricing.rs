//! Cost and price calculation for a single product.
//!
//! The engine is a fixed sequence of formulas over immutable inputs. Nothing is
//! cached or persisted: callers recompute on every read with whatever printer,
//! packaging and settings snapshot they currently hold.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::model::{Marketplace, Packaging, Printer, ProductDetails, Settings};

/// Weight surcharge for multi-material prints (purge waste), 15%.
fn multicolor_factor() -> Decimal {
    Decimal::new(115, 2)
}

fn percent(value: Decimal) -> Decimal {
    value / Decimal::ONE_HUNDRED
}

/// Retail price suggestion for one marketplace.
///
/// A commission of exactly 100% leaves nothing to divide by, and a commission
/// just below it can push the price past what a `Decimal` holds. Both cases are
/// reported as `NonFinite` rather than panicking. Commissions above 100%
/// produce a finite negative price which is passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendedPrice {
    Finite(Decimal),
    NonFinite,
}

impl RecommendedPrice {
    pub fn is_finite(&self) -> bool {
        matches!(self, RecommendedPrice::Finite(_))
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            RecommendedPrice::Finite(price) => Some(*price),
            RecommendedPrice::NonFinite => None,
        }
    }

    /// Finite and not negative, i.e. safe to show as a price.
    pub fn is_displayable(&self) -> bool {
        self.as_decimal().is_some_and(|p| !p.is_sign_negative() || p.is_zero())
    }
}

// Non-finite prices go out as JSON `null`.
impl Serialize for RecommendedPrice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RecommendedPrice::Finite(price) => serializer.serialize_some(price),
            RecommendedPrice::NonFinite => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PricingIssue {
    #[error("{channel} commission leaves no finite recommended price")]
    NonFinitePrice { channel: Marketplace },

    #[error("{channel} commission of 100% or more makes the recommended price negative")]
    NegativePrice { channel: Marketplace },
}

/// Derived costs and prices for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub final_weight: Decimal,
    pub material_cost: Decimal,
    pub electricity_cost: Decimal,
    pub defect_surcharge: Decimal,
    pub production_cost: Decimal,
    pub full_cost: Decimal,
    pub wb_recommended_price: RecommendedPrice,
    pub wb_net_profit: Decimal,
    pub ozon_recommended_price: RecommendedPrice,
    pub ozon_net_profit: Decimal,
}

impl CostBreakdown {
    pub fn recommended_price(&self, marketplace: Marketplace) -> RecommendedPrice {
        match marketplace {
            Marketplace::Wildberries => self.wb_recommended_price,
            Marketplace::Ozon => self.ozon_recommended_price,
        }
    }

    /// Prices a presentation layer must not show, one entry per channel.
    pub fn pricing_issues(&self) -> Vec<PricingIssue> {
        Marketplace::ALL
            .into_iter()
            .filter_map(|channel| match self.recommended_price(channel) {
                RecommendedPrice::NonFinite => Some(PricingIssue::NonFinitePrice { channel }),
                price if !price.is_displayable() => Some(PricingIssue::NegativePrice { channel }),
                _ => None,
            })
            .collect()
    }
}

/// Price that nets `full_cost + logistics + margin` after the marketplace takes
/// its commission.
fn recommended_price(
    full_cost: Decimal,
    logistics: Decimal,
    margin: Decimal,
    commission_percent: Decimal,
) -> RecommendedPrice {
    let target = full_cost.saturating_add(logistics).saturating_add(margin);
    let divisor = Decimal::ONE - percent(commission_percent);
    target
        .checked_div(divisor)
        .map_or(RecommendedPrice::NonFinite, RecommendedPrice::Finite)
}

/// Computes the full cost breakdown for a product.
///
/// A missing printer contributes no electricity cost and a missing packaging
/// contributes no packaging cost; neither is an error. Intermediate sums
/// saturate at the `Decimal` range instead of overflowing.
pub fn compute_costs(
    product: &ProductDetails,
    packaging: Option<&Packaging>,
    printer: Option<&Printer>,
    settings: &Settings,
) -> CostBreakdown {
    let final_weight = if product.is_multicolor {
        product.weight_grams.saturating_mul(multicolor_factor())
    } else {
        product.weight_grams
    };

    // Consumables scale the material only, not the electricity.
    let material_cost = (final_weight / Decimal::ONE_THOUSAND)
        .saturating_mul(product.plastic_price_per_kg)
        .saturating_mul(Decimal::ONE + percent(product.consumables_percent));

    let power_kw = printer.map_or(Decimal::ZERO, |p| p.power_consumption_kw);
    let electricity_cost = product
        .print_hours
        .saturating_mul(power_kw)
        .saturating_mul(settings.electricity_cost_per_kwh);

    let defect_surcharge = material_cost
        .saturating_add(electricity_cost)
        .saturating_mul(percent(product.defect_percent));

    let production_cost = material_cost
        .saturating_add(electricity_cost)
        .saturating_add(defect_surcharge);

    let packaging_cost = packaging.map_or(Decimal::ZERO, |p| p.cost);
    let full_cost = production_cost
        .saturating_add(packaging_cost)
        .saturating_add(settings.bubble_wrap_cost);

    let margin = product.desired_margin;

    CostBreakdown {
        final_weight,
        material_cost,
        electricity_cost,
        defect_surcharge,
        production_cost,
        full_cost,
        wb_recommended_price: recommended_price(
            full_cost,
            product.wb.logistics_cost,
            margin,
            product.wb.commission_percent,
        ),
        wb_net_profit: margin,
        ozon_recommended_price: recommended_price(
            full_cost,
            product.ozon.logistics_cost,
            margin,
            product.ozon.commission_percent,
        ),
        ozon_net_profit: margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Listing, PackagingDraft, PrinterDraft};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn settings() -> Settings {
        Settings {
            electricity_cost_per_kwh: dec("6.5"),
            bubble_wrap_cost: dec("15"),
            ..Settings::default()
        }
    }

    fn printer() -> Printer {
        Printer::new(PrinterDraft {
            name: "Bambu P1S".to_string(),
            power_consumption_kw: dec("0.3"),
        })
    }

    fn packaging() -> Packaging {
        Packaging::new(PackagingDraft {
            name: "Box S".to_string(),
            cost: dec("20"),
            ..PackagingDraft::default()
        })
    }

    fn product() -> ProductDetails {
        ProductDetails {
            name: "Vase".to_string(),
            weight_grams: dec("100"),
            is_multicolor: false,
            print_hours: dec("2"),
            plastic_price_per_kg: dec("1000"),
            consumables_percent: dec("10"),
            defect_percent: dec("5"),
            wb: Listing {
                commission_percent: dec("15"),
                logistics_cost: dec("50"),
                ..Listing::default()
            },
            ozon: Listing {
                commission_percent: dec("12"),
                logistics_cost: dec("40"),
                ..Listing::default()
            },
            desired_margin: dec("100"),
            ..ProductDetails::default()
        }
    }

    #[test]
    fn test_reference_scenario() {
        let costs = compute_costs(&product(), Some(&packaging()), Some(&printer()), &settings());

        assert_eq!(costs.final_weight, dec("100"));
        assert_eq!(costs.material_cost, dec("110"));
        assert_eq!(costs.electricity_cost, dec("3.9"));
        assert_eq!(costs.defect_surcharge, dec("5.695"));
        assert_eq!(costs.production_cost, dec("119.595"));
        assert_eq!(costs.full_cost, dec("154.595"));

        let wb = costs.wb_recommended_price.as_decimal().unwrap();
        assert_eq!(wb.round_dp(7), dec("358.3470588"));
        assert_eq!(costs.wb_net_profit, dec("100"));
        assert!(costs.pricing_issues().is_empty());
    }

    #[test]
    fn test_missing_printer_means_zero_electricity() {
        let costs = compute_costs(&product(), Some(&packaging()), None, &settings());

        assert_eq!(costs.electricity_cost, Decimal::ZERO);
        assert_eq!(costs.defect_surcharge, dec("5.5"));
        assert_eq!(costs.production_cost, dec("115.5"));
        assert_eq!(costs.full_cost, dec("150.5"));
        let wb = costs.wb_recommended_price.as_decimal().unwrap();
        assert_eq!(wb.round_dp(10), (dec("300.5") / dec("0.85")).round_dp(10));
    }

    #[test]
    fn test_missing_packaging_still_charges_bubble_wrap() {
        let costs = compute_costs(&product(), None, Some(&printer()), &settings());
        assert_eq!(costs.full_cost, dec("134.595"));
    }

    #[test]
    fn test_multicolor_surcharge_is_exact() {
        let mut p = product();
        p.weight_grams = dec("333.33");
        let plain = compute_costs(&p, None, None, &settings());
        assert_eq!(plain.final_weight, dec("333.33"));

        p.is_multicolor = true;
        let multi = compute_costs(&p, None, None, &settings());
        assert_eq!(multi.final_weight, dec("333.33") * dec("1.15"));
        assert_eq!(multi.final_weight, dec("383.3295"));
    }

    #[test]
    fn test_material_cost_is_monotonic() {
        let base = compute_costs(&product(), None, None, &settings()).material_cost;

        let bumps: [fn(&mut ProductDetails); 3] = [
            |p| p.weight_grams += dec("1"),
            |p| p.plastic_price_per_kg += dec("0.01"),
            |p| p.consumables_percent += dec("0.5"),
        ];
        for bump in bumps {
            let mut p = product();
            bump(&mut p);
            let bumped = compute_costs(&p, None, None, &settings()).material_cost;
            assert!(bumped >= base, "{bumped} < {base}");
        }
    }

    #[test]
    fn test_consumables_do_not_touch_electricity() {
        let mut p = product();
        p.consumables_percent = dec("50");
        let costs = compute_costs(&p, None, Some(&printer()), &settings());
        assert_eq!(costs.electricity_cost, dec("3.9"));
    }

    #[test]
    fn test_net_profit_equals_margin() {
        for margin in ["0", "0.01", "99.99", "123456.789"] {
            let mut p = product();
            p.desired_margin = dec(margin);
            let costs = compute_costs(&p, Some(&packaging()), Some(&printer()), &settings());
            assert_eq!(costs.wb_net_profit, dec(margin));
            assert_eq!(costs.ozon_net_profit, dec(margin));
        }
    }

    #[test]
    fn test_equal_terms_give_equal_prices() {
        let mut p = product();
        p.ozon.commission_percent = p.wb.commission_percent;
        p.ozon.logistics_cost = p.wb.logistics_cost;
        let costs = compute_costs(&p, Some(&packaging()), Some(&printer()), &settings());
        assert_eq!(costs.wb_recommended_price, costs.ozon_recommended_price);
    }

    #[test]
    fn test_price_grows_without_bound_near_full_commission() {
        let mut last = Decimal::ZERO;
        for commission in ["90", "99", "99.9", "99.999", "99.99999"] {
            let mut p = product();
            p.wb.commission_percent = dec(commission);
            let price = compute_costs(&p, None, None, &settings())
                .wb_recommended_price
                .as_decimal()
                .unwrap();
            assert!(price > last);
            last = price;
        }
        assert!(last > dec("10000000"));
    }

    #[test]
    fn test_full_commission_is_non_finite_not_a_panic() {
        let mut p = product();
        p.wb.commission_percent = dec("100");
        let costs = compute_costs(&p, None, None, &settings());

        assert_eq!(costs.wb_recommended_price, RecommendedPrice::NonFinite);
        assert!(!costs.wb_recommended_price.is_finite());
        assert!(costs.ozon_recommended_price.is_finite());
        assert_eq!(
            costs.pricing_issues(),
            vec![PricingIssue::NonFinitePrice { channel: Marketplace::Wildberries }]
        );
    }

    #[test]
    fn test_commission_above_hundred_goes_negative() {
        let mut p = product();
        p.ozon.commission_percent = dec("120");
        let costs = compute_costs(&p, None, None, &settings());

        let price = costs.ozon_recommended_price.as_decimal().unwrap();
        assert!(price.is_sign_negative());
        assert_eq!(
            costs.pricing_issues(),
            vec![PricingIssue::NegativePrice { channel: Marketplace::Ozon }]
        );
    }

    #[test]
    fn test_negative_inputs_are_not_validated() {
        let mut p = product();
        p.weight_grams = dec("-100");
        let costs = compute_costs(&p, None, None, &settings());
        assert_eq!(costs.material_cost, dec("-110"));
    }

    #[test]
    fn test_same_inputs_same_output() {
        let a = compute_costs(&product(), Some(&packaging()), Some(&printer()), &settings());
        let b = compute_costs(&product(), Some(&packaging()), Some(&printer()), &settings());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_non_finite_serializes_as_null() {
        let mut p = product();
        p.wb.commission_percent = dec("100");
        let json = serde_json::to_value(compute_costs(&p, None, None, &settings())).unwrap();
        assert!(json["wbRecommendedPrice"].is_null());
        assert!(json["ozonRecommendedPrice"].is_string());
    }
}
