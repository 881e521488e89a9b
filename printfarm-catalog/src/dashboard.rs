use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::model::{Packaging, Printer, Product, Settings};
use crate::pricing::compute_costs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    pub id: Uuid,
    pub name: String,
    pub wb_net_profit: Decimal,
    pub ozon_net_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_active_models: usize,
    pub average_margin: Decimal,
    pub most_profitable_model: Option<ProfitSummary>,
    pub least_profitable_model: Option<ProfitSummary>,
}

/// Summary over active (non-archived) products, ranked by WB net profit.
/// Each product is priced against its own printer and packaging; ties keep the
/// earlier product.
pub fn dashboard_stats(
    products: &[Product],
    packaging: &[Packaging],
    printers: &[Printer],
    settings: &Settings,
) -> DashboardStats {
    let packaging_by_id: HashMap<Uuid, &Packaging> = packaging.iter().map(|p| (p.id, p)).collect();
    let printers_by_id: HashMap<Uuid, &Printer> = printers.iter().map(|p| (p.id, p)).collect();

    let summaries: Vec<ProfitSummary> = products
        .iter()
        .filter(|p| !p.is_archived)
        .map(|product| {
            let details = &product.details;
            let costs = compute_costs(
                details,
                details.packaging_id.and_then(|id| packaging_by_id.get(&id).copied()),
                details.printer_id.and_then(|id| printers_by_id.get(&id).copied()),
                settings,
            );
            ProfitSummary {
                id: product.id,
                name: details.name.clone(),
                wb_net_profit: costs.wb_net_profit,
                ozon_net_profit: costs.ozon_net_profit,
            }
        })
        .collect();

    if summaries.is_empty() {
        return DashboardStats {
            total_active_models: 0,
            average_margin: Decimal::ZERO,
            most_profitable_model: None,
            least_profitable_model: None,
        };
    }

    let count = Decimal::from(summaries.len());
    let average_margin = match summaries
        .iter()
        .try_fold(Decimal::ZERO, |total, s| total.checked_add(s.wb_net_profit))
    {
        Some(total) => total / count,
        // Margins near Decimal::MAX: average the shares instead.
        None => summaries
            .iter()
            .fold(Decimal::ZERO, |total, s| total.saturating_add(s.wb_net_profit / count)),
    };

    let mut most = &summaries[0];
    let mut least = &summaries[0];
    for summary in &summaries[1..] {
        if summary.wb_net_profit > most.wb_net_profit {
            most = summary;
        }
        if summary.wb_net_profit < least.wb_net_profit {
            least = summary;
        }
    }

    DashboardStats {
        total_active_models: summaries.len(),
        average_margin,
        most_profitable_model: Some(most.clone()),
        least_profitable_model: Some(least.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductDetails;

    fn product(name: &str, margin: i64, archived: bool) -> Product {
        let mut product = Product::new(
            format!("PM-{:0>6}", margin),
            ProductDetails {
                name: name.to_string(),
                desired_margin: Decimal::from(margin),
                ..ProductDetails::default()
            },
        );
        product.is_archived = archived;
        product
    }

    #[test]
    fn test_empty_catalog() {
        let stats = dashboard_stats(&[], &[], &[], &Settings::default());
        assert_eq!(stats.total_active_models, 0);
        assert_eq!(stats.average_margin, Decimal::ZERO);
        assert!(stats.most_profitable_model.is_none());
        assert!(stats.least_profitable_model.is_none());
    }

    #[test]
    fn test_ranks_active_products_by_margin() {
        let products = vec![
            product("Vase", 100, false),
            product("Lamp", 300, false),
            product("Hook", 50, false),
            product("Archived giant", 10_000, true),
        ];
        let stats = dashboard_stats(&products, &[], &[], &Settings::default());

        assert_eq!(stats.total_active_models, 3);
        assert_eq!(stats.average_margin, Decimal::from(150));
        assert_eq!(stats.most_profitable_model.unwrap().name, "Lamp");
        assert_eq!(stats.least_profitable_model.unwrap().name, "Hook");
    }

    #[test]
    fn test_ties_keep_first_product() {
        let products = vec![product("First", 100, false), product("Second", 100, false)];
        let stats = dashboard_stats(&products, &[], &[], &Settings::default());

        assert_eq!(stats.most_profitable_model.unwrap().name, "First");
        assert_eq!(stats.least_profitable_model.unwrap().name, "First");
    }

    #[test]
    fn test_average_survives_margins_near_decimal_max() {
        let huge = Decimal::MAX / Decimal::TWO + Decimal::ONE;
        let mut first = product("Big", 0, false);
        first.details.desired_margin = huge;
        let mut second = product("Bigger", 0, false);
        second.details.desired_margin = huge + Decimal::ONE;
        assert!(first.details.validate().is_ok());

        let stats = dashboard_stats(&[first, second], &[], &[], &Settings::default());

        assert_eq!(stats.total_active_models, 2);
        assert!(stats.average_margin > huge - Decimal::ONE);
        assert_eq!(stats.most_profitable_model.unwrap().name, "Bigger");
        assert_eq!(stats.least_profitable_model.unwrap().name, "Big");
    }
}
