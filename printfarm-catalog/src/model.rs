use chrono::{DateTime, Utc};
use printfarm_shared::Secret;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

/// Marketplace channels a product is listed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Wildberries,
    Ozon,
}

impl Marketplace {
    pub const ALL: [Marketplace; 2] = [Marketplace::Wildberries, Marketplace::Ozon];
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marketplace::Wildberries => f.write_str("WB"),
            Marketplace::Ozon => f.write_str("Ozon"),
        }
    }
}

/// Rejections produced at the API boundary. The pricing engine itself never
/// validates its inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("{0} must be below 100%")]
    CommissionOutOfRange(&'static str),
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative(field));
    }
    Ok(())
}

fn commission(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    non_negative(field, value)?;
    if value >= Decimal::ONE_HUNDRED {
        return Err(ValidationError::CommissionOutOfRange(field));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dimensions {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
}

/// Per-marketplace commercial terms and generated listing copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Listing {
    /// Marketplace commission, percent of the retail price. Must stay below 100.
    pub commission_percent: Decimal,
    /// Flat per-unit delivery fee taken from the marketplace calculator.
    pub logistics_cost: Decimal,
    pub product_link: String,
    pub generated_title: String,
    pub generated_description: String,
}

/// Everything about a product that the operator edits. `Product` adds identity
/// and lifecycle fields on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductDetails {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub specifications: String,
    pub source_link: String,
    pub category_id: Option<Uuid>,

    pub weight_grams: Decimal,
    pub is_multicolor: bool,
    pub dimensions: Dimensions,
    pub print_hours: Decimal,
    pub printer_id: Option<Uuid>,
    pub plastic_price_per_kg: Decimal,
    pub consumables_percent: Decimal,
    pub defect_percent: Decimal,
    pub packaging_id: Option<Uuid>,

    pub wb: Listing,
    pub ozon: Listing,

    /// Flat profit the seller keeps per unit.
    pub desired_margin: Decimal,
}

impl ProductDetails {
    /// An empty product pre-filled with the operator's default percentages.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            consumables_percent: settings.default_consumables_percent,
            defect_percent: settings.default_defect_percent,
            wb: Listing {
                commission_percent: settings.default_wb_commission,
                ..Listing::default()
            },
            ozon: Listing {
                commission_percent: settings.default_ozon_commission,
                ..Listing::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        non_negative("weightGrams", self.weight_grams)?;
        non_negative("dimensions.length", self.dimensions.length)?;
        non_negative("dimensions.width", self.dimensions.width)?;
        non_negative("dimensions.height", self.dimensions.height)?;
        non_negative("printHours", self.print_hours)?;
        non_negative("plasticPricePerKg", self.plastic_price_per_kg)?;
        non_negative("consumablesPercent", self.consumables_percent)?;
        non_negative("defectPercent", self.defect_percent)?;
        commission("wb.commissionPercent", self.wb.commission_percent)?;
        non_negative("wb.logisticsCost", self.wb.logistics_cost)?;
        commission("ozon.commissionPercent", self.ozon.commission_percent)?;
        non_negative("ozon.logisticsCost", self.ozon.logistics_cost)?;
        non_negative("desiredMargin", self.desired_margin)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    /// Human-facing SKU, `PM-XXXXXX`.
    pub article: String,
    #[serde(flatten)]
    pub details: ProductDetails,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(article: String, details: ProductDetails) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            article,
            details,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy under a fresh identity. The archive flag is carried over.
    pub fn duplicate(&self, article: String) -> Self {
        let mut details = self.details.clone();
        details.name = format!("{} (copy)", self.details.name);
        Self {
            is_archived: self.is_archived,
            ..Self::new(article, details)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrinterDraft {
    pub name: String,
    pub power_consumption_kw: Decimal,
}

impl PrinterDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        non_negative("powerConsumptionKw", self.power_consumption_kw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Printer {
    pub id: Uuid,
    pub name: String,
    pub power_consumption_kw: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Printer {
    pub fn new(draft: PrinterDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            power_consumption_kw: draft.power_consumption_kw,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, draft: PrinterDraft) {
        self.name = draft.name;
        self.power_consumption_kw = draft.power_consumption_kw;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackagingDraft {
    pub name: String,
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub weight: Decimal,
    pub cost: Decimal,
    pub link: Option<String>,
}

impl PackagingDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        non_negative("length", self.length)?;
        non_negative("width", self.width)?;
        non_negative("height", self.height)?;
        non_negative("weight", self.weight)?;
        non_negative("cost", self.cost)
    }
}

/// A box or bag a product ships in. `cost` is charged once per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Packaging {
    pub id: Uuid,
    pub name: String,
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub weight: Decimal,
    pub cost: Decimal,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Packaging {
    pub fn new(draft: PackagingDraft) -> Self {
        let mut packaging = Self {
            id: Uuid::new_v4(),
            name: String::new(),
            length: Decimal::ZERO,
            width: Decimal::ZERO,
            height: Decimal::ZERO,
            weight: Decimal::ZERO,
            cost: Decimal::ZERO,
            link: None,
            created_at: Utc::now(),
        };
        packaging.apply(draft);
        packaging
    }

    pub fn apply(&mut self, draft: PackagingDraft) {
        self.name = draft.name;
        self.length = draft.length;
        self.width = draft.width;
        self.height = draft.height;
        self.weight = draft.weight;
        self.cost = draft.cost;
        self.link = draft.link.filter(|l| !l.trim().is_empty());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl CategoryDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(draft: CategoryDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            color: draft
                .color
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            created_at: Utc::now(),
        }
    }

    /// An omitted color keeps the current one.
    pub fn apply(&mut self, draft: CategoryDraft) {
        self.name = draft.name;
        self.description = draft.description;
        if let Some(color) = draft.color {
            self.color = color;
        }
    }
}

/// Global calculation constants and AI copywriting configuration. Exactly one
/// row exists; missing fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub electricity_cost_per_kwh: Decimal,
    /// Bubble wrap and tape, charged on every unit on top of the packaging.
    pub bubble_wrap_cost: Decimal,
    pub default_defect_percent: Decimal,
    pub default_consumables_percent: Decimal,
    pub default_wb_commission: Decimal,
    pub default_ozon_commission: Decimal,

    pub kie_api_key: Secret<String>,
    pub wb_title_prompt: String,
    pub wb_description_prompt: String,
    pub ozon_title_prompt: String,
    pub ozon_description_prompt: String,
    pub detailed_generation_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            electricity_cost_per_kwh: Decimal::new(65, 1),
            bubble_wrap_cost: Decimal::from(15),
            default_defect_percent: Decimal::from(5),
            default_consumables_percent: Decimal::from(10),
            default_wb_commission: Decimal::from(15),
            default_ozon_commission: Decimal::from(12),
            kie_api_key: Secret::default(),
            wb_title_prompt: "Write an SEO-friendly Wildberries product title, up to 100 characters, \
                packed with search keywords. Product: {name}, description: {description}, \
                specifications: {specifications}"
                .to_string(),
            wb_description_prompt: "Write a detailed Wildberries product description optimised for search. \
                Cover benefits, specifications and use cases. Product: {name}, description: \
                {description}, specifications: {specifications}"
                .to_string(),
            ozon_title_prompt: "Write an appealing Ozon product title, up to 250 characters, using \
                search keywords. Product: {name}, description: {description}, specifications: \
                {specifications}"
                .to_string(),
            ozon_description_prompt: "Write a structured Ozon product description with emoji, \
                specifications and benefits. Product: {name}, description: {description}, \
                specifications: {specifications}"
                .to_string(),
            detailed_generation_prompt: "Study the product photos and describe every visible detail: \
                materials, colours and distinctive features."
                .to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("electricityCostPerKwh", self.electricity_cost_per_kwh)?;
        non_negative("bubbleWrapCost", self.bubble_wrap_cost)?;
        non_negative("defaultDefectPercent", self.default_defect_percent)?;
        non_negative("defaultConsumablesPercent", self.default_consumables_percent)?;
        commission("defaultWbCommission", self.default_wb_commission)?;
        commission("defaultOzonCommission", self.default_ozon_commission)?;
        Ok(())
    }

    pub fn apply(&mut self, patch: SettingsPatch) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field { self.$field = value; })*
            };
        }
        merge!(
            electricity_cost_per_kwh,
            bubble_wrap_cost,
            default_defect_percent,
            default_consumables_percent,
            default_wb_commission,
            default_ozon_commission,
            kie_api_key,
            wb_title_prompt,
            wb_description_prompt,
            ozon_title_prompt,
            ozon_description_prompt,
            detailed_generation_prompt,
        );
    }
}

/// Partial settings update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub electricity_cost_per_kwh: Option<Decimal>,
    pub bubble_wrap_cost: Option<Decimal>,
    pub default_defect_percent: Option<Decimal>,
    pub default_consumables_percent: Option<Decimal>,
    pub default_wb_commission: Option<Decimal>,
    pub default_ozon_commission: Option<Decimal>,
    pub kie_api_key: Option<Secret<String>>,
    pub wb_title_prompt: Option<String>,
    pub wb_description_prompt: Option<String>,
    pub ozon_title_prompt: Option<String>,
    pub ozon_description_prompt: Option<String>,
    pub detailed_generation_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_details() -> ProductDetails {
        ProductDetails {
            name: "Planter".to_string(),
            ..ProductDetails::from_settings(&Settings::default())
        }
    }

    #[test]
    fn test_from_settings_copies_default_percents() {
        let details = ProductDetails::from_settings(&Settings::default());
        assert_eq!(details.consumables_percent, Decimal::from(10));
        assert_eq!(details.defect_percent, Decimal::from(5));
        assert_eq!(details.wb.commission_percent, Decimal::from(15));
        assert_eq!(details.ozon.commission_percent, Decimal::from(12));
        assert_eq!(details.desired_margin, Decimal::ZERO);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert_eq!(valid_details().validate(), Ok(()));

        let mut d = valid_details();
        d.name = "  ".to_string();
        assert_eq!(d.validate(), Err(ValidationError::Required("name")));

        let mut d = valid_details();
        d.weight_grams = Decimal::from(-1);
        assert_eq!(d.validate(), Err(ValidationError::Negative("weightGrams")));

        let mut d = valid_details();
        d.wb.commission_percent = Decimal::ONE_HUNDRED;
        assert_eq!(
            d.validate(),
            Err(ValidationError::CommissionOutOfRange("wb.commissionPercent"))
        );

        let mut d = valid_details();
        d.ozon.commission_percent = Decimal::new(9999, 2);
        assert_eq!(d.validate(), Ok(()));
    }

    #[test]
    fn test_duplicate_gets_new_identity() {
        let original = Product::new("PM-AAAAAA".to_string(), valid_details());
        let copy = original.duplicate("PM-BBBBBB".to_string());

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.article, "PM-BBBBBB");
        assert_eq!(copy.details.name, "Planter (copy)");
        assert_eq!(copy.details.weight_grams, original.details.weight_grams);
    }

    #[test]
    fn test_product_json_is_flat_camel_case() {
        let product = Product::new("PM-AAAAAA".to_string(), valid_details());
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["name"], "Planter");
        assert_eq!(json["article"], "PM-AAAAAA");
        assert!(json.get("details").is_none());
        assert!(json["wb"].get("commissionPercent").is_some());

        let back: Product = serde_json::from_value(json).unwrap();
        assert_eq!(back, product);
    }

    #[test]
    fn test_settings_patch_merges_only_present_fields() {
        let mut settings = Settings::default();
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"bubbleWrapCost": 20, "kieApiKey": "key"}"#).unwrap();
        settings.apply(patch);

        assert_eq!(settings.bubble_wrap_cost, Decimal::from(20));
        assert_eq!(settings.kie_api_key.expose(), "key");
        assert_eq!(settings.electricity_cost_per_kwh, Decimal::new(65, 1));
    }

    #[test]
    fn test_category_keeps_color_when_omitted() {
        let mut category = Category::new(CategoryDraft {
            name: "Decor".to_string(),
            description: None,
            color: None,
        });
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);

        category.apply(CategoryDraft {
            name: "Home decor".to_string(),
            description: Some("Vases".to_string()),
            color: None,
        });
        assert_eq!(category.name, "Home decor");
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
    }
}
