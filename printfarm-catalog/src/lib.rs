pub mod model;
pub mod pricing;
pub mod logistics;
pub mod article;
pub mod search;
pub mod dashboard;

pub use model::{
    Category, CategoryDraft, Dimensions, Listing, Marketplace, Packaging, PackagingDraft,
    Printer, PrinterDraft, Product, ProductDetails, Settings, SettingsPatch, ValidationError,
};
pub use pricing::{compute_costs, CostBreakdown, PricingIssue, RecommendedPrice};
pub use logistics::{estimate_logistics, LogisticsEstimate, LogisticsError, LogisticsInput};
pub use search::ProductFilter;
pub use dashboard::{dashboard_stats, DashboardStats, ProfitSummary};
