pub mod ad_account;
pub mod date_range;
pub mod metrics;
pub mod order;
pub mod settings;

pub use ad_account::{AdAccount, AdPlatform};
pub use date_range::DateRange;
pub use metrics::{
    AdSpendSummary, ChartPoint, DailySpend, DashboardMetrics, DashboardSummary, PlatformSpend,
    SpendReport,
};
pub use order::{LineItem, Order};
pub use settings::{StoreSettings, MAX_SKU_LEN};
