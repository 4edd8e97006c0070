pub mod ad_spend;
pub mod cogs_csv;
pub mod dashboard;
pub mod http;
pub mod order_aggregator;
pub mod providers;
pub mod shopify;

pub use ad_spend::{AdSpendAggregator, AdSpendProvider};
pub use cogs_csv::{parse_cogs_csv, CogsImport, CogsImportReport};
pub use dashboard::{compose, DashboardService};
pub use order_aggregator::{aggregate_orders, aggregate_orders_detailed, OrderAggregate};
pub use providers::{GoogleAdsProvider, MetaAdsProvider};
pub use shopify::{OrderSource, ShopifyClient};
