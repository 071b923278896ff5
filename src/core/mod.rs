//! Core business logic: strategies, allocation, history and pricing

pub mod allocation;
pub mod config;
pub mod history;
pub mod log;
pub mod price;
pub mod strategy;

// Re-export main types for cleaner imports
pub use allocation::{Allocation, AllocationRequest, AllocationRow, build_portfolio};
pub use history::{HistoryRecord, HistoryStore, HistoryTracker};
pub use price::{PriceMap, PriceProvider, PriceQuote, fetch_prices};
pub use strategy::{Basket, Strategy, StrategySelection};
