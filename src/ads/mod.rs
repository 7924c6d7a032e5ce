//! Boundary to the Google Ads platform.
//!
//! Tool handlers only ever see the [`AdsClient`] trait: a search query over
//! GAQL and a mutate call. The HTTP implementation lives in [`client`];
//! tests substitute their own.

mod client;

pub use client::GoogleAdsHttpClient;

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde_json::Value;

use crate::types::CustomerId;

/// The two operations the gateway needs from the ads platform.
///
/// Transport and validation failures are surfaced verbatim to the caller;
/// the gateway adds no interpretation of platform errors.
pub trait AdsClient: Send + Sync {
    /// Run a GAQL search query and return the result rows.
    fn query<'a>(
        &'a self,
        customer_id: &'a CustomerId,
        gaql: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Value>>> + Send + 'a>>;

    /// Apply mutate operations and return the platform response.
    fn mutate<'a>(
        &'a self,
        customer_id: &'a CustomerId,
        operations: Vec<Value>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;
}

/// Named ranges GAQL accepts directly in a `DURING` clause.
const NAMED_RANGES: &[&str] = &[
    "TODAY",
    "YESTERDAY",
    "LAST_7_DAYS",
    "LAST_30_DAYS",
    "THIS_MONTH",
    "LAST_MONTH",
];

/// Turn a user-facing date range into a GAQL `segments.date` clause.
///
/// Named ranges pass through as `DURING`; a `LAST_<n>_DAYS` pattern not
/// covered by GAQL expands to an explicit `BETWEEN` over calendar dates;
/// anything else is passed through as `DURING` and left for the platform
/// to validate.
pub fn convert_date_range(date_range: &str) -> String {
    if NAMED_RANGES.contains(&date_range) {
        return format!("segments.date DURING {date_range}");
    }

    if let Some(days) = parse_last_n_days(date_range) {
        let end = chrono::Utc::now().date_naive();
        let start = end - chrono::Duration::days(days);
        return format!("segments.date BETWEEN '{start}' AND '{end}'");
    }

    format!("segments.date DURING {date_range}")
}

fn parse_last_n_days(date_range: &str) -> Option<i64> {
    let middle = date_range.strip_prefix("LAST_")?.strip_suffix("_DAYS")?;
    middle.parse().ok()
}
