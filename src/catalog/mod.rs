pub mod error;
pub mod manager;
#[cfg(test)]
pub mod tests;

pub use error::CatalogError;
pub use manager::CatalogManager;

use crate::store::{Product, ProductId, Project, Snapshot};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when a project quotes a product it has already quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateQuotePolicy {
    /// Append the new quote; comparisons use the most recent one.
    #[default]
    Allow,
    Reject,
}

impl FromStr for DuplicateQuotePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown duplicate quote policy '{other}' (expected allow or reject)"
            )),
        }
    }
}

impl fmt::Display for DuplicateQuotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub spec: String,
    pub unit: String,
    pub limit_price: Decimal,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub inquiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub spec: Option<String>,
    pub unit: Option<String>,
    pub limit_price: Option<Decimal>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The caller passed no ids; nothing was touched.
    NothingSelected,
    Deleted { removed: usize, missing: Vec<i64> },
}

/// One row of a project's quote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub spec: String,
    pub unit: String,
    pub price: Decimal,
    pub limit_price: Decimal,
    pub over_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectQuotes {
    pub project: Project,
    pub lines: Vec<QuoteLine>,
    /// Quotes pointing at products that no longer exist.
    pub unresolved: usize,
}

/// Find a project by numeric id, falling back to the first exact name match.
pub fn find_project<'a>(snapshot: &'a Snapshot, selector: &str) -> Option<&'a Project> {
    let selector = selector.trim();
    if let Ok(id) = selector.parse::<i64>()
        && let Some(project) = snapshot.projects.iter().find(|p| p.id.get() == id)
    {
        return Some(project);
    }
    snapshot.projects.iter().find(|p| p.name == selector)
}

/// Find a product by numeric id, falling back to the first exact name match.
pub fn find_product<'a>(snapshot: &'a Snapshot, selector: &str) -> Option<&'a Product> {
    let selector = selector.trim();
    if let Ok(id) = selector.parse::<i64>()
        && let Some(product) = snapshot.products.iter().find(|p| p.id.get() == id)
    {
        return Some(product);
    }
    snapshot.products.iter().find(|p| p.name == selector)
}
