use crate::store::{ProductId, Project, ProjectId, Quote};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub price: Decimal,
    pub project_id: ProjectId,
    pub project_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub product_id: ProductId,
    /// Non-decreasing by date; same-date points keep quote order.
    pub points: Vec<TrendPoint>,
    /// Quotes whose project no longer exists.
    pub unresolved: usize,
}

impl Trend {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Price history of one product across every project that quoted it.
pub fn price_trend(product: ProductId, quotes: &[Quote], projects: &[Project]) -> Trend {
    let by_id: HashMap<ProjectId, &Project> =
        projects.iter().rev().map(|p| (p.id, p)).collect();

    let mut points = Vec::new();
    let mut unresolved = 0;
    for quote in quotes.iter().filter(|q| q.product_id == product) {
        let Some(project) = by_id.get(&quote.project_id) else {
            unresolved += 1;
            continue;
        };
        points.push(TrendPoint {
            date: project.inquiry_date,
            price: quote.price,
            project_id: project.id,
            project_name: project.name.clone(),
        });
    }
    // Stable, so ties stay in quote order.
    points.sort_by_key(|p| p.date);

    if unresolved > 0 {
        warn!(product = %product, unresolved, "skipped quotes for missing projects");
    }
    debug!(product = %product, points = points.len(), "extracted price trend");

    Trend {
        product_id: product,
        points,
        unresolved,
    }
}
