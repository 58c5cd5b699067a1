use crate::store::{Product, ProductId, ProjectId, Quote};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Increase,
    Decrease,
    Unchanged,
    /// Quoted only by project B.
    New,
    /// Quoted only by project A.
    NoQuote,
    NoComparison,
}

impl Status {
    /// Classify a pair of prices, A being the baseline.
    pub fn classify(price_a: Option<Decimal>, price_b: Option<Decimal>) -> Self {
        match (price_a, price_b) {
            (Some(a), Some(b)) if b > a => Status::Increase,
            (Some(a), Some(b)) if b < a => Status::Decrease,
            (Some(_), Some(_)) => Status::Unchanged,
            (None, Some(_)) => Status::New,
            (Some(_), None) => Status::NoQuote,
            (None, None) => Status::NoComparison,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Status::Increase => "↑",
            Status::Decrease => "↓",
            Status::Unchanged => "→",
            Status::New => "+",
            Status::NoQuote => "-",
            Status::NoComparison => "?",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Increase => "increase",
            Status::Decrease => "decrease",
            Status::Unchanged => "unchanged",
            Status::New => "new",
            Status::NoQuote => "no quote",
            Status::NoComparison => "no comparison",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub price_a: Option<Decimal>,
    pub price_b: Option<Decimal>,
    /// `price_b - price_a`, present only when both prices are and the
    /// difference is representable.
    pub diff: Option<Decimal>,
    /// `diff / price_a * 100`, absent when there is no diff or the base is zero.
    pub pct: Option<Decimal>,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub project_a: ProjectId,
    pub project_b: ProjectId,
    /// One row per quoted product, ascending by product id.
    pub rows: Vec<ComparisonRow>,
    /// Quoted product ids with no matching product row.
    pub unresolved: usize,
}

/// Product id to price for one project. A later quote for the same product
/// replaces an earlier one.
pub fn price_map(quotes: &[Quote], project: ProjectId) -> BTreeMap<ProductId, Decimal> {
    quotes
        .iter()
        .filter(|q| q.project_id == project)
        .map(|q| (q.product_id, q.price))
        .collect()
}

/// Absolute and percentage change from `price_a` to `price_b`.
pub fn price_change(
    price_a: Option<Decimal>,
    price_b: Option<Decimal>,
) -> (Option<Decimal>, Option<Decimal>) {
    let (Some(a), Some(b)) = (price_a, price_b) else {
        return (None, None);
    };
    // Hand-edited tables can hold values whose difference overflows.
    let Some(diff) = b.checked_sub(a) else {
        return (None, None);
    };
    let pct = if a.is_zero() {
        None
    } else {
        diff.checked_div(a)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    };
    (Some(diff), pct)
}

/// Compare the quotes of project `a` (baseline) against project `b`.
///
/// Rows cover the union of products either project quoted. Products that
/// no longer exist are skipped and counted.
pub fn compare(a: ProjectId, b: ProjectId, products: &[Product], quotes: &[Quote]) -> Comparison {
    let prices_a = price_map(quotes, a);
    let prices_b = price_map(quotes, b);
    // First row wins if an id was ever duplicated by hand-editing.
    let names: BTreeMap<ProductId, &str> = products
        .iter()
        .rev()
        .map(|p| (p.id, p.name.as_str()))
        .collect();

    let union: BTreeSet<ProductId> = prices_a.keys().chain(prices_b.keys()).copied().collect();

    let mut rows = Vec::with_capacity(union.len());
    let mut unresolved = 0;
    for product_id in union {
        let Some(name) = names.get(&product_id) else {
            unresolved += 1;
            continue;
        };
        let price_a = prices_a.get(&product_id).copied();
        let price_b = prices_b.get(&product_id).copied();
        let (diff, pct) = price_change(price_a, price_b);
        rows.push(ComparisonRow {
            product_id,
            product_name: name.to_string(),
            price_a,
            price_b,
            diff,
            pct,
            status: Status::classify(price_a, price_b),
        });
    }

    if unresolved > 0 {
        warn!(project_a = %a, project_b = %b, unresolved, "skipped quotes for missing products");
    }
    debug!(project_a = %a, project_b = %b, rows = rows.len(), "compared projects");

    Comparison {
        project_a: a,
        project_b: b,
        rows,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{dec, product, quote};

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "productX", "20.00"),
            product(2, "productY", "20.00"),
            product(3, "productZ", "20.00"),
        ]
    }

    fn statuses(cmp: &Comparison) -> Vec<(i64, Status)> {
        cmp.rows
            .iter()
            .map(|r| (r.product_id.get(), r.status))
            .collect()
    }

    #[test]
    fn test_compare_mixed_projects() {
        let quotes = vec![
            quote(1, 1, "10.00"),
            quote(1, 2, "5.00"),
            quote(2, 1, "12.00"),
            quote(2, 3, "3.00"),
        ];
        let cmp = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &quotes);

        assert_eq!(cmp.rows.len(), 3);
        let x = &cmp.rows[0];
        assert_eq!(x.product_name, "productX");
        assert_eq!(x.diff, Some(dec("2.00")));
        assert_eq!(x.pct, Some(dec("20.0")));
        assert_eq!(x.status, Status::Increase);

        let y = &cmp.rows[1];
        assert_eq!(y.product_name, "productY");
        assert_eq!(y.status, Status::NoQuote);
        assert_eq!((y.price_a, y.price_b), (Some(dec("5.00")), None));
        assert_eq!((y.diff, y.pct), (None, None));

        let z = &cmp.rows[2];
        assert_eq!(z.product_name, "productZ");
        assert_eq!(z.status, Status::New);
        assert_eq!((z.diff, z.pct), (None, None));
        assert_eq!(cmp.unresolved, 0);
    }

    #[test]
    fn test_compare_decrease_and_unchanged() {
        let quotes = vec![
            quote(1, 1, "8.00"),
            quote(1, 2, "4.00"),
            quote(2, 1, "6.00"),
            quote(2, 2, "4.00"),
        ];
        let cmp = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &quotes);
        assert_eq!(
            statuses(&cmp),
            vec![(1, Status::Decrease), (2, Status::Unchanged)]
        );
        assert_eq!(cmp.rows[0].diff, Some(dec("-2.00")));
        assert_eq!(cmp.rows[0].pct, Some(dec("-25")));
        assert_eq!(cmp.rows[1].diff, Some(Decimal::ZERO));
        assert_eq!(cmp.rows[1].pct, Some(Decimal::ZERO));
    }

    #[test]
    fn test_rows_ascend_by_product_id() {
        let quotes = vec![quote(2, 3, "1.00"), quote(1, 2, "1.00"), quote(2, 1, "1.00")];
        let cmp = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &quotes);
        let ids: Vec<i64> = cmp.rows.iter().map(|r| r.product_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_last_quote_wins() {
        let quotes = vec![
            quote(1, 1, "10.00"),
            quote(2, 1, "11.00"),
            quote(1, 1, "12.00"),
        ];
        let cmp = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &quotes);
        assert_eq!(cmp.rows[0].price_a, Some(dec("12.00")));
        assert_eq!(cmp.rows[0].status, Status::Decrease);
    }

    #[test]
    fn test_zero_base_has_no_percentage() {
        let quotes = vec![quote(1, 1, "0"), quote(2, 1, "3.00")];
        let cmp = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &quotes);
        assert_eq!(cmp.rows[0].diff, Some(dec("3.00")));
        assert_eq!(cmp.rows[0].pct, None);
        assert_eq!(cmp.rows[0].status, Status::Increase);
    }

    #[test]
    fn test_overflowing_difference_has_no_diff() {
        let mut low = quote(1, 1, "1");
        low.price = Decimal::MIN;
        let mut high = quote(2, 1, "1");
        high.price = Decimal::MAX;
        let cmp = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &[low, high]);

        let row = &cmp.rows[0];
        assert_eq!(row.diff, None);
        assert_eq!(row.pct, None);
        assert_eq!(row.status, Status::Increase);
    }

    #[test]
    fn test_empty_project_yields_only_new_or_no_quote() {
        let quotes = vec![quote(2, 1, "1.00"), quote(2, 3, "2.00")];
        let as_baseline = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &quotes);
        assert!(as_baseline.rows.iter().all(|r| r.status == Status::New));

        let as_target = compare(ProjectId::new(2), ProjectId::new(1), &catalog(), &quotes);
        assert!(as_target.rows.iter().all(|r| r.status == Status::NoQuote));

        let both_empty = compare(ProjectId::new(1), ProjectId::new(3), &catalog(), &quotes);
        assert!(both_empty.rows.is_empty());
    }

    #[test]
    fn test_missing_product_is_skipped_and_counted() {
        let quotes = vec![quote(1, 1, "1.00"), quote(1, 42, "2.00"), quote(2, 42, "2.50")];
        let cmp = compare(ProjectId::new(1), ProjectId::new(2), &catalog(), &quotes);
        assert_eq!(statuses(&cmp), vec![(1, Status::NoQuote)]);
        assert_eq!(cmp.unresolved, 1);
    }

    #[test]
    fn test_same_project_on_both_sides() {
        let quotes = vec![quote(1, 1, "1.00"), quote(1, 2, "2.00")];
        let cmp = compare(ProjectId::new(1), ProjectId::new(1), &catalog(), &quotes);
        assert!(cmp.rows.iter().all(|r| r.status == Status::Unchanged));
    }

    #[test]
    fn test_classify_decision_table() {
        let one = Some(dec("1"));
        let two = Some(dec("2"));
        assert_eq!(Status::classify(one, two), Status::Increase);
        assert_eq!(Status::classify(two, one), Status::Decrease);
        assert_eq!(Status::classify(two, two), Status::Unchanged);
        assert_eq!(Status::classify(None, one), Status::New);
        assert_eq!(Status::classify(one, None), Status::NoQuote);
        assert_eq!(Status::classify(None, None), Status::NoComparison);
    }

    /// Every pair of quote subsets over three products.
    #[test]
    fn test_union_and_presence_properties() {
        let products = catalog();
        let prices = ["1.00", "2.00", "0"];
        for mask_a in 0u8..8 {
            for mask_b in 0u8..8 {
                let mut quotes = Vec::new();
                let mut expected = BTreeSet::new();
                for bit in 0..3 {
                    let id = i64::from(bit) + 1;
                    if mask_a & (1 << bit) != 0 {
                        quotes.push(quote(1, id, prices[bit as usize]));
                        expected.insert(id);
                    }
                    if mask_b & (1 << bit) != 0 {
                        quotes.push(quote(2, id, prices[(bit as usize + 1) % 3]));
                        expected.insert(id);
                    }
                }

                let cmp = compare(ProjectId::new(1), ProjectId::new(2), &products, &quotes);
                let ids: Vec<i64> = cmp.rows.iter().map(|r| r.product_id.get()).collect();
                let got: BTreeSet<i64> = ids.iter().copied().collect();
                assert_eq!(got, expected);
                assert_eq!(ids.len(), got.len(), "rows must not repeat a product");

                for row in &cmp.rows {
                    let both = row.price_a.is_some() && row.price_b.is_some();
                    assert_eq!(row.diff.is_some(), both);
                    let base_nonzero = row.price_a.is_some_and(|a| !a.is_zero());
                    assert_eq!(row.pct.is_some(), both && base_nonzero);
                    assert_eq!(row.status, Status::classify(row.price_a, row.price_b));
                    assert_ne!(row.status, Status::NoComparison);
                }
            }
        }
    }
}
