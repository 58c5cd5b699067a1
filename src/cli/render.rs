use crate::analysis::{Comparison, Trend};
use crate::catalog::ProjectQuotes;
use crate::store::{Category, Product, Project};
use rust_decimal::Decimal;
use unicode_width::UnicodeWidthStr;

/// Plain column-aligned text table. Widths account for wide (CJK) characters.
#[derive(Debug, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
        }

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn price(value: Decimal) -> String {
    format!("{:.2}", value)
}

pub fn opt_price(value: Option<Decimal>) -> String {
    value.map(price).unwrap_or_else(|| "-".to_string())
}

/// Signed amount, e.g. `+2.00` or `-0.50`.
pub fn signed(value: Option<Decimal>) -> String {
    match value {
        Some(v) if v.is_sign_positive() && !v.is_zero() => format!("+{:.2}", v),
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

pub fn percent(value: Option<Decimal>) -> String {
    match value {
        Some(_) => format!("{}%", signed(value)),
        None => "-".to_string(),
    }
}

pub fn projects(rows: &[Project]) -> String {
    let mut table = TextTable::new(&["ID", "NAME", "INQUIRY DATE", "CREATED"]);
    for p in rows {
        table.push(vec![
            p.id.to_string(),
            p.name.clone(),
            p.inquiry_date.to_string(),
            p.created_on.to_string(),
        ]);
    }
    table.render()
}

pub fn products(rows: &[Product]) -> String {
    let mut table = TextTable::new(&["ID", "NAME", "SPEC", "UNIT", "LIMIT", "CATEGORY"]);
    for p in rows {
        table.push(vec![
            p.id.to_string(),
            p.name.clone(),
            p.spec.clone(),
            p.unit.clone(),
            price(p.limit_price),
            p.category.clone(),
        ]);
    }
    table.render()
}

pub fn categories(rows: &[Category]) -> String {
    let mut table = TextTable::new(&["ID", "NAME"]);
    for c in rows {
        table.push(vec![c.id.to_string(), c.name.clone()]);
    }
    table.render()
}

pub fn project_quotes(view: &ProjectQuotes) -> String {
    let mut table = TextTable::new(&["PRODUCT", "SPEC", "UNIT", "PRICE", "LIMIT", ""]);
    for line in &view.lines {
        table.push(vec![
            line.product_name.clone(),
            line.spec.clone(),
            line.unit.clone(),
            price(line.price),
            price(line.limit_price),
            if line.over_limit {
                "OVER LIMIT".to_string()
            } else {
                String::new()
            },
        ]);
    }
    let mut out = format!("Quotes for {} ({})\n", view.project.name, view.project.id);
    out.push_str(&table.render());
    out
}

pub fn comparison(cmp: &Comparison, name_a: &str, name_b: &str) -> String {
    let mut table = TextTable::new(&["PRODUCT", name_a, name_b, "DIFF", "DIFF %", "STATUS"]);
    for row in &cmp.rows {
        table.push(vec![
            row.product_name.clone(),
            opt_price(row.price_a),
            opt_price(row.price_b),
            signed(row.diff),
            percent(row.pct),
            format!("{} {}", row.status.symbol(), row.status),
        ]);
    }
    table.render()
}

pub fn trend(trend: &Trend, product_name: &str) -> String {
    let mut table = TextTable::new(&["INQUIRY DATE", "PRICE", "PROJECT"]);
    for point in &trend.points {
        table.push(vec![
            point.date.to_string(),
            price(point.price),
            point.project_name.clone(),
        ]);
    }
    let mut out = format!("Price history of {product_name}\n");
    out.push_str(&table.render());
    out
}
