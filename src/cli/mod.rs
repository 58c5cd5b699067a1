//! Command-line surface: subcommand definitions and their handlers.
//! Handlers write to the given writer so they can be driven from tests.

pub mod render;

use crate::analysis::{compare, price_trend};
use crate::catalog::{
    CatalogError, CatalogManager, DeleteOutcome, NewProduct, ProductPatch, ProjectPatch,
    find_product, find_project,
};
use crate::config::AppConfig;
use crate::store::{CategoryId, CsvRecordStore, ProductId, ProjectId, Snapshot};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use tracing::info;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create empty table files in the data directory
    Init,
    /// Manage projects (price-inquiry rounds)
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage the product catalog
    #[command(subcommand)]
    Product(ProductCommand),
    /// Manage product categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Record and list quotes
    #[command(subcommand)]
    Quote(QuoteCommand),
    /// Compare the quotes of project A (baseline) with project B
    Compare {
        /// Project id or name
        a: String,
        /// Project id or name
        b: String,
    },
    /// Show the price history of one product across projects
    Trend {
        /// Product id or name
        product: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommand {
    Add {
        name: String,
        /// Inquiry date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    List,
    Edit {
        /// Project id or name
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    Delete {
        ids: Vec<i64>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductCommand {
    Add {
        name: String,
        /// Limit (ceiling) price
        #[arg(long, value_parser = parse_price)]
        limit: Decimal,
        #[arg(long, default_value = "")]
        spec: String,
        #[arg(long, default_value = "")]
        unit: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    List {
        /// Only products of this category
        #[arg(long)]
        category: Option<String>,
    },
    Edit {
        /// Product id or name
        product: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        spec: Option<String>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long, value_parser = parse_price)]
        limit: Option<Decimal>,
        #[arg(long)]
        category: Option<String>,
    },
    Delete {
        ids: Vec<i64>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    Add { name: String },
    List,
    Edit { id: i64, name: String },
    Delete { ids: Vec<i64> },
}

#[derive(Subcommand, Debug, Clone)]
pub enum QuoteCommand {
    Add {
        /// Project id or name
        project: String,
        /// Product id or name
        product: String,
        #[arg(value_parser = parse_price)]
        price: Decimal,
    },
    /// List one project's quotes, flagging prices above the product limit
    List {
        /// Project id or name
        project: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

fn parse_price(s: &str) -> Result<Decimal, String> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid price '{s}': {e}"))
}

/// Execute one command against the configured store.
pub fn run(cfg: &AppConfig, command: Command, out: &mut dyn Write) -> Result<()> {
    let store = CsvRecordStore::open(&cfg.data_dir)
        .with_context(|| format!("open data directory {}", cfg.data_dir.display()))?;

    if let Command::Init = command {
        let created = store.init()?;
        if created.is_empty() {
            writeln!(out, "Store already initialized at {}", cfg.data_dir.display())?;
        }
        for table in created {
            writeln!(out, "Created {}", store.table_path(table).display())?;
        }
        return Ok(());
    }

    let catalog = CatalogManager::new(store, cfg.duplicate_quotes);
    // Fail the whole session on an unreadable table, before any mutation.
    let snapshot = catalog.snapshot().context("load data")?;
    info!(
        projects = snapshot.projects.len(),
        products = snapshot.products.len(),
        quotes = snapshot.quotes.len(),
        "loaded store"
    );

    let printer = Printer { json: cfg.json };
    match command {
        // Handled before the snapshot load.
        Command::Init => Ok(()),
        Command::Project(cmd) => run_project(&catalog, &snapshot, cmd, &printer, out),
        Command::Product(cmd) => run_product(&catalog, &snapshot, cmd, &printer, out),
        Command::Category(cmd) => run_category(&catalog, &snapshot, cmd, &printer, out),
        Command::Quote(cmd) => run_quote(&catalog, &snapshot, cmd, &printer, out),
        Command::Compare { a, b } => run_compare(&snapshot, &a, &b, &printer, out),
        Command::Trend { product } => run_trend(&snapshot, &product, &printer, out),
    }
}

struct Printer {
    json: bool,
}

impl Printer {
    fn emit<T: Serialize>(
        &self,
        out: &mut dyn Write,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<()> {
        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
        } else {
            write!(out, "{}", text())?;
        }
        Ok(())
    }

    /// Notices are informational and never part of JSON output.
    fn notice(&self, out: &mut dyn Write, message: &str) -> Result<()> {
        if !self.json {
            writeln!(out, "{message}")?;
        }
        Ok(())
    }

    /// A notice that stands in for the command's whole output, so JSON mode
    /// still prints one document.
    fn skipped(&self, out: &mut dyn Write, message: &str) -> Result<()> {
        let body = serde_json::json!({ "notice": message });
        self.emit(out, &body, || format!("{message}\n"))
    }
}

fn report_delete(
    printer: &Printer,
    out: &mut dyn Write,
    what: &str,
    outcome: &DeleteOutcome,
) -> Result<()> {
    let text = match outcome {
        DeleteOutcome::NothingSelected => {
            format!("Nothing selected: pass one or more {what} ids to delete.\n")
        }
        DeleteOutcome::Deleted { removed, missing } => {
            let mut s = format!("Deleted {removed} {what}(s).\n");
            if !missing.is_empty() {
                let ids: Vec<String> = missing.iter().map(i64::to_string).collect();
                s.push_str(&format!("No {what} with id: {}\n", ids.join(", ")));
            }
            s
        }
    };
    printer.emit(out, outcome, || text)
}

fn resolve_project(snapshot: &Snapshot, selector: &str) -> Result<ProjectId, CatalogError> {
    find_project(snapshot, selector)
        .map(|p| p.id)
        .ok_or_else(|| CatalogError::UnknownProject(selector.to_string()))
}

fn resolve_product(snapshot: &Snapshot, selector: &str) -> Result<ProductId, CatalogError> {
    find_product(snapshot, selector)
        .map(|p| p.id)
        .ok_or_else(|| CatalogError::UnknownProduct(selector.to_string()))
}

fn run_project(
    catalog: &CatalogManager,
    snapshot: &Snapshot,
    cmd: ProjectCommand,
    printer: &Printer,
    out: &mut dyn Write,
) -> Result<()> {
    match cmd {
        ProjectCommand::Add { name, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let project = catalog.add_project(&name, date)?;
            printer.emit(out, &project, || {
                format!("Added project {} ({})\n", project.name, project.id)
            })
        }
        ProjectCommand::List => printer.emit(out, &snapshot.projects, || {
            render::projects(&snapshot.projects)
        }),
        ProjectCommand::Edit {
            project,
            name,
            date,
        } => {
            let id = resolve_project(snapshot, &project)?;
            let patch = ProjectPatch {
                name,
                inquiry_date: date,
            };
            let project = catalog.edit_project(id, patch)?;
            printer.emit(out, &project, || format!("Updated project {}\n", project.id))
        }
        ProjectCommand::Delete { ids } => {
            let ids: Vec<ProjectId> = ids.into_iter().map(ProjectId::new).collect();
            let outcome = catalog.delete_projects(&ids)?;
            report_delete(printer, out, "project", &outcome)
        }
    }
}

fn run_product(
    catalog: &CatalogManager,
    snapshot: &Snapshot,
    cmd: ProductCommand,
    printer: &Printer,
    out: &mut dyn Write,
) -> Result<()> {
    match cmd {
        ProductCommand::Add {
            name,
            limit,
            spec,
            unit,
            category,
        } => {
            let product = catalog.add_product(NewProduct {
                name,
                spec,
                unit,
                limit_price: limit,
                category,
            })?;
            printer.emit(out, &product, || {
                format!("Added product {} ({})\n", product.name, product.id)
            })
        }
        ProductCommand::List { category } => {
            let products = catalog.products_in_category(category.as_deref())?;
            printer.emit(out, &products, || render::products(&products))
        }
        ProductCommand::Edit {
            product,
            name,
            spec,
            unit,
            limit,
            category,
        } => {
            let id = resolve_product(snapshot, &product)?;
            let patch = ProductPatch {
                name,
                spec,
                unit,
                limit_price: limit,
                category,
            };
            let product = catalog.edit_product(id, patch)?;
            printer.emit(out, &product, || format!("Updated product {}\n", product.id))
        }
        ProductCommand::Delete { ids } => {
            let ids: Vec<ProductId> = ids.into_iter().map(ProductId::new).collect();
            let outcome = catalog.delete_products(&ids)?;
            report_delete(printer, out, "product", &outcome)
        }
    }
}

fn run_category(
    catalog: &CatalogManager,
    snapshot: &Snapshot,
    cmd: CategoryCommand,
    printer: &Printer,
    out: &mut dyn Write,
) -> Result<()> {
    match cmd {
        CategoryCommand::Add { name } => {
            let category = catalog.add_category(&name)?;
            printer.emit(out, &category, || {
                format!("Added category {} ({})\n", category.name, category.id)
            })
        }
        CategoryCommand::List => printer.emit(out, &snapshot.categories, || {
            render::categories(&snapshot.categories)
        }),
        CategoryCommand::Edit { id, name } => {
            let category = catalog.edit_category(CategoryId::new(id), &name)?;
            printer.emit(out, &category, || {
                format!("Updated category {}\n", category.id)
            })
        }
        CategoryCommand::Delete { ids } => {
            let ids: Vec<CategoryId> = ids.into_iter().map(CategoryId::new).collect();
            let outcome = catalog.delete_categories(&ids)?;
            report_delete(printer, out, "category", &outcome)
        }
    }
}

fn run_quote(
    catalog: &CatalogManager,
    snapshot: &Snapshot,
    cmd: QuoteCommand,
    printer: &Printer,
    out: &mut dyn Write,
) -> Result<()> {
    if snapshot.projects.is_empty() || snapshot.products.is_empty() {
        return printer.skipped(out, "Add at least one project and one product first.");
    }
    match cmd {
        QuoteCommand::Add {
            project,
            product,
            price,
        } => {
            let project_id = resolve_project(snapshot, &project)?;
            let product_id = resolve_product(snapshot, &product)?;
            let quote = catalog.add_quote(project_id, product_id, price)?;
            let over_limit = snapshot
                .product(product_id)
                .is_some_and(|p| p.is_over_limit(quote.price));
            printer.emit(out, &quote, || {
                let mut s = format!(
                    "Added quote {} for product {} in project {}\n",
                    render::price(quote.price),
                    quote.product_id,
                    quote.project_id
                );
                if over_limit {
                    s.push_str("Warning: price is above the product's limit price\n");
                }
                s
            })
        }
        QuoteCommand::List { project } => {
            let id = resolve_project(snapshot, &project)?;
            let view = catalog.project_quotes(id)?;
            printer.emit(out, &view, || render::project_quotes(&view))?;
            if view.unresolved > 0 {
                printer.notice(
                    out,
                    &format!("{} quote(s) refer to deleted products.", view.unresolved),
                )?;
            }
            Ok(())
        }
    }
}

fn run_compare(
    snapshot: &Snapshot,
    a: &str,
    b: &str,
    printer: &Printer,
    out: &mut dyn Write,
) -> Result<()> {
    if snapshot.projects.len() < 2 {
        return printer.skipped(out, "At least two projects are needed for a comparison.");
    }
    let a = resolve_project(snapshot, a)?;
    let b = resolve_project(snapshot, b)?;
    let cmp = compare(a, b, &snapshot.products, &snapshot.quotes);

    let name_of = |id: ProjectId| {
        snapshot
            .project(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let (name_a, name_b) = (name_of(a), name_of(b));
    printer.emit(out, &cmp, || render::comparison(&cmp, &name_a, &name_b))?;
    if cmp.unresolved > 0 {
        printer.notice(
            out,
            &format!("{} quoted product(s) no longer exist.", cmp.unresolved),
        )?;
    }
    Ok(())
}

fn run_trend(
    snapshot: &Snapshot,
    product: &str,
    printer: &Printer,
    out: &mut dyn Write,
) -> Result<()> {
    let id = resolve_product(snapshot, product)?;
    let trend = price_trend(id, &snapshot.quotes, &snapshot.projects);
    let name = snapshot
        .product(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string());

    if trend.is_empty() {
        printer.notice(out, &format!("{name} has not been quoted yet."))?;
        if !printer.json {
            return Ok(());
        }
    }
    printer.emit(out, &trend, || render::trend(&trend, &name))?;
    if trend.unresolved > 0 {
        printer.notice(
            out,
            &format!("{} quote(s) refer to deleted projects.", trend.unresolved),
        )?;
    }
    Ok(())
}
