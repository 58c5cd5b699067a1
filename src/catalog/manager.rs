use crate::catalog::{
    CatalogError, DeleteOutcome, DuplicateQuotePolicy, NewProduct, ProductPatch, ProjectPatch,
    ProjectQuotes, QuoteLine,
};
use crate::store::{
    Category, CategoryId, CsvRecordStore, Keyed, Product, ProductId, Project, ProjectId, Quote,
    RecordStore, Snapshot,
};
use chrono::{Local, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Smallest accepted price or limit price.
const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Create, edit and delete operations over the record store.
///
/// Every operation reads fresh rows and writes back a full table.
#[derive(Debug)]
pub struct CatalogManager<S: RecordStore = CsvRecordStore> {
    pub store: S,
    pub duplicate_quotes: DuplicateQuotePolicy,
}

impl<S: RecordStore> CatalogManager<S> {
    pub fn new(store: S, duplicate_quotes: DuplicateQuotePolicy) -> Self {
        Self {
            store,
            duplicate_quotes,
        }
    }

    pub fn snapshot(&self) -> Result<Snapshot, CatalogError> {
        Ok(self.store.load_snapshot()?)
    }

    pub fn add_project(&self, name: &str, inquiry_date: NaiveDate) -> Result<Project, CatalogError> {
        let name = validate_name(name)?;
        let mut projects: Vec<Project> = self.store.load()?;
        let id = self.store.next_id(&projects)?;
        let project = Project {
            id: ProjectId::new(id),
            name,
            inquiry_date,
            created_on: Local::now().date_naive(),
        };
        projects.push(project.clone());
        self.store.replace(&projects)?;
        info!(id, name = %project.name, "added project");
        Ok(project)
    }

    pub fn add_product(&self, new: NewProduct) -> Result<Product, CatalogError> {
        let name = validate_name(&new.name)?;
        let limit_price = validate_price(new.limit_price)?;
        let categories: Vec<Category> = self.store.load()?;
        check_category(&categories, &new.category)?;

        let mut products: Vec<Product> = self.store.load()?;
        let id = self.store.next_id(&products)?;
        let product = Product {
            id: ProductId::new(id),
            name,
            spec: new.spec.trim().to_string(),
            unit: new.unit.trim().to_string(),
            limit_price,
            category: new.category.trim().to_string(),
        };
        products.push(product.clone());
        self.store.replace(&products)?;
        info!(id, name = %product.name, "added product");
        Ok(product)
    }

    pub fn add_category(&self, name: &str) -> Result<Category, CatalogError> {
        let name = validate_name(name)?;
        let mut categories: Vec<Category> = self.store.load()?;
        let id = self.store.next_id(&categories)?;
        let category = Category {
            id: CategoryId::new(id),
            name,
        };
        categories.push(category.clone());
        self.store.replace(&categories)?;
        info!(id, name = %category.name, "added category");
        Ok(category)
    }

    pub fn add_quote(
        &self,
        project_id: ProjectId,
        product_id: ProductId,
        price: Decimal,
    ) -> Result<Quote, CatalogError> {
        let price = validate_price(price)?;
        let projects: Vec<Project> = self.store.load()?;
        if !projects.iter().any(|p| p.id == project_id) {
            return Err(CatalogError::UnknownProject(project_id.to_string()));
        }
        let products: Vec<Product> = self.store.load()?;
        if !products.iter().any(|p| p.id == product_id) {
            return Err(CatalogError::UnknownProduct(product_id.to_string()));
        }

        let mut quotes: Vec<Quote> = self.store.load()?;
        let already_quoted = quotes
            .iter()
            .any(|q| q.project_id == project_id && q.product_id == product_id);
        if already_quoted && self.duplicate_quotes == DuplicateQuotePolicy::Reject {
            return Err(CatalogError::DuplicateQuote {
                project: project_id,
                product: product_id,
            });
        }

        let quote = Quote {
            project_id,
            product_id,
            price,
        };
        quotes.push(quote.clone());
        self.store.replace(&quotes)?;
        info!(
            project = %project_id,
            product = %product_id,
            %price,
            requote = already_quoted,
            "added quote"
        );
        Ok(quote)
    }

    pub fn edit_project(&self, id: ProjectId, patch: ProjectPatch) -> Result<Project, CatalogError> {
        let mut projects: Vec<Project> = self.store.load()?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::UnknownProject(id.to_string()))?;
        if let Some(name) = patch.name {
            project.name = validate_name(&name)?;
        }
        if let Some(date) = patch.inquiry_date {
            project.inquiry_date = date;
        }
        let updated = project.clone();
        self.store.replace(&projects)?;
        info!(id = %id, "edited project");
        Ok(updated)
    }

    pub fn edit_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        if let Some(category) = &patch.category {
            let categories: Vec<Category> = self.store.load()?;
            check_category(&categories, category)?;
        }
        let mut products: Vec<Product> = self.store.load()?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::UnknownProduct(id.to_string()))?;
        if let Some(name) = patch.name {
            product.name = validate_name(&name)?;
        }
        if let Some(spec) = patch.spec {
            product.spec = spec.trim().to_string();
        }
        if let Some(unit) = patch.unit {
            product.unit = unit.trim().to_string();
        }
        if let Some(limit_price) = patch.limit_price {
            product.limit_price = validate_price(limit_price)?;
        }
        if let Some(category) = patch.category {
            product.category = category.trim().to_string();
        }
        let updated = product.clone();
        self.store.replace(&products)?;
        info!(id = %id, "edited product");
        Ok(updated)
    }

    pub fn edit_category(&self, id: CategoryId, name: &str) -> Result<Category, CatalogError> {
        let name = validate_name(name)?;
        let mut categories: Vec<Category> = self.store.load()?;
        let category = categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::UnknownCategory(id.to_string()))?;
        category.name = name;
        let updated = category.clone();
        self.store.replace(&categories)?;
        info!(id = %id, "edited category");
        Ok(updated)
    }

    pub fn delete_projects(&self, ids: &[ProjectId]) -> Result<DeleteOutcome, CatalogError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let outcome = self.delete_rows::<Project>(&ids)?;
        self.warn_orphaned_quotes(&ids, |q| q.project_id.get())?;
        Ok(outcome)
    }

    pub fn delete_products(&self, ids: &[ProductId]) -> Result<DeleteOutcome, CatalogError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let outcome = self.delete_rows::<Product>(&ids)?;
        self.warn_orphaned_quotes(&ids, |q| q.product_id.get())?;
        Ok(outcome)
    }

    pub fn delete_categories(&self, ids: &[CategoryId]) -> Result<DeleteOutcome, CatalogError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        self.delete_rows::<Category>(&ids)
    }

    fn delete_rows<R: Keyed>(&self, ids: &[i64]) -> Result<DeleteOutcome, CatalogError> {
        if ids.is_empty() {
            return Ok(DeleteOutcome::NothingSelected);
        }
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let rows: Vec<R> = self.store.load()?;
        let (removed, kept): (Vec<R>, Vec<R>) =
            rows.into_iter().partition(|r| wanted.contains(&r.key()));
        let found: BTreeSet<i64> = removed.iter().map(Keyed::key).collect();
        let missing: Vec<i64> = wanted.difference(&found).copied().collect();

        if !removed.is_empty() {
            self.store.replace(&kept)?;
        }
        info!(
            table = %R::TABLE,
            removed = removed.len(),
            missing = missing.len(),
            "deleted rows"
        );
        Ok(DeleteOutcome::Deleted {
            removed: removed.len(),
            missing,
        })
    }

    /// Quotes are never cascaded; they stay on disk and are skipped when read.
    fn warn_orphaned_quotes(
        &self,
        ids: &[i64],
        key: impl Fn(&Quote) -> i64,
    ) -> Result<(), CatalogError> {
        if ids.is_empty() {
            return Ok(());
        }
        let quotes: Vec<Quote> = self.store.load()?;
        let orphaned = quotes.iter().filter(|q| ids.contains(&key(q))).count();
        if orphaned > 0 {
            warn!(orphaned, "deleted rows are still referenced by quotes");
        }
        Ok(())
    }

    /// Products of one category, or all products when `category` is `None`.
    pub fn products_in_category(&self, category: Option<&str>) -> Result<Vec<Product>, CatalogError> {
        let products: Vec<Product> = self.store.load()?;
        Ok(match category {
            Some(name) => products
                .into_iter()
                .filter(|p| p.category == name.trim())
                .collect(),
            None => products,
        })
    }

    /// A project's quotes in entry order, joined to their products.
    pub fn project_quotes(&self, project_id: ProjectId) -> Result<ProjectQuotes, CatalogError> {
        let snapshot = self.snapshot()?;
        let project = snapshot
            .project(project_id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownProject(project_id.to_string()))?;

        let mut lines = Vec::new();
        let mut unresolved = 0;
        for quote in snapshot.quotes.iter().filter(|q| q.project_id == project_id) {
            let Some(product) = snapshot.product(quote.product_id) else {
                unresolved += 1;
                continue;
            };
            lines.push(QuoteLine {
                product_id: product.id,
                product_name: product.name.clone(),
                spec: product.spec.clone(),
                unit: product.unit.clone(),
                price: quote.price,
                limit_price: product.limit_price,
                over_limit: product.is_over_limit(quote.price),
            });
        }
        if unresolved > 0 {
            warn!(project = %project_id, unresolved, "skipped quotes for missing products");
        }
        Ok(ProjectQuotes {
            project,
            lines,
            unresolved,
        })
    }
}

fn validate_name(name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    Ok(name.to_string())
}

/// Round to cents, then enforce the minimum.
fn validate_price(price: Decimal) -> Result<Decimal, CatalogError> {
    let mut price = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    price.rescale(2);
    if price < MIN_PRICE {
        return Err(CatalogError::PriceTooLow(price));
    }
    Ok(price)
}

/// With no categories defined, the category is free text.
fn check_category(categories: &[Category], name: &str) -> Result<(), CatalogError> {
    let name = name.trim();
    if categories.is_empty() || categories.iter().any(|c| c.name == name) {
        return Ok(());
    }
    Err(CatalogError::UnknownCategory(name.to_string()))
}
