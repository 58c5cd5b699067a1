use crate::store::{ProductId, ProjectId, StoreError};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Name must not be empty")]
    EmptyName,

    #[error("Price must be at least 0.01, got {0}")]
    PriceTooLow(Decimal),

    #[error("Project not found: {0}")]
    UnknownProject(String),

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    #[error("Category not found: {0}")]
    UnknownCategory(String),

    #[error("Project {project} already has a quote for product {product}")]
    DuplicateQuote {
        project: ProjectId,
        product: ProductId,
    },
}
