pub mod csv_store;
pub mod data;
pub mod error;
pub mod ids;

pub use csv_store::{CsvRecordStore, RecordStore};
pub use data::{
    Category, CategoryId, Keyed, Product, ProductId, Project, ProjectId, Quote, Record, Snapshot,
    Table,
};
pub use error::StoreError;
