use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(ProjectId);
entity_id!(ProductId);
entity_id!(CategoryId);

/// The four tables of the store, one CSV file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Projects,
    Products,
    Categories,
    Quotes,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Projects,
        Table::Products,
        Table::Categories,
        Table::Quotes,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Table::Projects => "projects.csv",
            Table::Products => "products.csv",
            Table::Categories => "categories.csv",
            Table::Quotes => "quotes.csv",
        }
    }

    /// Column order as written to disk. Must match the field order of the row type.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Table::Projects => &["project_id", "name", "inquiry_date", "created_on"],
            Table::Products => &[
                "product_id",
                "name",
                "spec",
                "unit",
                "limit_price",
                "category",
            ],
            Table::Categories => &["category_id", "name"],
            Table::Quotes => &["project_id", "product_id", "price"],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Projects => "projects",
            Table::Products => "products",
            Table::Categories => "categories",
            Table::Quotes => "quotes",
        };
        f.write_str(name)
    }
}

/// A row type stored in one of the tables.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const TABLE: Table;
}

/// A row type with its own integer identifier.
pub trait Keyed: Record {
    fn key(&self) -> i64;
}

// Aliases accept the column captions of data files written by the earlier
// spreadsheet-backed tool.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "project_id", alias = "项目ID")]
    pub id: ProjectId,
    #[serde(alias = "项目名称")]
    pub name: String,
    #[serde(alias = "询价日期")]
    pub inquiry_date: NaiveDate,
    #[serde(alias = "创建日期")]
    pub created_on: NaiveDate,
}

impl Record for Project {
    const TABLE: Table = Table::Projects;
}

impl Keyed for Project {
    fn key(&self) -> i64 {
        self.id.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "product_id", alias = "商品ID")]
    pub id: ProductId,
    #[serde(alias = "品名")]
    pub name: String,
    #[serde(default, alias = "规格")]
    pub spec: String,
    #[serde(default, alias = "单位")]
    pub unit: String,
    #[serde(with = "rust_decimal::serde::str", alias = "限价")]
    pub limit_price: Decimal,
    #[serde(default, alias = "类别")]
    pub category: String,
}

impl Product {
    /// Presentation rule: a quote is flagged when it exceeds the product's ceiling.
    pub fn is_over_limit(&self, price: Decimal) -> bool {
        price > self.limit_price
    }
}

impl Record for Product {
    const TABLE: Table = Table::Products;
}

impl Keyed for Product {
    fn key(&self) -> i64 {
        self.id.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category_id", alias = "类别ID")]
    pub id: CategoryId,
    #[serde(alias = "类别名称")]
    pub name: String,
}

impl Record for Category {
    const TABLE: Table = Table::Categories;
}

impl Keyed for Category {
    fn key(&self) -> i64 {
        self.id.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(alias = "项目ID")]
    pub project_id: ProjectId,
    #[serde(alias = "商品ID")]
    pub product_id: ProductId,
    #[serde(with = "rust_decimal::serde::str", alias = "价格")]
    pub price: Decimal,
}

impl Record for Quote {
    const TABLE: Table = Table::Quotes;
}

/// A full in-memory copy of every table, taken at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    /// Insertion order is significant.
    pub quotes: Vec<Quote>,
}

impl Snapshot {
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Largest id present in a keyed table, if any.
pub fn max_key<R: Keyed>(rows: &[R]) -> Option<i64> {
    rows.iter().map(Keyed::key).max()
}
