use crate::store::Table;
use serde::{Deserialize, Serialize};

pub const SEQUENCES_FILE: &str = "sequences.json";

/// Last id issued per keyed table.
///
/// Kept apart from the table contents so that deleting the highest row never
/// makes its id available again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    #[serde(default)]
    pub projects: i64,
    #[serde(default)]
    pub products: i64,
    #[serde(default)]
    pub categories: i64,
}

impl Sequences {
    fn slot_mut(&mut self, table: Table) -> Option<&mut i64> {
        match table {
            Table::Projects => Some(&mut self.projects),
            Table::Products => Some(&mut self.products),
            Table::Categories => Some(&mut self.categories),
            Table::Quotes => None,
        }
    }

    /// Issue the next id for `table`.
    ///
    /// Stores that predate the sequence file start from their current maximum,
    /// so the result is always above both the counter and every existing row.
    pub fn allocate(&mut self, table: Table, existing_max: Option<i64>) -> Option<i64> {
        let slot = self.slot_mut(table)?;
        let next = (*slot).max(existing_max.unwrap_or(0)) + 1;
        *slot = next;
        Some(next)
    }
}
