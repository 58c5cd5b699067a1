use crate::store::data::max_key;
use crate::store::error::StoreError;
use crate::store::ids::{SEQUENCES_FILE, Sequences};
use crate::store::{Keyed, Record, Snapshot, Table};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

/// Whole-table access to persisted records.
///
/// Callers read a fresh copy and hand back a full replacement; nothing is
/// shared or updated in place.
pub trait RecordStore {
    fn load<R: Record>(&self) -> Result<Vec<R>, StoreError>;

    fn replace<R: Record>(&self, rows: &[R]) -> Result<(), StoreError>;

    /// Allocate a fresh id for a keyed table, given its current rows.
    fn next_id<R: Keyed>(&self, rows: &[R]) -> Result<i64, StoreError>;

    fn load_snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            projects: self.load()?,
            products: self.load()?,
            categories: self.load()?,
            quotes: self.load()?,
        })
    }
}

/// One CSV file per table inside a data directory.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    pub(crate) root: PathBuf,
}

impl CsvRecordStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    /// Table files are not created here; see [`CsvRecordStore::init`].
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            error!(?e, "Failed to create data directory: {:?}", root);
            StoreError::CreateDir {
                path: root.clone(),
                source: e,
            }
        })?;
        Ok(Self { root })
    }

    pub fn table_path(&self, table: Table) -> PathBuf {
        self.root.join(table.file_name())
    }

    /// Write header-only files for every table that does not exist yet.
    /// Returns the tables that were created.
    pub fn init(&self) -> Result<Vec<Table>, StoreError> {
        let mut created = Vec::new();
        for table in Table::ALL {
            let path = self.table_path(table);
            if path.exists() {
                continue;
            }
            self.write_table::<()>(table, &[])?;
            info!(%table, path = %path.display(), "created empty table");
            created.push(table);
        }
        Ok(created)
    }

    fn write_table<R: serde::Serialize>(&self, table: Table, rows: &[R]) -> Result<(), StoreError> {
        let path = self.table_path(table);
        let encode_err = |e: csv::Error| StoreError::Encode {
            path: path.clone(),
            source: e,
        };

        self.write_atomic(&path, |file| {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            wtr.write_record(table.headers()).map_err(encode_err)?;
            for row in rows {
                wtr.serialize(row).map_err(encode_err)?;
            }
            wtr.flush().map_err(|e| StoreError::Write {
                path: path.clone(),
                source: e,
            })
        })
    }

    /// Write into a temp file in the data directory, then rename it over
    /// `path`. A failed write never leaves a truncated file behind.
    fn write_atomic(
        &self,
        path: &Path,
        fill: impl FnOnce(&mut File) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let write_err = |e: std::io::Error| StoreError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(write_err)?;
        fill(tmp.as_file_mut())?;
        tmp.as_file_mut().flush().map_err(write_err)?;
        tmp.persist(path).map_err(|e| {
            error!(error = ?e.error, "Failed to persist file: {:?}", path);
            write_err(e.error)
        })?;
        Ok(())
    }

    fn sequences_path(&self) -> PathBuf {
        self.root.join(SEQUENCES_FILE)
    }

    fn load_sequences(&self) -> Result<Sequences, StoreError> {
        let path = self.sequences_path();
        if !path.exists() {
            return Ok(Sequences::default());
        }
        let s = fs::read_to_string(&path).map_err(|e| StoreError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&s).map_err(|e| StoreError::Sequence { path, source: e })
    }

    fn save_sequences(&self, seq: &Sequences) -> Result<(), StoreError> {
        let path = self.sequences_path();
        let json = serde_json::to_string_pretty(seq).map_err(|e| StoreError::Sequence {
            path: path.clone(),
            source: e,
        })?;
        self.write_atomic(&path, |file| {
            file.write_all(json.as_bytes())
                .map_err(|e| StoreError::Write {
                    path: path.clone(),
                    source: e,
                })
        })
    }
}

impl RecordStore for CsvRecordStore {
    fn load<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let path = self.table_path(R::TABLE);
        if !path.exists() {
            return Err(StoreError::Missing(path));
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| StoreError::Read {
                path: path.clone(),
                source: e,
            })?;

        let mut rows = Vec::new();
        for (idx, record) in rdr.deserialize::<R>().enumerate() {
            let row = record.map_err(|e| StoreError::Parse {
                path: path.clone(),
                row: idx + 1,
                source: e,
            })?;
            rows.push(row);
        }
        debug!(table = %R::TABLE, rows = rows.len(), "loaded table");
        Ok(rows)
    }

    fn replace<R: Record>(&self, rows: &[R]) -> Result<(), StoreError> {
        self.write_table(R::TABLE, rows)?;
        info!(table = %R::TABLE, rows = rows.len(), "replaced table");
        Ok(())
    }

    fn next_id<R: Keyed>(&self, rows: &[R]) -> Result<i64, StoreError> {
        let mut seq = self.load_sequences()?;
        let id = seq
            .allocate(R::TABLE, max_key(rows))
            .ok_or(StoreError::Unkeyed(R::TABLE))?;
        self.save_sequences(&seq)?;
        debug!(table = %R::TABLE, id, "allocated id");
        Ok(id)
    }
}
