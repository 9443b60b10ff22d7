use std::path::Path;

use rusqlite::Connection;

mod error;
mod identity;
mod ledger;
mod migrations;
mod snapshots;
mod tokens;
mod types;

pub use error::{DbError, Result};
pub use types::{
    DateFilter, DeviceTokenRow, LinkingCodeRow, MemberSum, Metric, OrgRow, UserRow,
};

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }
}
