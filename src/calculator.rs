// 🧮 Calculator - the surface the front end talks to
// Owns the reference table, the store and the session being edited.
//
// Every mutating call returns what changed so the caller knows when to redraw.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::Result;
use crate::ice_db::IceDb;
use crate::session::{Bucket, LineItem, Session};
use crate::store::SessionStore;
use crate::totals::Totals;

pub struct Calculator {
    db: IceDb,
    store: SessionStore,
    session: Session,
}

impl Calculator {
    pub fn new(db: IceDb, store: SessionStore) -> Self {
        Calculator {
            db,
            store,
            session: Session::default(),
        }
    }

    /// Load the reference table and open the save folder named in `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let db = Self::load_ice_db(&config.ice_db_path)?;
        let store = SessionStore::open(&config.save_folder)?;
        Ok(Self::new(db, store))
    }

    pub fn load_ice_db(path: &Path) -> anyhow::Result<IceDb> {
        IceDb::load(path)
    }

    pub fn db(&self) -> &IceDb {
        &self.db
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn add_item(
        &mut self,
        bucket: Bucket,
        reference_name: &str,
        quantity: f64,
    ) -> Result<&LineItem> {
        self.session.add_line(&self.db, bucket, reference_name, quantity)
    }

    pub fn delete_item(&mut self, bucket: Bucket, index: usize) -> Result<LineItem> {
        self.session.delete_line(bucket, index)
    }

    pub fn update_totals(&self) -> Totals {
        self.session.totals()
    }

    /// Name the session and write it to the store.
    ///
    /// The live session only takes the new name and description once the
    /// write succeeded; any failure leaves it untouched.
    pub fn save_calculation(&mut self, name: &str, description: &str) -> Result<PathBuf> {
        let renamed = Session {
            name: name.to_string(),
            description: description.to_string(),
            ..self.session.clone()
        };

        let path = self.store.save(&renamed)?;
        self.session = renamed;
        Ok(path)
    }

    /// Replace the whole session with the one saved under `key`.
    pub fn load_calculation(&mut self, key: &str) -> Result<&Session> {
        self.session = self.store.load(key)?;
        Ok(&self.session)
    }

    pub fn saved_calculations(&self) -> Result<Vec<String>> {
        self.store.list()
    }
}
