//! The session state: catalog, record store and staged entries, plus whether price edits have been
//! unlocked. Every command handler gets one of these explicitly; there is no global state.

use crate::auth::{AuthError, Authorizer};
use crate::error::Res;
use crate::files::JsonFile;
use crate::model::{
    Amount, BulkEntries, BulkSummary, NewSale, PriceCatalog, RecordStore, SaleRecord,
    ValidationError,
};
use crate::Config;
use anyhow::Context;
use tracing::{debug, info, warn};

pub struct AppState {
    catalog: JsonFile<PriceCatalog>,
    records: JsonFile<RecordStore>,
    staged: JsonFile<BulkEntries>,
    authorizer: Box<dyn Authorizer>,
    authenticated: bool,
}

impl AppState {
    /// Loads the data files named by `config`. A missing catalog falls back to the house menu and
    /// missing record or stage files start empty.
    pub async fn load(config: &Config) -> Res<Self> {
        let catalog = JsonFile::load_or_else(config.catalog_path(), PriceCatalog::house_menu)
            .await
            .context("Unable to load the price catalog")?;
        let records = JsonFile::load_or_else(config.records_path(), RecordStore::new)
            .await
            .context("Unable to load the sales records")?;
        let staged = JsonFile::load_or_else(config.staged_path(), BulkEntries::new)
            .await
            .context("Unable to load the staged entries")?;
        debug!(
            "Loaded {} catalog items, {} records and {} staged entries",
            catalog.data().len(),
            records.data().len(),
            staged.data().len()
        );
        Ok(Self {
            catalog,
            records,
            staged,
            authorizer: Box::new(config.authorizer()),
            authenticated: false,
        })
    }

    pub fn catalog(&self) -> &PriceCatalog {
        self.catalog.data()
    }

    pub fn records(&self) -> &RecordStore {
        self.records.data()
    }

    pub fn staged(&self) -> &BulkEntries {
        self.staged.data()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Unlocks catalog edits for the rest of the session. A wrong credential leaves the session
    /// locked; there is no limit on attempts.
    pub fn authenticate(&mut self, credential: &str) -> Result<(), AuthError> {
        match self.authorizer.authorize(credential) {
            Ok(()) => {
                self.authenticated = true;
                info!("Price editing unlocked");
                Ok(())
            }
            Err(e) => {
                warn!("Rejected an attempt to unlock price editing");
                Err(e)
            }
        }
    }

    /// Adds or changes the price of `item` in `category`. Requires an authenticated session.
    pub fn set_price(&mut self, category: &str, item: &str, price: Amount) -> Res<Option<Amount>> {
        self.require_auth()?;
        Ok(self.catalog.data_mut().set_price(category, item, price)?)
    }

    /// Removes `item` from `category`. Requires an authenticated session. Records that already
    /// reference the item are unaffected.
    pub fn remove_item(&mut self, category: &str, item: &str) -> Res<Amount> {
        self.require_auth()?;
        Ok(self.catalog.data_mut().remove_item(category, item)?)
    }

    /// Validates `sale` and appends it to the record store straight away.
    pub fn record(&mut self, sale: NewSale) -> Result<&SaleRecord, ValidationError> {
        let record = sale.validate(self.catalog.data())?;
        let store = self.records.data_mut();
        store.push(record);
        Ok(&store.records()[store.len() - 1])
    }

    /// Validates `sale` and adds it to the staged entries. Nothing is added on failure.
    pub fn stage(&mut self, sale: NewSale) -> Result<&SaleRecord, ValidationError> {
        let record = sale.validate(self.catalog.data())?;
        let staged = self.staged.data_mut();
        staged.push(record);
        Ok(&staged.entries()[staged.len() - 1])
    }

    /// Moves every staged entry into the record store and returns a summary of what moved.
    pub fn commit_staged(&mut self) -> BulkSummary {
        let summary = self.staged.data().summary();
        let entries = self.staged.data_mut().take();
        self.records.data_mut().extend(entries);
        summary
    }

    /// Drops the staged entries without recording them.
    pub fn discard_staged(&mut self) -> usize {
        self.staged.data_mut().take().len()
    }

    /// Removes every record, returning how many there were.
    pub fn clear_records(&mut self) -> usize {
        self.records.data_mut().clear()
    }

    /// Swaps in a new record store and returns the old one.
    pub fn replace_records(&mut self, records: RecordStore) -> RecordStore {
        std::mem::replace(self.records.data_mut(), records)
    }

    /// Swaps in a new catalog and returns the old one.
    pub fn replace_catalog(&mut self, catalog: PriceCatalog) -> PriceCatalog {
        std::mem::replace(self.catalog.data_mut(), catalog)
    }

    pub async fn save_catalog(&self) -> Res<()> {
        self.catalog.save().await.with_context(|| {
            format!("Unable to save the catalog to {}", self.catalog.path().display())
        })
    }

    pub async fn save_records(&self) -> Res<()> {
        self.records.save().await.with_context(|| {
            format!("Unable to save the records to {}", self.records.path().display())
        })
    }

    pub async fn save_staged(&self) -> Res<()> {
        self.staged.save().await.with_context(|| {
            format!(
                "Unable to save the staged entries to {}",
                self.staged.path().display()
            )
        })
    }

    fn require_auth(&self) -> Result<(), AuthError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(AuthError)
        }
    }
}
