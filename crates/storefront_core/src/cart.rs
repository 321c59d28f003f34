//! crates/storefront_core/src/cart.rs
//!
//! The shopper's cart: an explicit store object with a small mutation API,
//! persisted through a pluggable `CartStorage` after every change.
//!
//! Persistence is best-effort. A stored value that does not parse, or that
//! breaks the cart's invariants, is discarded and the cart starts out empty.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::{checked_sum, Amount, CartEntry, Product};
use crate::ports::CartStorage;

/// The single key the cart is stored under.
pub const CART_STORAGE_KEY: &str = "cart";

//=========================================================================================
// The Cart Store
//=========================================================================================

/// Holds at most one entry per product, each with a quantity of at least one,
/// and a subtotal that fits in an `Amount`.
pub struct CartStore<S: CartStorage> {
    storage: S,
    entries: Vec<CartEntry>,
    count_tx: watch::Sender<usize>,
}

impl<S: CartStorage> CartStore<S> {
    /// Opens the cart held in `storage`.
    pub fn open(mut storage: S) -> Self {
        let entries = match storage.load() {
            None => Vec::new(),
            Some(raw) => match parse_entries(&raw) {
                Ok(entries) => entries,
                Err(reason) => {
                    warn!("Discarding unreadable stored cart: {}", reason);
                    storage.discard();
                    Vec::new()
                }
            },
        };

        let (count_tx, _) = watch::channel(item_count(&entries));
        Self {
            storage,
            entries,
            count_tx,
        }
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of units in the cart (quantities summed, not distinct entries).
    pub fn item_count(&self) -> usize {
        item_count(&self.entries)
    }

    /// Sum of unit price times quantity; zero for an empty cart.
    pub fn subtotal(&self) -> Amount {
        subtotal(&self.entries).unwrap_or(Amount::MAX)
    }

    /// Watches the item count. Every mutation publishes the new count.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }

    /// Adds one unit of `product`, creating its entry if needed.
    ///
    /// Returns `false`, leaving the cart unchanged, if the extra unit would
    /// push the subtotal past what an `Amount` can hold.
    pub fn add_item(&mut self, product: &Product) -> bool {
        if product.unit_price < 0 {
            warn!("Refusing product {} with a negative price", product.id);
            return false;
        }
        self.apply(|entries| {
            match entries.iter_mut().find(|entry| entry.product_id == product.id) {
                Some(entry) => match entry.quantity.checked_add(1) {
                    Some(quantity) => entry.quantity = quantity,
                    None => return false,
                },
                None => entries.push(CartEntry::from_product(product)),
            }
            true
        })
    }

    /// Changes an entry's quantity by `delta`.
    ///
    /// A change that would leave the quantity below one is refused and returns
    /// `false`; taking a product out of the cart goes through `remove_item`.
    pub fn update_quantity(&mut self, product_id: &str, delta: i64) -> bool {
        self.apply(|entries| {
            let Some(entry) = entries
                .iter_mut()
                .find(|entry| entry.product_id == product_id)
            else {
                return false;
            };
            let next = i64::from(entry.quantity).saturating_add(delta);
            match u32::try_from(next) {
                Ok(next) if next >= 1 => {
                    entry.quantity = next;
                    true
                }
                _ => false,
            }
        })
    }

    /// Deletes an entry outright. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.product_id != product_id);
        let removed = self.entries.len() != before;
        if removed {
            self.commit();
        }
        removed
    }

    /// Empties the cart, as after a successful order.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.commit();
    }

    /// Runs `change` on a copy of the entries and keeps the result only if the
    /// change applied and the subtotal still fits.
    fn apply(&mut self, change: impl FnOnce(&mut Vec<CartEntry>) -> bool) -> bool {
        let mut next = self.entries.clone();
        if !change(&mut next) {
            return false;
        }
        if subtotal(&next).is_none() {
            warn!("Refusing a cart change that would overflow the subtotal");
            return false;
        }
        self.entries = next;
        self.commit();
        true
    }

    fn commit(&mut self) {
        match serde_json::to_string(&self.entries) {
            Ok(raw) => self.storage.save(&raw),
            Err(e) => warn!("Failed to serialize cart: {}", e),
        }
        self.count_tx.send_replace(item_count(&self.entries));
    }
}

fn subtotal(entries: &[CartEntry]) -> Option<Amount> {
    checked_sum(entries.iter().map(CartEntry::line_total))
}

fn item_count(entries: &[CartEntry]) -> usize {
    entries.iter().map(|entry| entry.quantity as usize).sum()
}

fn parse_entries(raw: &str) -> Result<Vec<CartEntry>, String> {
    let entries: Vec<CartEntry> = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    let mut seen = HashSet::new();
    for entry in &entries {
        if entry.quantity < 1 {
            return Err(format!("entry {} has a zero quantity", entry.product_id));
        }
        if entry.unit_price < 0 {
            return Err(format!("entry {} has a negative price", entry.product_id));
        }
        if !seen.insert(entry.product_id.as_str()) {
            return Err(format!("product {} appears twice", entry.product_id));
        }
    }
    if subtotal(&entries).is_none() {
        return Err("the subtotal does not fit in an amount".to_string());
    }
    Ok(entries)
}

//=========================================================================================
// Storage Adapters
//=========================================================================================

/// Keeps the serialized cart in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    value: Option<String>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an existing stored value, as a returning shopper would.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Option<String> {
        self.value.clone()
    }

    fn save(&mut self, value: &str) {
        self.value = Some(value.to_string());
    }

    fn discard(&mut self) {
        self.value = None;
    }
}

/// Keeps the serialized cart in a single JSON file named after the storage key.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    /// Stores the cart as `<dir>/cart.json`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(format!("{CART_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(e) => {
                debug!("No stored cart at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&mut self, value: &str) {
        if let Err(e) = std::fs::write(&self.path, value) {
            warn!("Failed to persist cart to {}: {}", self.path.display(), e);
        }
    }

    fn discard(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Nothing to discard at {}: {}", self.path.display(), e);
        }
    }
}
