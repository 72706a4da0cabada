//! # Stock Snapshot
//!
//! The last-fetched, locally held view of item and variant availability.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Snapshot Lifecycle                                   │
//! │                                                                         │
//! │  Catalog fetch ──► StockSnapshot::new(items) ──► Arc<StockSnapshot>     │
//! │                           │                          │                  │
//! │                   validate everything         read by cart checks       │
//! │                                                      │                  │
//! │  Sale committed / reload ──► fetch again ──► swap the whole Arc         │
//! │                                                                         │
//! │  NEVER patched in place: readers always see one consistent fetch.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshot is optimistic. It stops a single terminal from overselling
//! what it knows about; the backend still has the final word at commit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{InventoryItem, LineKey};
use crate::validation::validate_item;

/// Result of resolving a scanned code against the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum ScanOutcome {
    Found(InventoryItem),
    NotFound(String),
}

/// A sellable identity at or below its reorder threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LowStockEntry {
    pub key: LineKey,
    pub name: String,
    pub quantity: i64,
    pub reorder_level: i64,
}

/// Immutable view of one catalog fetch.
#[derive(Debug, Clone)]
pub struct StockSnapshot {
    items: Vec<InventoryItem>,
    index: HashMap<String, usize>,
    fetched_at: DateTime<Utc>,
}

impl StockSnapshot {
    /// Builds a snapshot from a catalog fetch.
    ///
    /// ## Errors
    /// The whole catalog is rejected if any item is malformed or two items
    /// share an id. A half-built snapshot would let the cart check against
    /// stock that was never really fetched.
    pub fn new(items: Vec<InventoryItem>) -> CoreResult<Self> {
        let mut index = HashMap::with_capacity(items.len());

        for (pos, item) in items.iter().enumerate() {
            validate_item(item)?;
            if index.insert(item.id.clone(), pos).is_some() {
                return Err(ValidationError::Duplicate {
                    field: "item id".to_string(),
                    value: item.id.clone(),
                }
                .into());
            }
        }

        Ok(StockSnapshot {
            items,
            index,
            fetched_at: Utc::now(),
        })
    }

    /// An empty snapshot, used before the first fetch completes.
    pub fn empty() -> Self {
        StockSnapshot {
            items: Vec::new(),
            index: HashMap::new(),
            fetched_at: Utc::now(),
        }
    }

    /// When this snapshot was built.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// All items in catalog order.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up an item by id.
    pub fn item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.index.get(item_id).map(|&pos| &self.items[pos])
    }

    /// Quantity on hand for a sellable identity.
    ///
    /// ## Returns
    /// - Variant key: that variant's quantity
    /// - Base key on a plain item: the item's quantity
    /// - Base key on an item with variants: `None` (not sellable)
    /// - Unknown item or variant: `None`
    pub fn available(&self, key: &LineKey) -> Option<i64> {
        let item = self.item(&key.item_id)?;
        match &key.variant_id {
            Some(variant_id) => item.variant(variant_id).map(|v| v.quantity),
            None if item.has_variants() => None,
            None => Some(item.quantity),
        }
    }

    /// Current unit price for a sellable identity, same rules as [`available`].
    ///
    /// [`available`]: StockSnapshot::available
    pub fn price(&self, key: &LineKey) -> Option<Money> {
        let item = self.item(&key.item_id)?;
        match &key.variant_id {
            Some(variant_id) => item.variant(variant_id).map(|v| v.price()),
            None if item.has_variants() => None,
            None => Some(item.price()),
        }
    }

    /// Resolves a scanned barcode to an item.
    ///
    /// Whitespace around the code is ignored; matching is exact.
    pub fn resolve_barcode(&self, code: &str) -> ScanOutcome {
        let code = code.trim();
        if code.is_empty() {
            return ScanOutcome::NotFound(String::new());
        }

        self.items
            .iter()
            .find(|item| item.barcode.as_deref().map(str::trim) == Some(code))
            .cloned()
            .map(ScanOutcome::Found)
            .unwrap_or_else(|| ScanOutcome::NotFound(code.to_string()))
    }

    /// Sellable identities whose stock is at or below the reorder level.
    pub fn low_stock(&self) -> Vec<LowStockEntry> {
        let mut entries = Vec::new();

        for item in &self.items {
            if item.has_variants() {
                for v in item.variants.iter().filter(|v| v.quantity <= v.reorder_level) {
                    entries.push(LowStockEntry {
                        key: LineKey::variant(&item.id, &v.id),
                        name: format!("{} ({})", item.name, v.label),
                        quantity: v.quantity,
                        reorder_level: v.reorder_level,
                    });
                }
            } else if item.quantity <= item.reorder_level {
                entries.push(LowStockEntry {
                    key: LineKey::item(&item.id),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    reorder_level: item.reorder_level,
                });
            }
        }

        entries
    }
}

impl Default for StockSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
