//! # Cart Manager
//!
//! Owns the cart lines of one terminal session and keeps them consistent
//! with the stock snapshot.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  CartCommand               Cart method            Line change           │
//! │  ───────────               ───────────            ───────────           │
//! │                                                                         │
//! │  AddItem ───────────────► add_item() ──────────► new line (qty 1)      │
//! │     │                          │                  or existing += 1      │
//! │     └─ item has variants,      └──────────────► NeedsVariantChoice     │
//! │        none chosen                                (no mutation)         │
//! │                                                                         │
//! │  Increment(+n / -n) ────► increment() ─────────► qty set, or removed   │
//! │                                                   when it reaches 0     │
//! │                                                                         │
//! │  Remove ────────────────► remove() ────────────► line gone (idempotent)│
//! │                                                                         │
//! │  Clear ─────────────────► clear() ─────────────► all lines gone        │
//! │                                                                         │
//! │  NOTE: Any rejected command leaves the cart exactly as it was.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by [`LineKey`]
//! - Every line has quantity >= 1
//! - A positive change never takes a line above the snapshot quantity
//! - `total() == Σ unit_price × quantity`, computed on every read
//! - The total never exceeds `MAX_AMOUNT_PAISE`; a change that would push
//!   it past is rejected

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::out_of_range;
use crate::stock::StockSnapshot;
use crate::types::{InventoryItem, LineKey};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the cart.
///
/// ## Design Notes
/// `unit_price_paise` is frozen when the line is created. A price edit in a
/// later catalog fetch does not touch a cart that is already being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub item_id: String,

    /// Set when the line is a variant of `item_id`.
    pub variant_id: Option<String>,

    /// Item name, plus the variant label when present (frozen).
    pub name: String,

    /// Price in paise at time of adding (frozen).
    pub unit_price_paise: i64,

    /// Always >= 1.
    pub quantity: i64,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn new(key: LineKey, name: String, unit_price: Money) -> Self {
        CartLine {
            item_id: key.item_id,
            variant_id: key.variant_id,
            name,
            unit_price_paise: unit_price.paise(),
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    /// The identity of this line.
    pub fn key(&self) -> LineKey {
        LineKey {
            item_id: self.item_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.item_id == key.item_id && self.variant_id == key.variant_id
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paise(self.unit_price_paise)
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Outcomes & Commands
// =============================================================================

/// What an add did.
///
/// `NeedsVariantChoice` is an expected, common result: the caller should ask
/// the operator which variant to sell and add again with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum AddOutcome {
    /// A new line was created with quantity 1.
    Added { key: LineKey },
    /// An existing line went up by one.
    Incremented { key: LineKey, quantity: i64 },
    /// Item has variants and none was chosen. Cart untouched.
    NeedsVariantChoice { item: InventoryItem },
}

/// What a quantity change did to its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "change", content = "quantity", rename_all = "snake_case")]
#[ts(export)]
pub enum LineChange {
    /// Delta was zero.
    Unchanged,
    /// Line now holds this quantity.
    Quantity(i64),
    /// Quantity reached zero and the line was deleted.
    Removed,
}

/// A cart mutation, as issued by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum CartCommand {
    AddItem {
        item_id: String,
        variant_id: Option<String>,
    },
    Increment {
        key: LineKey,
        delta: i64,
    },
    Remove {
        key: LineKey,
    },
    Clear,
}

/// Result of [`Cart::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Add(AddOutcome),
    Line(LineChange),
    Removed(bool),
    Cleared,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,

    /// When the cart was created or last cleared.
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Runs one command against the cart.
    ///
    /// ## Errors
    /// `ItemNotFound` when an add names an item the snapshot does not hold;
    /// otherwise whatever the underlying operation returns.
    pub fn apply(
        &mut self,
        command: CartCommand,
        snapshot: &StockSnapshot,
    ) -> CoreResult<CommandOutcome> {
        match command {
            CartCommand::AddItem { item_id, variant_id } => {
                let item = snapshot
                    .item(&item_id)
                    .ok_or(CoreError::ItemNotFound(item_id.clone()))?;
                self.add_item(item, variant_id.as_deref(), snapshot)
                    .map(CommandOutcome::Add)
            }
            CartCommand::Increment { key, delta } => self
                .increment(&key, delta, snapshot)
                .map(CommandOutcome::Line),
            CartCommand::Remove { key } => Ok(CommandOutcome::Removed(self.remove(&key))),
            CartCommand::Clear => {
                self.clear();
                Ok(CommandOutcome::Cleared)
            }
        }
    }

    /// Adds one unit of an item (or one of its variants).
    ///
    /// ## Behavior
    /// - Item has variants, none supplied: `NeedsVariantChoice`, no mutation
    /// - Variant supplied that the item does not own: `VariantNotFound`
    /// - Line already present: same as `increment(key, 1)`
    /// - Otherwise: new line with quantity 1, price captured now
    ///
    /// ## Errors
    /// `StockLimitExceeded` when the snapshot holds no unit to put in the
    /// cart (a new line is quantity 1, so it is bounded too).
    pub fn add_item(
        &mut self,
        item: &InventoryItem,
        variant_id: Option<&str>,
        snapshot: &StockSnapshot,
    ) -> CoreResult<AddOutcome> {
        let (key, name) = match variant_id {
            None if item.has_variants() => {
                return Ok(AddOutcome::NeedsVariantChoice { item: item.clone() });
            }
            None => (LineKey::item(&item.id), item.name.clone()),
            Some(variant_id) => {
                let variant = item.variant(variant_id).ok_or_else(|| CoreError::VariantNotFound {
                    item_id: item.id.clone(),
                    variant_id: variant_id.to_string(),
                })?;
                (
                    LineKey::variant(&item.id, &variant.id),
                    format!("{} ({})", item.name, variant.label),
                )
            }
        };

        if self.line(&key).is_some() {
            return match self.increment(&key, 1, snapshot)? {
                LineChange::Quantity(quantity) => Ok(AddOutcome::Incremented { key, quantity }),
                // +1 on an existing line can only land on a quantity
                LineChange::Unchanged | LineChange::Removed => {
                    Err(CoreError::LineNotFound(key.to_string()))
                }
            };
        }

        let available = snapshot.available(&key).unwrap_or(0);
        if available < 1 {
            return Err(CoreError::StockLimitExceeded {
                name,
                available,
                requested: 1,
            });
        }

        // Price comes from the snapshot the stock check used.
        let unit_price = snapshot
            .price(&key)
            .ok_or_else(|| CoreError::ItemNotFound(item.id.clone()))?;
        self.check_total(&key, unit_price, 1)?;
        self.lines.push(CartLine::new(key.clone(), name, unit_price));
        Ok(AddOutcome::Added { key })
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// ## Behavior
    /// - `delta == 0`: no-op
    /// - `delta > 0` past the snapshot quantity: `StockLimitExceeded`, no
    ///   mutation (an identity the snapshot no longer knows counts as 0)
    /// - new quantity <= 0: line deleted
    /// - otherwise: quantity set
    ///
    /// Decrements are never checked against stock.
    pub fn increment(
        &mut self,
        key: &LineKey,
        delta: i64,
        snapshot: &StockSnapshot,
    ) -> CoreResult<LineChange> {
        let pos = self
            .position(key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))?;

        if delta == 0 {
            return Ok(LineChange::Unchanged);
        }

        let line = &self.lines[pos];
        let new_quantity = line.quantity.saturating_add(delta);

        if delta > 0 {
            let available = snapshot.available(key).unwrap_or(0);
            if new_quantity > available {
                return Err(CoreError::StockLimitExceeded {
                    name: line.name.clone(),
                    available,
                    requested: new_quantity,
                });
            }
            self.check_total(key, line.unit_price(), new_quantity)?;
        }

        if new_quantity <= 0 {
            self.lines.remove(pos);
            return Ok(LineChange::Removed);
        }

        self.lines[pos].quantity = new_quantity;
        Ok(LineChange::Quantity(new_quantity))
    }

    /// Rejects a change that would leave the cart total past
    /// `MAX_AMOUNT_PAISE` or overflow on the way there.
    fn check_total(&self, key: &LineKey, unit_price: Money, quantity: i64) -> CoreResult<()> {
        let total = self
            .lines
            .iter()
            .filter(|l| !l.matches(key))
            .try_fold(Money::zero(), |acc, l| {
                l.unit_price()
                    .checked_mul(l.quantity)
                    .and_then(|t| acc.checked_add(t))
            })
            .and_then(|acc| unit_price.checked_mul(quantity).and_then(|t| acc.checked_add(t)));

        match total {
            Some(total) if total.is_within_bounds() => Ok(()),
            _ => Err(out_of_range("cart total").into()),
        }
    }

    /// Deletes a line if present. Returns whether anything was removed.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(key));
        self.lines.len() != before
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Cart total, recomputed from the lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(key))
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.lines.iter().position(|l| l.matches(key))
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
