//! # Cart Commands
//!
//! Cart manipulation against the current stock snapshot.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Payment  │────►│ Committed│       │
//! │  │  Cart    │     │          │     │  Dialog  │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                │             │
//! │                   add_to_cart       confirm_sale          │             │
//! │                   scan_barcode      (checkout.rs)         │             │
//! │                   update_quantity                         │             │
//! │                   remove_from_cart                        │             │
//! │                        │                                  ▼             │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command goes through [`Cart::apply`](khata_core::Cart::apply) with
//! a [`CartCommand`]; the stock ceilings live there. While a sale commit is
//! pending every edit is refused with `COMMIT_IN_PROGRESS`.

use khata_core::validation::normalize_barcode;
use khata_core::{AddOutcome, CartCommand, CommandOutcome, LineChange, LineKey, ScanOutcome};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, CartView, CatalogState, CheckoutState};

/// Response to an add or scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResponse {
    pub outcome: AddOutcome,
    pub cart: CartView,
}

/// Response to a quantity change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    pub change: LineChange,
    pub cart: CartView,
}

/// Response to a remove.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResponse {
    pub removed: bool,
    pub cart: CartView,
}

/// Whether the outcome changed anything the payment dialog depends on.
fn is_edit(outcome: &CommandOutcome) -> bool {
    !matches!(
        outcome,
        CommandOutcome::Add(AddOutcome::NeedsVariantChoice { .. })
            | CommandOutcome::Line(LineChange::Unchanged)
            | CommandOutcome::Removed(false)
    )
}

/// Runs one cart command against the current snapshot.
///
/// An edit returns any pending confirmation to Idle; a rejected command
/// leaves both the cart and the phase untouched.
fn dispatch(
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
    command: CartCommand,
) -> ApiResult<(CommandOutcome, CartView)> {
    let snapshot = catalog.snapshot();
    cart.with_session_edit(checkout, |s| {
        let outcome = s.cart.apply(command, &snapshot)?;
        if is_edit(&outcome) {
            s.phase.reset();
        }
        Ok((outcome, CartView::from(&s.cart)))
    })
}

fn unexpected(outcome: &CommandOutcome) -> ApiError {
    ApiError::internal(format!("Unexpected cart outcome: {:?}", outcome))
}

/// Gets the current cart contents.
pub fn get_cart(cart: &CartState) -> CartView {
    debug!("get_cart command");
    cart.view()
}

/// Adds one unit of an item, or of one of its variants.
///
/// ## Behavior
/// - Item already in cart: quantity increases, bounded by stock
/// - Item not in cart: new line, price frozen now
/// - Item has variants and none given: `NeedsVariantChoice`, cart untouched
///
/// ## Errors
/// `NOT_FOUND` for an unknown item or foreign variant,
/// `STOCK_LIMIT_EXCEEDED` when no unit is left to add,
/// `COMMIT_IN_PROGRESS` while a sale commit is pending.
pub fn add_to_cart(
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
    item_id: &str,
    variant_id: Option<&str>,
) -> ApiResult<AddResponse> {
    debug!(item_id, ?variant_id, "add_to_cart command");

    let command = CartCommand::AddItem {
        item_id: item_id.to_string(),
        variant_id: variant_id.map(str::to_string),
    };

    match dispatch(catalog, cart, checkout, command)? {
        (CommandOutcome::Add(outcome), cart) => Ok(AddResponse { outcome, cart }),
        (other, _) => Err(unexpected(&other)),
    }
}

/// Adds the item behind a scanned barcode.
///
/// The scanner hands over either a found item or the raw code; an unknown
/// code is reported as `NOT_FOUND` and a blank one as `VALIDATION_ERROR`.
/// A variant item comes back as `NeedsVariantChoice`, exactly as if it had
/// been picked by hand.
pub fn scan_barcode(
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
    code: &str,
) -> ApiResult<AddResponse> {
    debug!(code, "scan_barcode command");

    let code = normalize_barcode(code)?;
    match catalog.snapshot().resolve_barcode(&code) {
        ScanOutcome::Found(item) => add_to_cart(catalog, cart, checkout, &item.id, None),
        ScanOutcome::NotFound(code) => Err(ApiError::not_found("Barcode", &code)),
    }
}

/// Changes a line's quantity by `delta`.
///
/// ## Behavior
/// - `delta > 0`: bounded by the snapshot quantity
/// - Quantity reaches 0 or below: line removed
/// - `delta == 0`: no-op
pub fn update_quantity(
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
    key: LineKey,
    delta: i64,
) -> ApiResult<LineResponse> {
    debug!(key = %key, delta, "update_quantity command");

    match dispatch(catalog, cart, checkout, CartCommand::Increment { key, delta })? {
        (CommandOutcome::Line(change), cart) => Ok(LineResponse { change, cart }),
        (other, _) => Err(unexpected(&other)),
    }
}

/// Removes a line. Removing a line that is not there is not an error.
pub fn remove_from_cart(
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
    key: LineKey,
) -> ApiResult<RemoveResponse> {
    debug!(key = %key, "remove_from_cart command");

    match dispatch(catalog, cart, checkout, CartCommand::Remove { key })? {
        (CommandOutcome::Removed(removed), cart) => Ok(RemoveResponse { removed, cart }),
        (other, _) => Err(unexpected(&other)),
    }
}

/// Empties the cart. Payment inputs are kept.
pub fn clear_cart(
    catalog: &CatalogState,
    cart: &CartState,
    checkout: &CheckoutState,
) -> ApiResult<CartView> {
    debug!("clear_cart command");
    dispatch(catalog, cart, checkout, CartCommand::Clear).map(|(_, cart)| cart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use khata_core::{BlockReason, ConfirmPhase, InventoryItem, StockSnapshot, Variant};

    fn catalog() -> CatalogState {
        let catalog = CatalogState::new();
        catalog.replace_snapshot(
            StockSnapshot::new(vec![
                InventoryItem {
                    id: "soap".to_string(),
                    name: "Neem Soap".to_string(),
                    barcode: Some("8901234567890".to_string()),
                    price_paise: 4_500,
                    quantity: 2,
                    reorder_level: 1,
                    variants: vec![],
                },
                InventoryItem {
                    id: "rice".to_string(),
                    name: "Basmati".to_string(),
                    barcode: Some("8900000000001".to_string()),
                    price_paise: 0,
                    quantity: 0,
                    reorder_level: 0,
                    variants: vec![Variant {
                        id: "5kg".to_string(),
                        label: "5 kg".to_string(),
                        price_paise: 60_000,
                        quantity: 5,
                        reorder_level: 1,
                    }],
                },
            ])
            .unwrap(),
        );
        catalog
    }

    fn blocked(cart: &CartState) {
        cart.with_session_mut(|s| {
            s.phase = ConfirmPhase::Blocked {
                reason: BlockReason::Validation {
                    message: "no customer".to_string(),
                },
            }
        });
    }

    #[test]
    fn test_add_then_increment_hits_stock_ceiling() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();

        add_to_cart(&catalog, &cart, &checkout, "soap", None).unwrap();
        let response = add_to_cart(&catalog, &cart, &checkout, "soap", None).unwrap();
        assert_eq!(response.cart.total_quantity, 2);

        let soap = LineKey::item("soap");
        let err = update_quantity(&catalog, &cart, &checkout, soap, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::StockLimitExceeded);
        assert_eq!(cart.view().total_quantity, 2);
    }

    #[test]
    fn test_variant_choice_does_not_reset_phase() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        blocked(&cart);

        let response = add_to_cart(&catalog, &cart, &checkout, "rice", None).unwrap();
        assert!(matches!(response.outcome, AddOutcome::NeedsVariantChoice { .. }));
        assert!(matches!(cart.preview().phase, ConfirmPhase::Blocked { .. }));

        add_to_cart(&catalog, &cart, &checkout, "rice", Some("5kg")).unwrap();
        assert_eq!(cart.preview().phase, ConfirmPhase::Idle);
    }

    #[test]
    fn test_scan_found_and_not_found() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();

        let response = scan_barcode(&catalog, &cart, &checkout, " 8901234567890 ").unwrap();
        assert!(matches!(response.outcome, AddOutcome::Added { .. }));

        let err = scan_barcode(&catalog, &cart, &checkout, "0000").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = scan_barcode(&catalog, &cart, &checkout, "   ").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(cart.view().item_count, 1);
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        add_to_cart(&catalog, &cart, &checkout, "soap", None).unwrap();

        let soap = LineKey::item("soap");
        let response = update_quantity(&catalog, &cart, &checkout, soap, -1).unwrap();
        assert_eq!(response.change, LineChange::Removed);
        assert!(response.cart.lines.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        add_to_cart(&catalog, &cart, &checkout, "soap", None).unwrap();

        let soap = LineKey::item("soap");
        assert!(remove_from_cart(&catalog, &cart, &checkout, soap.clone()).unwrap().removed);
        assert!(!remove_from_cart(&catalog, &cart, &checkout, soap).unwrap().removed);
    }

    #[test]
    fn test_unknown_item_is_not_found() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();

        let err = add_to_cart(&catalog, &cart, &checkout, "ghee", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_clear_cart() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        add_to_cart(&catalog, &cart, &checkout, "soap", None).unwrap();

        let view = clear_cart(&catalog, &cart, &checkout).unwrap();
        assert!(view.lines.is_empty());
    }

    #[test]
    fn test_edits_refused_while_commit_pending() {
        let catalog = catalog();
        let cart = CartState::new();
        let checkout = CheckoutState::new();
        add_to_cart(&catalog, &cart, &checkout, "soap", None).unwrap();

        let permit = checkout.try_begin().unwrap();
        let refused = [
            add_to_cart(&catalog, &cart, &checkout, "soap", None).map(|_| ()),
            scan_barcode(&catalog, &cart, &checkout, "8901234567890").map(|_| ()),
            update_quantity(&catalog, &cart, &checkout, LineKey::item("soap"), -1).map(|_| ()),
            remove_from_cart(&catalog, &cart, &checkout, LineKey::item("soap")).map(|_| ()),
            clear_cart(&catalog, &cart, &checkout).map(|_| ()),
        ];
        for result in refused {
            assert_eq!(result.unwrap_err().code, ErrorCode::CommitInProgress);
        }
        assert_eq!(cart.view().total_quantity, 1);

        drop(permit);
        assert_eq!(get_cart(&cart).total_quantity, 1);
        add_to_cart(&catalog, &cart, &checkout, "soap", None).unwrap();
        assert_eq!(cart.view().total_quantity, 2);
    }
}
