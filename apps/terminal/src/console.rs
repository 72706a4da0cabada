//! # Operator Console
//!
//! A line-oriented front end over the commands layer.
//!
//! ```text
//! khata> add rice              → pick a variant: rice/1kg, rice/5kg
//! khata> add rice 5kg          → Basmati (5 kg) x1
//! khata> customer c-1
//! khata> tender 100
//! khata> confirm               → credit limit exceeded … type 'force'
//! khata> force                 → Sale s-42 committed
//! ```
//!
//! Amounts are typed in rupees (`150`, `150.5`, `150.50`) and handled in
//! paise everywhere else.

use khata_core::{AddOutcome, LineChange, LineKey, Money, PaymentMode, ValidationError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::commands::cart::{self as cart_cmd, AddResponse};
use crate::commands::checkout::{self as checkout_cmd, ConfirmResponse};
use crate::commands::{catalog as catalog_cmd, khata as khata_cmd};
use crate::error::ApiResult;
use crate::state::{CartView, ConfigState, PaymentPreview};
use crate::Session;

const PROMPT: &str = "khata> ";

const HELP: &str = "\
Commands:
  items | customers              list catalog / customers
  add <item> [variant]           add one unit
  scan <barcode>                 add by barcode
  inc <item[/variant]> [n]       increase quantity
  dec <item[/variant]> [n]       decrease quantity
  rm <item[/variant]>            remove a line
  cart | clear                   show / empty the cart
  customer <id|walk-in>          choose customer
  mode <cash|credit>             payment mode
  tender <amount>                cash handed over, in rupees
  preview                        show the settlement
  confirm | force                confirm / confirm over the credit limit
  cancel | void                  close payment dialog / abandon sale
  dues <customer> <amount>       collect dues
  history <customer>             khata history
  refresh | low                  reload catalog / low stock report
  quit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Items,
    Customers,
    Add { item_id: String, variant_id: Option<String> },
    Scan(String),
    Change { key: LineKey, delta: i64 },
    Remove(LineKey),
    Cart,
    Clear,
    Customer(String),
    Mode(PaymentMode),
    Tender(Money),
    Preview,
    Confirm,
    Force,
    Cancel,
    Void,
    Dues { customer_id: String, amount: Money },
    History(String),
    Refresh,
    Low,
    Quit,
}

// =============================================================================
// Parsing
// =============================================================================

fn required<'a>(arg: Option<&'a str>, field: &str) -> Result<&'a str, ValidationError> {
    arg.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

/// `item` or `item/variant`.
fn parse_key(raw: &str) -> LineKey {
    match raw.split_once('/') {
        Some((item, variant)) => LineKey::variant(item, variant),
        None => LineKey::item(raw),
    }
}

fn parse_count(raw: Option<&str>) -> Result<i64, ValidationError> {
    match raw {
        None => Ok(1),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ValidationError::MustBePositive {
                field: "count".to_string(),
            }),
        },
    }
}

/// Parses a non-negative rupee amount with at most two decimals.
pub fn parse_amount(field: &str, raw: &str) -> Result<Money, ValidationError> {
    let amount: Money = raw.parse().map_err(|err| match err {
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason,
        },
        ValidationError::Required { .. } => ValidationError::Required {
            field: field.to_string(),
        },
        other => other,
    })?;

    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

/// Parses one console line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, ValidationError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let extra = words.next();

    let command = match verb.to_lowercase().as_str() {
        "help" | "?" => ConsoleCommand::Help,
        "items" => ConsoleCommand::Items,
        "customers" => ConsoleCommand::Customers,
        "add" => ConsoleCommand::Add {
            item_id: required(arg, "item id")?.to_string(),
            variant_id: extra.map(str::to_string),
        },
        "scan" => ConsoleCommand::Scan(required(arg, "barcode")?.to_string()),
        "inc" => ConsoleCommand::Change {
            key: parse_key(required(arg, "item id")?),
            delta: parse_count(extra)?,
        },
        "dec" => ConsoleCommand::Change {
            key: parse_key(required(arg, "item id")?),
            delta: -parse_count(extra)?,
        },
        "rm" => ConsoleCommand::Remove(parse_key(required(arg, "item id")?)),
        "cart" => ConsoleCommand::Cart,
        "clear" => ConsoleCommand::Clear,
        "customer" => ConsoleCommand::Customer(required(arg, "customer id")?.to_string()),
        "mode" => ConsoleCommand::Mode(required(arg, "payment mode")?.parse()?),
        "tender" => {
            let raw = required(arg, "amount tendered")?;
            ConsoleCommand::Tender(parse_amount("amount tendered", raw)?)
        }
        "preview" => ConsoleCommand::Preview,
        "confirm" => ConsoleCommand::Confirm,
        "force" => ConsoleCommand::Force,
        "cancel" => ConsoleCommand::Cancel,
        "void" => ConsoleCommand::Void,
        "dues" => ConsoleCommand::Dues {
            customer_id: required(arg, "customer id")?.to_string(),
            amount: parse_amount("payment amount", required(extra, "payment amount")?)?,
        },
        "history" => ConsoleCommand::History(required(arg, "customer id")?.to_string()),
        "refresh" => ConsoleCommand::Refresh,
        "low" => ConsoleCommand::Low,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => {
            return Err(ValidationError::InvalidFormat {
                field: "command".to_string(),
                reason: format!("unknown command '{}', try 'help'", other),
            })
        }
    };

    Ok(Some(command))
}

// =============================================================================
// Rendering
// =============================================================================

fn render_cart(config: &ConfigState, cart: &CartView) -> String {
    if cart.lines.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut lines: Vec<String> = cart
        .lines
        .iter()
        .map(|line| {
            format!(
                "  {:<28} x{:<4} {:>12}   [{}]",
                line.name,
                line.quantity,
                config.format_currency(line.line_total()),
                line.key()
            )
        })
        .collect();
    lines.push(format!(
        "  {:<34} {:>12}",
        "TOTAL",
        config.format_currency(Money::from_paise(cart.total_paise))
    ));
    lines.join("\n")
}

fn render_preview(config: &ConfigState, preview: &PaymentPreview) -> String {
    let s = &preview.settlement;
    let mut lines = vec![
        format!(
            "Customer: {} (owes {})",
            preview.customer.name,
            config.format_currency(preview.customer.outstanding())
        ),
        format!("Mode: {:?}   Method: {}", preview.mode, s.method),
        format!("Total:    {}", config.format_currency(s.total)),
        format!("Tendered: {}", config.format_currency(s.tendered)),
        format!("Paid:     {}", config.format_currency(s.amount_paid)),
        format!("Credited: {}", config.format_currency(s.amount_credited)),
        format!("Change:   {}", config.format_currency(s.change_due)),
        format!("Khata after sale: {}", config.format_currency(s.resulting_outstanding)),
    ];
    if preview.customer.has_credit_limit() {
        lines.push(format!(
            "Credit limit: {}",
            config.format_currency(preview.customer.credit_limit())
        ));
    }
    lines.join("\n")
}

fn render_add(config: &ConfigState, response: &AddResponse) -> String {
    match &response.outcome {
        AddOutcome::NeedsVariantChoice { item } => {
            let choices: Vec<String> = item
                .variants
                .iter()
                .map(|v| format!("{}/{} ({}, {} left)", item.id, v.id, v.label, v.quantity))
                .collect();
            format!("Pick a variant of {}: {}", item.name, choices.join(", "))
        }
        AddOutcome::Added { .. } | AddOutcome::Incremented { .. } => {
            render_cart(config, &response.cart)
        }
    }
}

fn render_confirm(config: &ConfigState, response: &ConfirmResponse) -> String {
    let s = &response.settlement;
    let mut lines = vec![format!(
        "Sale {} committed{}",
        response.sale_id,
        response
            .receipt_number
            .as_deref()
            .map(|n| format!(" (receipt {})", n))
            .unwrap_or_default()
    )];
    lines.push(format!(
        "{}: paid {}, credited {}, change {}",
        s.method,
        config.format_currency(s.amount_paid),
        config.format_currency(s.amount_credited),
        config.format_currency(s.change_due)
    ));
    if response.over_limit {
        lines.push("Committed over the credit limit by override".to_string());
    }
    if !response.ledger_recorded {
        lines.push("WARNING: khata entry was not recorded, check the ledger".to_string());
    }
    if !response.snapshot_refreshed {
        lines.push("WARNING: stock was not refreshed, run 'refresh'".to_string());
    }
    lines.join("\n")
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs one command. `None` means the operator asked to quit.
async fn execute(session: &Session, command: ConsoleCommand) -> ApiResult<Option<String>> {
    let Session {
        backend,
        catalog,
        cart,
        checkout,
        config,
    } = session;

    let reply = match command {
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Items => catalog_cmd::list_items(catalog)
            .iter()
            .map(|item| {
                if item.has_variants() {
                    let variants: Vec<String> = item
                        .variants
                        .iter()
                        .map(|v| {
                            let price = config.format_currency(v.price());
                            format!("{} {} x{}", v.id, price, v.quantity)
                        })
                        .collect();
                    format!("  {:<12} {:<28} [{}]", item.id, item.name, variants.join(", "))
                } else {
                    format!(
                        "  {:<12} {:<28} {:>12} x{}",
                        item.id,
                        item.name,
                        config.format_currency(item.price()),
                        item.quantity
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ConsoleCommand::Customers => catalog_cmd::list_customers(catalog)
            .iter()
            .map(|c| {
                format!(
                    "  {:<12} {:<24} owes {:>12} limit {:>12}",
                    c.id,
                    c.name,
                    config.format_currency(c.outstanding()),
                    config.format_currency(c.credit_limit())
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ConsoleCommand::Add { item_id, variant_id } => {
            let response = cart_cmd::add_to_cart(
                catalog,
                cart,
                checkout,
                &item_id,
                variant_id.as_deref(),
            )?;
            render_add(config, &response)
        }
        ConsoleCommand::Scan(code) => {
            let response = cart_cmd::scan_barcode(catalog, cart, checkout, &code)?;
            render_add(config, &response)
        }
        ConsoleCommand::Change { key, delta } => {
            let response = cart_cmd::update_quantity(catalog, cart, checkout, key, delta)?;
            match response.change {
                LineChange::Removed => {
                    format!("Line removed\n{}", render_cart(config, &response.cart))
                }
                LineChange::Quantity(_) | LineChange::Unchanged => {
                    render_cart(config, &response.cart)
                }
            }
        }
        ConsoleCommand::Remove(key) => {
            let response = cart_cmd::remove_from_cart(catalog, cart, checkout, key)?;
            if response.removed {
                render_cart(config, &response.cart)
            } else {
                "Nothing to remove".to_string()
            }
        }
        ConsoleCommand::Cart => render_cart(config, &cart_cmd::get_cart(cart)),
        ConsoleCommand::Clear => {
            render_cart(config, &cart_cmd::clear_cart(catalog, cart, checkout)?)
        }
        ConsoleCommand::Customer(id) => {
            let selection = checkout_cmd::select_customer(catalog, cart, checkout, &id)?;
            let mut reply = render_preview(config, &selection.preview);
            if selection.mode_coerced {
                reply.push_str("\nWalk-in cannot buy on credit: mode set to cash");
            }
            reply
        }
        ConsoleCommand::Mode(mode) => {
            let response = checkout_cmd::select_mode(cart, checkout, mode)?;
            let mut reply = render_preview(config, &response.preview);
            if matches!(response.selection, khata_core::ModeSelection::Coerced { .. }) {
                reply.push_str("\nFull credit needs a customer: mode set to cash");
            }
            reply
        }
        ConsoleCommand::Tender(amount) => {
            render_preview(config, &checkout_cmd::set_tendered(cart, checkout, amount)?)
        }
        ConsoleCommand::Preview => render_preview(config, &checkout_cmd::preview_payment(cart)),
        ConsoleCommand::Confirm => {
            let response =
                checkout_cmd::confirm_sale(backend, catalog, cart, checkout, false).await?;
            render_confirm(config, &response)
        }
        ConsoleCommand::Force => {
            let response =
                checkout_cmd::confirm_sale(backend, catalog, cart, checkout, true).await?;
            render_confirm(config, &response)
        }
        ConsoleCommand::Cancel => {
            checkout_cmd::cancel_payment(cart, checkout)?;
            "Payment cancelled, cart kept".to_string()
        }
        ConsoleCommand::Void => {
            checkout_cmd::cancel_sale(cart, checkout)?;
            "Sale abandoned".to_string()
        }
        ConsoleCommand::Dues { customer_id, amount } => {
            let response =
                khata_cmd::collect_dues(backend, catalog, cart, &customer_id, amount).await?;
            format!(
                "Received {} from {}, now owes {}",
                config.format_currency(response.entry.amount()),
                response.customer.name,
                config.format_currency(response.customer.outstanding())
            )
        }
        ConsoleCommand::History(customer_id) => {
            let entries = khata_cmd::customer_history(backend, &customer_id).await?;
            if entries.is_empty() {
                "No khata entries".to_string()
            } else {
                entries
                    .iter()
                    .map(|e| {
                        format!(
                            "  {}  {:?}  {:>12}  balance {:>12}",
                            e.created_at.format("%Y-%m-%d %H:%M"),
                            e.kind,
                            config.format_currency(e.amount()),
                            config.format_currency(e.balance_after())
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        ConsoleCommand::Refresh => {
            let summary = catalog_cmd::refresh_catalog(backend, catalog).await?;
            format!(
                "Loaded {} items and {} customers ({} low on stock)",
                summary.item_count, summary.customer_count, summary.low_stock_count
            )
        }
        ConsoleCommand::Low => {
            let entries = catalog_cmd::low_stock(catalog);
            if entries.is_empty() {
                "Nothing at or below its reorder level".to_string()
            } else {
                entries
                    .iter()
                    .map(|e| {
                        format!(
                            "  {:<20} {:<28} {} left (reorder at {})",
                            e.key, e.name, e.quantity, e.reorder_level
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        ConsoleCommand::Quit => return Ok(None),
    };

    Ok(Some(reply))
}

/// Reads commands from `input` until `quit` or end of input.
///
/// Command failures are printed and the loop carries on; only I/O errors
/// end the session early.
pub async fn run<R, W>(session: &Session, mut input: R, mut output: W) -> ApiResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{}: type 'help' for commands\n", session.config.store_name).as_bytes())
        .await?;

    let mut line = String::new();
    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            break;
        }

        let reply = match parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => {
                debug!(?command, "Console command");
                match execute(session, command).await {
                    Ok(Some(reply)) => reply,
                    Ok(None) => break,
                    Err(err) if err.is_credit_limit() => {
                        format!(
                            "error: {}\nType 'force' to sell over the limit, or change the payment",
                            err.message
                        )
                    }
                    Err(err) => format!("error: {}", err.message),
                }
            }
            Err(err) => format!("error: {}", err),
        };

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }

    output.write_all(b"bye\n").await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amounts() {
        assert_eq!(parse_amount("x", "150").unwrap(), Money::from_rupees(150));
        assert_eq!(parse_amount("x", "150.5").unwrap(), Money::from_paise(15_050));
        assert_eq!(parse_amount("x", "150.05").unwrap(), Money::from_paise(15_005));
        assert_eq!(parse_amount("x", ".75").unwrap(), Money::from_paise(75));

        assert!(parse_amount("x", "").is_err());
        assert!(parse_amount("x", ".").is_err());
        assert!(parse_amount("x", "-5").is_err());
        assert!(parse_amount("x", "1.234").is_err());
        assert!(parse_amount("x", "12a").is_err());
        assert!(parse_amount("x", "99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_cart_commands() {
        assert_eq!(
            parse("add rice 5kg").unwrap(),
            Some(ConsoleCommand::Add {
                item_id: "rice".to_string(),
                variant_id: Some("5kg".to_string()),
            })
        );
        assert_eq!(
            parse("dec rice/5kg 2").unwrap(),
            Some(ConsoleCommand::Change {
                key: LineKey::variant("rice", "5kg"),
                delta: -2,
            })
        );
        assert_eq!(
            parse("inc soap").unwrap(),
            Some(ConsoleCommand::Change {
                key: LineKey::item("soap"),
                delta: 1,
            })
        );
        assert!(parse("inc soap 0").is_err());
    }

    #[test]
    fn test_parse_payment_commands() {
        assert_eq!(
            parse("mode credit").unwrap(),
            Some(ConsoleCommand::Mode(PaymentMode::FullCredit))
        );
        assert_eq!(
            parse("TENDER 100").unwrap(),
            Some(ConsoleCommand::Tender(Money::from_rupees(100)))
        );
        assert_eq!(
            parse("dues c-1 50.25").unwrap(),
            Some(ConsoleCommand::Dues {
                customer_id: "c-1".to_string(),
                amount: Money::from_paise(5_025),
            })
        );
        assert!(matches!(parse("dues c-1"), Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_parse_blank_and_unknown() {
        assert_eq!(parse("   \n").unwrap(), None);
        assert!(matches!(parse("sell everything"), Err(ValidationError::InvalidFormat { .. })));
    }
}
