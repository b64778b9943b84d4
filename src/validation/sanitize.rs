use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::MAX_TEXT_LENGTH;
use crate::holdings::NewHolding;
use crate::ledger::{HoldingRef, TransactionDraft};

lazy_static! {
    static ref SCRIPT_PROTOCOL: Regex = Regex::new(r"(?i)javascript:").unwrap();
    static ref EVENT_HANDLER: Regex = Regex::new(r"(?i)\bon\w+\s*=").unwrap();
}

/// Strips angle brackets, `javascript:` URLs and inline event-handler
/// patterns, trims, and caps the length. Defense in depth only; the store's
/// access rules are the primary boundary.
pub fn sanitize_text(input: &str) -> String {
    let without_angles: String = input.chars().filter(|c| *c != '<' && *c != '>').collect();
    let without_proto = SCRIPT_PROTOCOL.replace_all(&without_angles, "");
    let without_handlers = EVENT_HANDLER.replace_all(&without_proto, "");
    without_handlers.trim().chars().take(MAX_TEXT_LENGTH).collect()
}

/// Applies `sanitize_text` to every free-text field a draft carries.
pub fn sanitize_draft(draft: TransactionDraft) -> TransactionDraft {
    let holding = match draft.holding {
        HoldingRef::New(new) => HoldingRef::New(NewHolding {
            holding_type: new.holding_type,
            symbol: new.symbol.trim().to_string(),
            name: sanitize_text(&new.name),
            category: new
                .category
                .as_deref()
                .map(sanitize_text)
                .filter(|c| !c.is_empty()),
            current_price: new.current_price,
        }),
        existing => existing,
    };

    TransactionDraft { holding, ..draft }
}
