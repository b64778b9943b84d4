use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::Transaction;

/// Resume-after token: the (date, id) of the last row of the previous page.
/// Threaded by the caller from one fetch to the next; jumping to an
/// arbitrary page without walking prior cursors is unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    pub txn_date: NaiveDate,
    pub id: String,
}

impl From<&Transaction> for PageCursor {
    fn from(txn: &Transaction) -> Self {
        PageCursor {
            txn_date: txn.txn_date,
            id: txn.id.clone(),
        }
    }
}

/// One page of a holding's non-deleted transactions, date-descending.
/// `generation` ties the page to the filter state it was fetched under; a
/// stale generation means the result must not overwrite caller state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub has_more: bool,
    pub next_cursor: Option<PageCursor>,
    pub generation: u64,
}
