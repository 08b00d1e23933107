//! Transactions: the `Transaction` model, validation of user input, and the
//! database functions for storing and querying transactions.

mod core;
mod db;

pub use core::{NewTransaction, Transaction, TransactionForm};
pub use db::{
    create_transaction, create_transaction_table, delete_transaction, get_all_transactions,
    get_transaction, map_transaction_row, update_transaction,
};
