//! Monthly carry-forward ledger
//!
//! Computes each payee's month-end balance from the obligation, the previous
//! month's carry-forward and the payments/advances recorded in the month.
//! The arithmetic lives in [`calculator`] and is shared by the batch writer
//! and the read model in [`processor`]. Storage is reached only through the
//! [`repository`] traits, so one processor serves doctors, staff and patients.

pub mod calculator;
pub mod error;
pub mod period;
pub mod processor;
pub mod repository;
pub mod types;

#[cfg(test)]
pub(crate) mod memory;

pub use calculator::{assemble_record, compute_ledger};
pub use error::LedgerError;
pub use period::Period;
pub use processor::{monthly_overview, run_monthly_carry_forward};
pub use repository::{LedgerUnitOfWork, PayeeRepository};
pub use types::*;
