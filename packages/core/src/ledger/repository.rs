//! Payee Repository Interface
//!
//! Data access for the ledger processor, abstracted over the payee category
//! and the storage backend.

use async_trait::async_trait;

use crate::ledger::{
    error::LedgerError,
    period::Period,
    types::*,
};

/// Entry point to one category's ledger storage.
#[async_trait]
pub trait PayeeRepository: Send + Sync {
    /// The category this repository reads and writes.
    fn category(&self) -> PayeeCategory;

    /// Open a unit of work. All reads and writes made through it are atomic:
    /// they become visible only after [`LedgerUnitOfWork::commit`], and are
    /// discarded if the unit of work is dropped first.
    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, LedgerError>;
}

/// Transactional view over a category's payees, events and ledger rows.
#[async_trait]
pub trait LedgerUnitOfWork: Send {
    /// Log a batch run for `period`. A batch calls this before any read, so
    /// the unit of work holds the storage write lock for its whole lifetime.
    async fn record_run(&mut self, period: Period) -> Result<(), LedgerError>;

    /// Active payees whose join date is unset or on/before the period's last
    /// day, ordered by id.
    async fn list_eligible(&mut self, period: Period) -> Result<Vec<EligiblePayee>, LedgerError>;

    /// Total of payment events dated inside `period`.
    async fn sum_payments(&mut self, payee_id: i64, period: Period) -> Result<Amount, LedgerError>;

    /// Total of advance events dated inside `period`.
    async fn sum_advances(&mut self, payee_id: i64, period: Period) -> Result<Amount, LedgerError>;

    /// `carry_forward_to_next` of the ledger row keyed by
    /// (`payee_id`, `prior`), or zero when that row does not exist.
    async fn get_prior_carry_forward(
        &mut self,
        payee_id: i64,
        prior: Period,
    ) -> Result<Amount, LedgerError>;

    /// Every saved ledger row for `period` with its payee's name, ordered by
    /// payee id. Payees that are no longer eligible are included.
    async fn list_saved(&mut self, period: Period) -> Result<Vec<LedgerView>, LedgerError>;

    /// Insert or replace the ledger row keyed by the record's
    /// (payee_id, month, year).
    async fn upsert_ledger(&mut self, record: &LedgerRecord) -> Result<(), LedgerError>;

    /// Make every write of this unit of work durable.
    async fn commit(&mut self) -> Result<(), LedgerError>;
}
