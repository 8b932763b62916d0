//! In-memory [`PayeeRepository`] for processor tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::ledger::{
    error::LedgerError,
    period::Period,
    repository::{LedgerUnitOfWork, PayeeRepository},
    types::*,
};

type LedgerKey = (i64, i32, u32);

fn key(payee_id: i64, period: Period) -> LedgerKey {
    (payee_id, period.year(), period.month())
}

#[derive(Debug, Clone)]
struct MemoryPayee {
    id: i64,
    name: String,
    obligation: Amount,
    active: bool,
    joined: Option<NaiveDate>,
}

#[derive(Debug, Default)]
struct MemoryState {
    payees: Vec<MemoryPayee>,
    payments: Vec<(i64, NaiveDate, Amount)>,
    advances: Vec<(i64, NaiveDate, Amount)>,
    ledger: BTreeMap<LedgerKey, LedgerRecord>,
    fail_upsert_for: Option<i64>,
    runs: Vec<Period>,
}

pub struct InMemoryPayees {
    category: PayeeCategory,
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryPayees {
    pub fn new(category: PayeeCategory) -> Self {
        Self {
            category,
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    pub fn add_payee(
        &self,
        name: &str,
        obligation: Amount,
        active: bool,
        joined: Option<NaiveDate>,
    ) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.payees.len() as i64 + 1;
        state.payees.push(MemoryPayee {
            id,
            name: name.to_string(),
            obligation,
            active,
            joined,
        });
        id
    }

    pub fn add_payment(&self, payee_id: i64, on: NaiveDate, amount: Amount) {
        self.state.lock().unwrap().payments.push((payee_id, on, amount));
    }

    pub fn add_advance(&self, payee_id: i64, on: NaiveDate, amount: Amount) {
        self.state.lock().unwrap().advances.push((payee_id, on, amount));
    }

    /// Make every upsert for `payee_id` fail with a storage error.
    pub fn fail_upsert_for(&self, payee_id: i64) {
        self.state.lock().unwrap().fail_upsert_for = Some(payee_id);
    }

    pub fn set_active(&self, payee_id: i64, active: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(payee) = state.payees.iter_mut().find(|p| p.id == payee_id) {
            payee.active = active;
        }
    }

    /// Periods of committed batch runs, oldest first.
    pub fn runs(&self) -> Vec<Period> {
        self.state.lock().unwrap().runs.clone()
    }

    /// Committed ledger row, if any.
    pub fn ledger(&self, payee_id: i64, period: Period) -> Option<LedgerRecord> {
        self.state
            .lock()
            .unwrap()
            .ledger
            .get(&key(payee_id, period))
            .cloned()
    }
}

#[async_trait]
impl PayeeRepository for InMemoryPayees {
    fn category(&self) -> PayeeCategory {
        self.category
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, LedgerError> {
        Ok(Box::new(MemoryUnitOfWork {
            state: self.state.clone(),
            staged: BTreeMap::new(),
            staged_runs: Vec::new(),
        }))
    }
}

struct MemoryUnitOfWork {
    state: Arc<Mutex<MemoryState>>,
    staged: BTreeMap<LedgerKey, LedgerRecord>,
    staged_runs: Vec<Period>,
}

impl MemoryUnitOfWork {
    fn sum(events: &[(i64, NaiveDate, Amount)], payee_id: i64, period: Period) -> Amount {
        events
            .iter()
            .filter(|(id, on, _)| *id == payee_id && period.contains(*on))
            .map(|(_, _, amount)| amount)
            .sum()
    }

    fn lookup(&self, k: LedgerKey) -> Option<LedgerRecord> {
        self.staged
            .get(&k)
            .cloned()
            .or_else(|| self.state.lock().unwrap().ledger.get(&k).cloned())
    }
}

#[async_trait]
impl LedgerUnitOfWork for MemoryUnitOfWork {
    async fn record_run(&mut self, period: Period) -> Result<(), LedgerError> {
        self.staged_runs.push(period);
        Ok(())
    }

    async fn list_eligible(&mut self, period: Period) -> Result<Vec<EligiblePayee>, LedgerError> {
        let last_day = period.last_day();
        let state = self.state.lock().unwrap();
        Ok(state
            .payees
            .iter()
            .filter(|p| p.active && p.joined.map_or(true, |d| d <= last_day))
            .map(|p| EligiblePayee {
                id: p.id,
                name: p.name.clone(),
                base_obligation: p.obligation,
            })
            .collect())
    }

    async fn sum_payments(&mut self, payee_id: i64, period: Period) -> Result<Amount, LedgerError> {
        let state = self.state.lock().unwrap();
        Ok(Self::sum(&state.payments, payee_id, period))
    }

    async fn sum_advances(&mut self, payee_id: i64, period: Period) -> Result<Amount, LedgerError> {
        let state = self.state.lock().unwrap();
        Ok(Self::sum(&state.advances, payee_id, period))
    }

    async fn get_prior_carry_forward(
        &mut self,
        payee_id: i64,
        prior: Period,
    ) -> Result<Amount, LedgerError> {
        Ok(self
            .lookup(key(payee_id, prior))
            .map_or(0, |r| r.carry_forward_to_next))
    }

    async fn list_saved(&mut self, period: Period) -> Result<Vec<LedgerView>, LedgerError> {
        let state = self.state.lock().unwrap();
        let mut rows: BTreeMap<i64, LedgerRecord> = state
            .ledger
            .values()
            .filter(|r| r.is_for(period))
            .map(|r| (r.payee_id, r.clone()))
            .collect();
        for record in self.staged.values().filter(|r| r.is_for(period)) {
            rows.insert(record.payee_id, record.clone());
        }

        Ok(rows
            .into_values()
            .map(|record| LedgerView {
                name: state
                    .payees
                    .iter()
                    .find(|p| p.id == record.payee_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                saved: true,
                record,
            })
            .collect())
    }

    async fn upsert_ledger(&mut self, record: &LedgerRecord) -> Result<(), LedgerError> {
        if self.state.lock().unwrap().fail_upsert_for == Some(record.payee_id) {
            return Err(LedgerError::storage_error("injected upsert failure"));
        }
        self.staged.insert(
            (record.payee_id, record.year, record.month),
            record.clone(),
        );
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.ledger.append(&mut self.staged);
        state.runs.append(&mut self.staged_runs);
        Ok(())
    }
}
