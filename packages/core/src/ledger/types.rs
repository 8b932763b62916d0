//! Core data types for the monthly ledger

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ledger::period::Period;

/// Money in the currency's minor unit (e.g. paise).
pub type Amount = i64;

/// Which payee table set a ledger operation runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayeeCategory {
    Doctor,
    Staff,
    Patient,
}

impl PayeeCategory {
    pub const ALL: [PayeeCategory; 3] = [Self::Doctor, Self::Staff, Self::Patient];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Staff => "staff",
            Self::Patient => "patient",
        }
    }
}

impl fmt::Display for PayeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayeeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doctor" | "doctors" => Ok(Self::Doctor),
            "staff" => Ok(Self::Staff),
            "patient" | "patients" => Ok(Self::Patient),
            other => Err(format!(
                "Invalid payee category '{}'. Must be one of: doctor, staff, patient",
                other
            )),
        }
    }
}

/// Whether a payee is currently liable for monthly obligations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayeeStatus {
    Active,
    Inactive,
}

impl PayeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl FromStr for PayeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            other => Err(format!("Invalid payee status '{}'", other)),
        }
    }
}

/// Settlement state of a month, derived from the sign of the net balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerStatus {
    Pending,
    Paid,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
        }
    }
}

impl FromStr for LedgerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            other => Err(format!("Invalid ledger status '{}'", other)),
        }
    }
}

/// Output of the ledger formula for one payee-month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerComputation {
    pub net_balance: Amount,
    pub carry_forward_next: Amount,
    pub status: LedgerStatus,
}

/// A payee liable for the period being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligiblePayee {
    pub id: i64,
    pub name: String,
    pub base_obligation: Amount,
}

/// Persisted month-end snapshot for one payee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub payee_id: i64,
    pub month: u32,
    pub year: i32,
    pub base_obligation: Amount,
    pub amount_paid: Amount,
    pub advance_amount: Amount,
    pub carry_forward_from_previous: Amount,
    pub carry_forward_to_next: Amount,
    pub net_balance: Amount,
    pub status: LedgerStatus,
}

impl LedgerRecord {
    pub fn is_for(&self, period: Period) -> bool {
        self.month == period.month() && self.year == period.year()
    }
}

/// A read-model row: payee name plus either the saved ledger record or one
/// computed on the fly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerView {
    pub name: String,
    /// `false` when no ledger row exists yet and the figures were computed
    /// from the current events.
    pub saved: bool,
    #[serde(flatten)]
    pub record: LedgerRecord,
}

/// Result of one carry-forward batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub records_processed: usize,
    pub carry_forward_updates: usize,
}
