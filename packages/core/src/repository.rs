//! Database repository for payees, their events and the monthly ledger.
//!
//! One [`SqlPayeeRepository`] serves one [`PayeeCategory`]. The categories
//! share column shapes and differ only in table and column names, which come
//! from [`CategoryTables`]. The ledger processor reaches this module through
//! the [`PayeeRepository`] trait; the HTTP layer additionally uses the
//! master-data and event methods.
//!
//! Dates are stored as `YYYY-MM-DD` text, so range filters compare strings.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::ledger::{
    Amount, EligiblePayee, LedgerError, LedgerRecord, LedgerStatus, LedgerUnitOfWork, LedgerView,
    PayeeCategory, PayeeRepository, PayeeStatus, Period,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Table and column names for one payee category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryTables {
    pub payees: &'static str,
    pub obligation_column: &'static str,
    pub joined_column: &'static str,
    pub ledger: &'static str,
    pub payments: &'static str,
    pub advances: &'static str,
}

impl CategoryTables {
    pub fn for_category(category: PayeeCategory) -> Self {
        match category {
            PayeeCategory::Doctor => Self {
                payees: "doctors",
                obligation_column: "monthly_salary",
                joined_column: "join_date",
                ledger: "doctor_monthly_salary",
                payments: "doctor_salary_payments",
                advances: "doctor_advances",
            },
            PayeeCategory::Staff => Self {
                payees: "staff",
                obligation_column: "monthly_salary",
                joined_column: "join_date",
                ledger: "staff_monthly_salary",
                payments: "staff_salary_payments",
                advances: "staff_advances",
            },
            PayeeCategory::Patient => Self {
                payees: "patients",
                obligation_column: "monthly_fees",
                joined_column: "admission_date",
                ledger: "patient_monthly_fees",
                payments: "patient_fee_payments",
                advances: "patient_advances",
            },
        }
    }
}

/// Kind of append-only money event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Payment,
    Advance,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Advance => "advance",
        }
    }

    fn table(&self, tables: &CategoryTables) -> &'static str {
        match self {
            Self::Payment => tables.payments,
            Self::Advance => tables.advances,
        }
    }

    fn date_column(&self) -> &'static str {
        match self {
            Self::Payment => "paid_on",
            Self::Advance => "advanced_on",
        }
    }
}

/// A doctor, staff member or patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payee {
    pub id: i64,
    pub name: String,
    pub monthly_obligation: Amount,
    pub status: PayeeStatus,
    pub join_date: Option<NaiveDate>,
    pub created_at: String,
}

/// Fields for a new payee. Status defaults to `Active`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayee {
    pub name: String,
    pub monthly_obligation: Amount,
    pub status: Option<PayeeStatus>,
    pub join_date: Option<NaiveDate>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayeeUpdate {
    pub name: Option<String>,
    pub monthly_obligation: Option<Amount>,
    pub status: Option<PayeeStatus>,
    /// `Some(None)`, sent as JSON `null`, clears the join date.
    #[serde(default, deserialize_with = "present_or_null")]
    pub join_date: Option<Option<NaiveDate>>,
}

/// Marks a field that is present in the input, even as `null`, with `Some`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A payment or advance to record.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub payee_id: i64,
    pub amount: Amount,
    pub date: NaiveDate,
    pub note: Option<String>,
}

fn decode_err(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

fn parse_date(raw: &str) -> Result<NaiveDate, sqlx::Error> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|err| decode_err(format!("invalid date '{}': {}", raw, err)))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn payee_from_row(row: &SqliteRow) -> Result<Payee, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let join_date: Option<String> = row.try_get("joined")?;

    Ok(Payee {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        monthly_obligation: row.try_get("obligation")?,
        status: status.parse().map_err(decode_err)?,
        join_date: join_date.as_deref().map(parse_date).transpose()?,
        created_at: row.try_get("created_at")?,
    })
}

fn ledger_from_row(row: &SqliteRow) -> Result<LedgerRecord, sqlx::Error> {
    let status: String = row.try_get("status")?;

    Ok(LedgerRecord {
        payee_id: row.try_get("payee_id")?,
        month: row.try_get("month")?,
        year: row.try_get("year")?,
        base_obligation: row.try_get("base_obligation")?,
        amount_paid: row.try_get("amount_paid")?,
        advance_amount: row.try_get("advance_amount")?,
        carry_forward_from_previous: row.try_get("carry_forward_from_previous")?,
        carry_forward_to_next: row.try_get("carry_forward_to_next")?,
        net_balance: row.try_get("net_balance")?,
        status: status.parse::<LedgerStatus>().map_err(decode_err)?,
    })
}

const LEDGER_COLUMNS: &str = "payee_id, month, year, base_obligation, amount_paid, advance_amount,
     carry_forward_from_previous, carry_forward_to_next, net_balance, status";

/// Repository for one payee category, backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqlPayeeRepository {
    pool: SqlitePool,
    category: PayeeCategory,
    tables: CategoryTables,
}

impl SqlPayeeRepository {
    pub fn new(pool: SqlitePool, category: PayeeCategory) -> Self {
        Self {
            pool,
            category,
            tables: CategoryTables::for_category(category),
        }
    }

    fn select_payees_sql(&self) -> String {
        format!(
            "SELECT id, name, {} AS obligation, status, {} AS joined, created_at FROM {}",
            self.tables.obligation_column, self.tables.joined_column, self.tables.payees
        )
    }

    // ---- Payee master data ----

    /// Insert a payee. Returns the new row id.
    pub async fn create_payee(&self, payee: &NewPayee) -> Result<i64, sqlx::Error> {
        let status = payee.status.unwrap_or(PayeeStatus::Active);
        let sql = format!(
            "INSERT INTO {} (name, {}, status, {}) VALUES (?, ?, ?, ?)",
            self.tables.payees, self.tables.obligation_column, self.tables.joined_column
        );

        let result = sqlx::query(&sql)
            .bind(&payee.name)
            .bind(payee.monthly_obligation)
            .bind(status.as_str())
            .bind(payee.join_date.map(format_date))
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// All payees of this category, ordered by id.
    pub async fn list_payees(&self) -> Result<Vec<Payee>, sqlx::Error> {
        let sql = format!("{} ORDER BY id ASC", self.select_payees_sql());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(payee_from_row).collect()
    }

    pub async fn get_payee(&self, id: i64) -> Result<Option<Payee>, sqlx::Error> {
        let sql = format!("{} WHERE id = ?", self.select_payees_sql());
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(payee_from_row).transpose()
    }

    pub async fn payee_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?", self.tables.payees);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }

    /// Apply a partial update.
    /// Returns `true` if a row was updated, `false` if id not found.
    pub async fn update_payee(&self, id: i64, update: &PayeeUpdate) -> Result<bool, sqlx::Error> {
        let current = match self.get_payee(id).await? {
            Some(p) => p,
            None => return Ok(false),
        };

        let name = update.name.as_deref().unwrap_or(&current.name);
        let obligation = update.monthly_obligation.unwrap_or(current.monthly_obligation);
        let status = update.status.unwrap_or(current.status);
        let join_date = update.join_date.unwrap_or(current.join_date);

        let sql = format!(
            "UPDATE {} SET name = ?, {} = ?, status = ?, {} = ? WHERE id = ?",
            self.tables.payees, self.tables.obligation_column, self.tables.joined_column
        );

        let result = sqlx::query(&sql)
            .bind(name)
            .bind(obligation)
            .bind(status.as_str())
            .bind(join_date.map(format_date))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- Payment / advance events ----

    /// Append a payment or advance event.
    /// Returns `None` when the payee does not exist.
    pub async fn record_event(
        &self,
        kind: EventKind,
        event: &NewEvent,
    ) -> Result<Option<i64>, sqlx::Error> {
        if !self.payee_exists(event.payee_id).await? {
            return Ok(None);
        }

        let sql = format!(
            "INSERT INTO {} (payee_id, amount, {}, note) VALUES (?, ?, ?, ?)",
            kind.table(&self.tables),
            kind.date_column()
        );

        let result = sqlx::query(&sql)
            .bind(event.payee_id)
            .bind(event.amount)
            .bind(format_date(event.date))
            .bind(&event.note)
            .execute(&self.pool)
            .await?;

        Ok(Some(result.last_insert_rowid()))
    }

    // ---- Ledger history / correction ----

    /// All saved ledger rows for a payee, newest month first.
    pub async fn ledger_history(&self, payee_id: i64) -> Result<Vec<LedgerRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM {} WHERE payee_id = ? ORDER BY year DESC, month DESC",
            LEDGER_COLUMNS, self.tables.ledger
        );
        let rows = sqlx::query(&sql).bind(payee_id).fetch_all(&self.pool).await?;
        rows.iter().map(ledger_from_row).collect()
    }

    /// Remove one saved ledger row.
    /// Returns `true` if a row was deleted.
    pub async fn delete_ledger(&self, payee_id: i64, period: Period) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "DELETE FROM {} WHERE payee_id = ? AND month = ? AND year = ?",
            self.tables.ledger
        );

        let result = sqlx::query(&sql)
            .bind(payee_id)
            .bind(period.month())
            .bind(period.year())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PayeeRepository for SqlPayeeRepository {
    fn category(&self) -> PayeeCategory {
        self.category
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqlLedgerUnitOfWork {
            tx: Some(tx),
            category: self.category,
            tables: self.tables,
        }))
    }
}

/// A single SQLite transaction. Dropping it uncommitted rolls back.
pub struct SqlLedgerUnitOfWork {
    tx: Option<Transaction<'static, Sqlite>>,
    category: PayeeCategory,
    tables: CategoryTables,
}

impl SqlLedgerUnitOfWork {
    fn conn(&mut self) -> Result<&mut SqliteConnection, LedgerError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| LedgerError::storage_error("unit of work already committed"))
    }

    async fn sum_events(
        &mut self,
        kind: EventKind,
        payee_id: i64,
        period: Period,
    ) -> Result<Amount, LedgerError> {
        let sql = format!(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM {table}
             WHERE payee_id = ? AND {col} >= ? AND {col} < ?",
            table = kind.table(&self.tables),
            col = kind.date_column(),
        );

        let row = sqlx::query(&sql)
            .bind(payee_id)
            .bind(format_date(period.first_day()))
            .bind(format_date(period.next_first_day()))
            .fetch_one(self.conn()?)
            .await?;

        Ok(row.try_get("total")?)
    }
}

#[async_trait]
impl LedgerUnitOfWork for SqlLedgerUnitOfWork {
    async fn record_run(&mut self, period: Period) -> Result<(), LedgerError> {
        let category = self.category.as_str();
        sqlx::query(
            "INSERT INTO carry_forward_runs (category, month, year) VALUES (?, ?, ?)
             ON CONFLICT (category, month, year) DO UPDATE SET
                run_count = run_count + 1,
                last_run_at = datetime('now')",
        )
        .bind(category)
        .bind(period.month())
        .bind(period.year())
        .execute(self.conn()?)
        .await?;

        Ok(())
    }

    async fn list_eligible(&mut self, period: Period) -> Result<Vec<EligiblePayee>, LedgerError> {
        let sql = format!(
            "SELECT id, name, {obligation} AS obligation FROM {table}
             WHERE status = 'Active' AND ({joined} IS NULL OR {joined} <= ?)
             ORDER BY id ASC",
            obligation = self.tables.obligation_column,
            joined = self.tables.joined_column,
            table = self.tables.payees,
        );

        let rows = sqlx::query(&sql)
            .bind(format_date(period.last_day()))
            .fetch_all(self.conn()?)
            .await?;

        rows.iter()
            .map(|row| -> Result<EligiblePayee, LedgerError> {
                Ok(EligiblePayee {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    base_obligation: row.try_get("obligation")?,
                })
            })
            .collect()
    }

    async fn sum_payments(&mut self, payee_id: i64, period: Period) -> Result<Amount, LedgerError> {
        self.sum_events(EventKind::Payment, payee_id, period).await
    }

    async fn sum_advances(&mut self, payee_id: i64, period: Period) -> Result<Amount, LedgerError> {
        self.sum_events(EventKind::Advance, payee_id, period).await
    }

    async fn get_prior_carry_forward(
        &mut self,
        payee_id: i64,
        prior: Period,
    ) -> Result<Amount, LedgerError> {
        let sql = format!(
            "SELECT carry_forward_to_next FROM {} WHERE payee_id = ? AND month = ? AND year = ?",
            self.tables.ledger
        );

        let row = sqlx::query(&sql)
            .bind(payee_id)
            .bind(prior.month())
            .bind(prior.year())
            .fetch_optional(self.conn()?)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("carry_forward_to_next")?),
            None => Ok(0),
        }
    }

    async fn list_saved(&mut self, period: Period) -> Result<Vec<LedgerView>, LedgerError> {
        let sql = format!(
            "SELECT {columns}, (SELECT p.name FROM {payees} p WHERE p.id = l.payee_id) AS payee_name
             FROM {ledger} l
             WHERE month = ? AND year = ?
             ORDER BY payee_id ASC",
            columns = LEDGER_COLUMNS,
            payees = self.tables.payees,
            ledger = self.tables.ledger,
        );

        let rows = sqlx::query(&sql)
            .bind(period.month())
            .bind(period.year())
            .fetch_all(self.conn()?)
            .await?;

        rows.iter()
            .map(|row| -> Result<LedgerView, sqlx::Error> {
                Ok(LedgerView {
                    name: row.try_get::<Option<String>, _>("payee_name")?.unwrap_or_default(),
                    saved: true,
                    record: ledger_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| LedgerError::corrupt_data(err.to_string()))
    }

    async fn upsert_ledger(&mut self, record: &LedgerRecord) -> Result<(), LedgerError> {
        let sql = format!(
            "INSERT INTO {} ({})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (payee_id, month, year) DO UPDATE SET
                base_obligation = excluded.base_obligation,
                amount_paid = excluded.amount_paid,
                advance_amount = excluded.advance_amount,
                carry_forward_from_previous = excluded.carry_forward_from_previous,
                carry_forward_to_next = excluded.carry_forward_to_next,
                net_balance = excluded.net_balance,
                status = excluded.status,
                updated_at = datetime('now')",
            self.tables.ledger, LEDGER_COLUMNS
        );

        sqlx::query(&sql)
            .bind(record.payee_id)
            .bind(record.month)
            .bind(record.year)
            .bind(record.base_obligation)
            .bind(record.amount_paid)
            .bind(record.advance_amount)
            .bind(record.carry_forward_from_previous)
            .bind(record.carry_forward_to_next)
            .bind(record.net_balance)
            .bind(record.status.as_str())
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<(), LedgerError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| LedgerError::storage_error("unit of work already committed"))?;
        tx.commit().await?;
        Ok(())
    }
}
