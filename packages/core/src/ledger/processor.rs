//! Carry-forward batch and monthly read model.
//!
//! Both paths derive a payee's figures with [`assemble_record`], so a row
//! shown before the batch runs matches the row the batch then saves.

use std::time::Instant;

use crate::ledger::{
    calculator::assemble_record,
    error::LedgerError,
    period::Period,
    repository::{LedgerUnitOfWork, PayeeRepository},
    types::*,
};

/// Recompute and save the ledger row of every eligible payee for `period`.
///
/// The whole batch runs in one unit of work. The first failing payee aborts
/// the run; nothing written so far is committed and the error names the
/// payee it failed on.
///
/// Re-running with unchanged inputs rewrites identical rows.
pub async fn run_monthly_carry_forward(
    repository: &dyn PayeeRepository,
    period: Period,
) -> Result<BatchOutcome, LedgerError> {
    let started = Instant::now();
    let category = repository.category();

    tracing::info!("Carry-forward started for {} payees, period {}", category, period);

    let mut uow = repository.begin().await?;
    uow.record_run(period).await?;
    let payees = uow.list_eligible(period).await?;
    let mut outcome = BatchOutcome::default();

    for payee in &payees {
        let record = compute_for_payee(uow.as_mut(), payee, period)
            .await
            .map_err(|err| LedgerError::for_payee(payee.id, err))?;

        uow.upsert_ledger(&record)
            .await
            .map_err(|err| LedgerError::for_payee(payee.id, err))?;

        outcome.records_processed += 1;
        if record.carry_forward_to_next > 0 {
            outcome.carry_forward_updates += 1;
        }
    }

    uow.commit().await?;

    tracing::info!(
        "Carry-forward finished for {} payees, period {}: {} records, {} carried forward ({} ms)",
        category,
        period,
        outcome.records_processed,
        outcome.carry_forward_updates,
        started.elapsed().as_millis(),
    );

    Ok(outcome)
}

/// Ledger rows for `period`, without writing.
///
/// Every saved row is returned as stored, including rows of payees that have
/// since become ineligible. Eligible payees without a saved row get one
/// computed from the current events and prior carry-forward, marked
/// `saved = false`. Rows are ordered by payee id.
pub async fn monthly_overview(
    repository: &dyn PayeeRepository,
    period: Period,
) -> Result<Vec<LedgerView>, LedgerError> {
    let mut uow = repository.begin().await?;
    let mut views = uow.list_saved(period).await?;
    let payees = uow.list_eligible(period).await?;

    for payee in payees {
        if views.iter().any(|view| view.record.payee_id == payee.id) {
            continue;
        }

        let record = compute_for_payee(uow.as_mut(), &payee, period).await?;
        views.push(LedgerView {
            name: payee.name,
            saved: false,
            record,
        });
    }

    views.sort_by_key(|view| view.record.payee_id);

    // Read-only: dropping the unit of work discards it.
    Ok(views)
}

async fn compute_for_payee(
    uow: &mut dyn LedgerUnitOfWork,
    payee: &EligiblePayee,
    period: Period,
) -> Result<LedgerRecord, LedgerError> {
    let carry_forward_prev = uow.get_prior_carry_forward(payee.id, period.previous()).await?;
    let amount_paid = uow.sum_payments(payee.id, period).await?;
    let advance_amount = uow.sum_advances(payee.id, period).await?;

    assemble_record(payee, period, carry_forward_prev, amount_paid, advance_amount)
}
