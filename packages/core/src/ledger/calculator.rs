//! Ledger formula
//!
//! `net_balance = base + carry_forward_prev - paid - advance`, the
//! carry-forward into next month is the positive part of the net balance,
//! and the month counts as paid once the net balance reaches zero.

use crate::ledger::{
    error::LedgerError,
    period::Period,
    types::*,
};

/// Apply the ledger formula. Fails only on `i64` overflow.
pub fn compute_ledger(
    base_obligation: Amount,
    carry_forward_prev: Amount,
    amount_paid: Amount,
    advance_amount: Amount,
) -> Result<LedgerComputation, LedgerError> {
    let net_balance = base_obligation
        .checked_add(carry_forward_prev)
        .and_then(|owed| owed.checked_sub(amount_paid))
        .and_then(|owed| owed.checked_sub(advance_amount))
        .ok_or_else(|| LedgerError::numerical_overflow("net balance"))?;

    let status = if net_balance <= 0 {
        LedgerStatus::Paid
    } else {
        LedgerStatus::Pending
    };

    Ok(LedgerComputation {
        net_balance,
        carry_forward_next: net_balance.max(0),
        status,
    })
}

/// Build the full ledger record for a payee-month from its inputs.
pub fn assemble_record(
    payee: &EligiblePayee,
    period: Period,
    carry_forward_prev: Amount,
    amount_paid: Amount,
    advance_amount: Amount,
) -> Result<LedgerRecord, LedgerError> {
    let computed = compute_ledger(
        payee.base_obligation,
        carry_forward_prev,
        amount_paid,
        advance_amount,
    )?;

    Ok(LedgerRecord {
        payee_id: payee.id,
        month: period.month(),
        year: period.year(),
        base_obligation: payee.base_obligation,
        amount_paid,
        advance_amount,
        carry_forward_from_previous: carry_forward_prev,
        carry_forward_to_next: computed.carry_forward_next,
        net_balance: computed.net_balance,
        status: computed.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn partial_payment_leaves_pending_balance() {
        let c = compute_ledger(15_000, 0, 5_000, 0).unwrap();
        assert_eq!(c.net_balance, 10_000);
        assert_eq!(c.carry_forward_next, 10_000);
        assert_eq!(c.status, LedgerStatus::Pending);
    }

    #[test]
    fn carry_forward_is_added_to_next_month() {
        let c = compute_ledger(15_000, 10_000, 10_000, 0).unwrap();
        assert_eq!(c.net_balance, 15_000);
        assert_eq!(c.carry_forward_next, 15_000);
    }

    #[test]
    fn overpayment_keeps_negative_net_and_zero_carry() {
        let c = compute_ledger(15_000, 0, 20_000, 0).unwrap();
        assert_eq!(c.net_balance, -5_000);
        assert_eq!(c.carry_forward_next, 0);
        assert_eq!(c.status, LedgerStatus::Paid);
    }

    #[test]
    fn exact_settlement_is_paid() {
        let c = compute_ledger(15_000, 2_000, 12_000, 5_000).unwrap();
        assert_eq!(c.net_balance, 0);
        assert_eq!(c.carry_forward_next, 0);
        assert_eq!(c.status, LedgerStatus::Paid);
    }

    #[test]
    fn advance_reduces_balance() {
        let c = compute_ledger(15_000, 0, 0, 4_000).unwrap();
        assert_eq!(c.net_balance, 11_000);
    }

    #[test]
    fn overflow_is_reported() {
        let err = compute_ledger(i64::MAX, 1, 0, 0).unwrap_err();
        assert!(matches!(err, LedgerError::NumericalOverflow { .. }));
    }

    #[test]
    fn assemble_record_copies_inputs() {
        let payee = EligiblePayee {
            id: 7,
            name: "Dr. Rao".into(),
            base_obligation: 15_000,
        };
        let period = Period::new(3, 2024).unwrap();
        let record = assemble_record(&payee, period, 1_000, 5_000, 500).unwrap();

        assert_eq!(record.payee_id, 7);
        assert!(record.is_for(period));
        assert_eq!(record.carry_forward_from_previous, 1_000);
        assert_eq!(record.amount_paid, 5_000);
        assert_eq!(record.advance_amount, 500);
        assert_eq!(record.net_balance, 10_500);
        assert_eq!(record.carry_forward_to_next, 10_500);
    }

    proptest! {
        #[test]
        fn carry_forward_is_positive_part_of_net(
            base in 0i64..10_000_000,
            prev in 0i64..10_000_000,
            paid in 0i64..10_000_000,
            advance in 0i64..10_000_000,
        ) {
            let c = compute_ledger(base, prev, paid, advance).unwrap();
            prop_assert_eq!(c.net_balance, base + prev - paid - advance);
            prop_assert_eq!(c.carry_forward_next, c.net_balance.max(0));
            prop_assert!(c.carry_forward_next >= 0);
            if c.net_balance > 0 {
                prop_assert_eq!(c.status, LedgerStatus::Pending);
            } else {
                prop_assert_eq!(c.status, LedgerStatus::Paid);
            }
        }

        #[test]
        fn computation_is_deterministic(
            base in 0i64..10_000_000,
            prev in 0i64..10_000_000,
            paid in 0i64..10_000_000,
        ) {
            let a = compute_ledger(base, prev, paid, 0).unwrap();
            let b = compute_ledger(base, prev, paid, 0).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
