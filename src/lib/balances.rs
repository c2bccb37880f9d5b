use im::OrdMap;

use crate::error::{Error, Result};
use crate::types::{
    BalanceSheet, ConfirmedSettlement, ExpenseSplit, MonetaryAmount, ParticipantId,
};
use crate::utils::AdjustImmut;

type Totals = OrdMap<ParticipantId, MonetaryAmount>;

fn validate_row(
    kind: &str,
    index: usize,
    parties: [ParticipantId; 2],
    amount: MonetaryAmount,
) -> Result<()> {
    if parties.iter().any(ParticipantId::is_unset) {
        return Err(Error::invalid(format!(
            "{kind} row {index} references an unset participant"
        )));
    }
    if !amount.is_positive() {
        return Err(Error::invalid(format!(
            "{kind} row {index} has non-positive amount {amount}"
        )));
    }
    Ok(())
}

fn validate(splits: &[ExpenseSplit], confirmed: &[ConfirmedSettlement]) -> Result<()> {
    splits.iter().enumerate().try_for_each(|(i, split)| {
        validate_row("split", i, [split.payer, split.debtor], split.amount)
    })?;
    confirmed.iter().enumerate().try_for_each(|(i, payment)| {
        validate_row("payment", i, [payment.from, payment.to], payment.amount)
    })
}

fn apply_split(totals: Totals, split: &ExpenseSplit) -> Totals {
    // payer == debtor cancels out, leaving only their share net of what they fronted
    totals
        .adjust_or_default(split.payer, |t| t + split.amount)
        .adjust_or_default(split.debtor, |t| t - split.amount)
}

fn apply_payment(totals: Totals, payment: &ConfirmedSettlement) -> Totals {
    totals
        .adjust_or_default(payment.from, |t| t + payment.amount)
        .adjust_or_default(payment.to, |t| t - payment.amount)
}

// Used for testing
fn compute_balances_with_init(
    init: Totals,
    splits: &[ExpenseSplit],
    confirmed: &[ConfirmedSettlement],
) -> Result<BalanceSheet> {
    validate(splits, confirmed)?;

    let after_splits = splits.iter().fold(init, apply_split);
    let totals = confirmed.iter().fold(after_splits, apply_payment);

    tracing::debug!(
        splits = splits.len(),
        payments = confirmed.len(),
        participants = totals.len(),
        "computed balances"
    );

    Ok(BalanceSheet(totals))
}

/// Folds expense splits and confirmed payments into one net balance per participant.
///
/// Participants whose balance returns to zero are kept in the sheet.
pub fn compute_balances(
    splits: &[ExpenseSplit],
    confirmed: &[ConfirmedSettlement],
) -> Result<BalanceSheet> {
    compute_balances_with_init(OrdMap::new(), splits, confirmed)
}

#[cfg(test)]
mod tests {
    use im::OrdMap;
    use rust_decimal::Decimal;

    use super::{compute_balances, compute_balances_with_init};
    use crate::error::Error;
    use crate::types::{ConfirmedSettlement, ExpenseSplit, MonetaryAmount, ParticipantId};

    fn amount(v: i64) -> MonetaryAmount {
        MonetaryAmount::new(Decimal::from(v))
    }

    fn split(payer: u32, debtor: u32, v: i64) -> ExpenseSplit {
        ExpenseSplit {
            payer: ParticipantId::new(payer),
            debtor: ParticipantId::new(debtor),
            amount: amount(v),
        }
    }

    fn payment(from: u32, to: u32, v: i64) -> ConfirmedSettlement {
        ConfirmedSettlement {
            from: ParticipantId::new(from),
            to: ParticipantId::new(to),
            amount: amount(v),
        }
    }

    #[test]
    fn empty_input_yields_empty_sheet() {
        let sheet = compute_balances(&[], &[]).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn payer_in_own_split_only_owes_their_share() {
        let splits = vec![split(1, 1, 30), split(1, 2, 30), split(1, 3, 30)];

        let sheet = compute_balances(&splits, &[]).unwrap();

        assert_eq!(sheet.get(&ParticipantId::new(1)), Some(amount(60)));
        assert_eq!(sheet.get(&ParticipantId::new(2)), Some(amount(-30)));
        assert_eq!(sheet.get(&ParticipantId::new(3)), Some(amount(-30)));
    }

    #[test]
    fn confirmed_payment_moves_both_parties_toward_zero() {
        let splits = vec![split(1, 1, 30), split(1, 2, 30), split(1, 3, 30)];
        let payments = vec![payment(2, 1, 30)];

        let sheet = compute_balances(&splits, &payments).unwrap();

        assert_eq!(sheet.get(&ParticipantId::new(1)), Some(amount(30)));
        assert_eq!(sheet.get(&ParticipantId::new(2)), Some(MonetaryAmount::zero()));
        assert_eq!(sheet.get(&ParticipantId::new(3)), Some(amount(-30)));
    }

    #[test]
    fn settled_participants_are_retained() {
        let sheet = compute_balances(&[split(1, 2, 10)], &[payment(2, 1, 10)]).unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.total(), MonetaryAmount::zero());
    }

    #[test]
    fn accumulation_starts_from_existing_totals() {
        let init: OrdMap<ParticipantId, MonetaryAmount> =
            [(ParticipantId::new(1), amount(5)), (ParticipantId::new(2), amount(-5))]
                .into_iter()
                .collect();

        let sheet = compute_balances_with_init(init, &[split(2, 1, 5)], &[]).unwrap();

        assert_eq!(sheet.get(&ParticipantId::new(1)), Some(MonetaryAmount::zero()));
        assert_eq!(sheet.get(&ParticipantId::new(2)), Some(MonetaryAmount::zero()));
    }

    #[test]
    fn non_positive_split_is_rejected() {
        let result = compute_balances(&[split(1, 2, 0)], &[]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn negative_payment_is_rejected() {
        let result = compute_balances(&[split(1, 2, 10)], &[payment(2, 1, -10)]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn unset_participant_is_rejected() {
        let result = compute_balances(&[split(0, 2, 10)], &[]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
