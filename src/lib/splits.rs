use std::collections::BTreeSet;

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

use crate::error::{Error, Result};
use crate::types::{ExpenseSplit, MonetaryAmount, ParticipantId};

/// An expense as recorded upstream: one payer, shared equally among `split_with`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Expense {
    pub id: u32,
    pub payer: ParticipantId,
    pub amount: MonetaryAmount,
    pub split_with: Vec<ParticipantId>,
}

fn sorted_participants(expense: &Expense) -> Result<Vec<ParticipantId>> {
    if expense.split_with.is_empty() {
        return Err(Error::invalid(format!(
            "expense {} is not split with anyone",
            expense.id
        )));
    }
    if expense.payer.is_unset() || expense.split_with.iter().any(ParticipantId::is_unset) {
        return Err(Error::invalid(format!(
            "expense {} references an unset participant",
            expense.id
        )));
    }

    let unique: BTreeSet<ParticipantId> = expense.split_with.iter().copied().collect();
    if unique.len() != expense.split_with.len() {
        return Err(Error::invalid(format!(
            "expense {} lists a participant more than once",
            expense.id
        )));
    }
    Ok(unique.into_iter().collect())
}

/// Splits an expense into equal shares at the given currency scale.
///
/// Shares are truncated to `scale` decimal places. The leftover minor units go
/// one each to the lowest participant ids, so the shares always add back up to
/// the expense amount. Participants whose share comes out as zero get no row.
pub fn split_expense(expense: &Expense, scale: u32) -> Result<Vec<ExpenseSplit>> {
    let amount = expense.amount.value();
    if amount <= Decimal::ZERO {
        return Err(Error::invalid(format!(
            "expense {} has non-positive amount {}",
            expense.id, amount
        )));
    }
    if amount.round_dp(scale) != amount {
        return Err(Error::invalid(format!(
            "expense {} amount {} has more than {} decimal places",
            expense.id, amount, scale
        )));
    }

    let unit = Decimal::try_new(1, scale).map_err(|_| {
        Error::invalid(format!(
            "expense {} cannot be split at scale {}",
            expense.id, scale
        ))
    })?;
    let participants = sorted_participants(expense)?;
    let count = Decimal::from(participants.len());

    let share = (amount / count).round_dp_with_strategy(scale, RoundingStrategy::ToZero);
    let remainder_units = ((amount - share * count) / unit)
        .to_usize()
        .ok_or_else(|| Error::invalid(format!("expense {} cannot be split", expense.id)))?;

    Ok(participants
        .into_iter()
        .enumerate()
        .map(|(i, debtor)| {
            let extra = if i < remainder_units { unit } else { Decimal::ZERO };
            ExpenseSplit {
                payer: expense.payer,
                debtor,
                amount: MonetaryAmount::new(share + extra),
            }
        })
        .filter(|split| split.amount.is_positive())
        .collect())
}
