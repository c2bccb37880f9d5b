use std::cmp::Ordering;

use im::Vector;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::{BalanceSheet, MonetaryAmount, ParticipantId, SettlementInstruction};
use crate::utils::PushImmut;

/// Balances within this distance of zero are treated as settled.
pub const DEFAULT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Outstanding amount of one side of the walk. Debtors are stored as positive amounts owed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct Position {
    pub participant: ParticipantId,
    pub remaining: Decimal,
}

/// One immutable step of the greedy matching walk.
#[derive(Default, Clone, Debug)]
pub(crate) struct WalkState {
    pub creditors: Vector<Position>,
    pub debtors: Vector<Position>,
    pub creditor_cursor: usize,
    pub debtor_cursor: usize,
    pub instructions: Vector<SettlementInstruction>,
}

impl WalkState {
    /// Sum of everything left unmatched past the cursors.
    pub fn residual(&self) -> Decimal {
        let creditors = self.creditors.iter().skip(self.creditor_cursor);
        let debtors = self.debtors.iter().skip(self.debtor_cursor);
        creditors.chain(debtors).map(|p| p.remaining).sum()
    }
}

// largest first, ties broken by ascending participant id
fn by_amount_desc(a: &Position, b: &Position) -> Ordering {
    b.remaining
        .cmp(&a.remaining)
        .then_with(|| a.participant.cmp(&b.participant))
}

fn partition(sheet: &BalanceSheet, epsilon: Decimal) -> WalkState {
    let (mut creditors, mut debtors): (Vec<Position>, Vec<Position>) = sheet
        .0
        .iter()
        .filter(|(_, net)| net.value().abs() > epsilon)
        .map(|(participant, net)| Position {
            participant: *participant,
            remaining: net.value(),
        })
        .partition(|p| p.remaining > Decimal::ZERO);

    debtors.iter_mut().for_each(|p| p.remaining = -p.remaining);
    creditors.sort_by(by_amount_desc);
    debtors.sort_by(by_amount_desc);

    WalkState {
        creditors: creditors.into_iter().collect(),
        debtors: debtors.into_iter().collect(),
        ..WalkState::default()
    }
}

/// Matches the current largest creditor with the current largest debtor.
///
/// Returns `None` once either side is exhausted.
fn step(state: &WalkState, epsilon: Decimal) -> Option<WalkState> {
    let creditor = state.creditors.get(state.creditor_cursor)?;
    let debtor = state.debtors.get(state.debtor_cursor)?;

    let amount = creditor.remaining.min(debtor.remaining);
    let creditor_left = creditor.remaining - amount;
    let debtor_left = debtor.remaining - amount;

    let instructions = if amount > epsilon {
        state.instructions.push(SettlementInstruction {
            from: debtor.participant,
            to: creditor.participant,
            amount: MonetaryAmount::new(amount),
        })
    } else {
        state.instructions.clone()
    };

    let next = WalkState {
        creditors: state.creditors.update(
            state.creditor_cursor,
            Position {
                participant: creditor.participant,
                remaining: creditor_left,
            },
        ),
        debtors: state.debtors.update(
            state.debtor_cursor,
            Position {
                participant: debtor.participant,
                remaining: debtor_left,
            },
        ),
        creditor_cursor: state.creditor_cursor + usize::from(creditor_left < epsilon),
        debtor_cursor: state.debtor_cursor + usize::from(debtor_left < epsilon),
        instructions,
    };
    Some(next)
}

/// Every intermediate state of the walk, starting from the partitioned balances.
pub(crate) fn walk(sheet: &BalanceSheet, epsilon: Decimal) -> impl Iterator<Item = WalkState> {
    std::iter::successors(Some(partition(sheet, epsilon)), move |state| {
        step(state, epsilon)
    })
}

fn conservation_tolerance(sheet: &BalanceSheet, epsilon: Decimal) -> Decimal {
    epsilon * Decimal::from(sheet.len().max(1))
}

/// Produces transfers that bring every balance in the sheet to zero.
///
/// Greedy largest-to-largest matching. Not guaranteed to be the minimum number
/// of transfers, but deterministic for identical input.
pub fn optimize_with_epsilon(
    sheet: &BalanceSheet,
    epsilon: Decimal,
) -> Result<Vec<SettlementInstruction>> {
    // a non-positive threshold never lets a cursor move past a settled position
    if epsilon <= Decimal::ZERO {
        return Err(Error::invalid(format!(
            "settlement epsilon must be positive, got {epsilon}"
        )));
    }
    let tolerance = conservation_tolerance(sheet, epsilon);

    let total = sheet.total().value();
    if total.abs() > tolerance {
        tracing::error!(
            participants = sheet.len(),
            total = %total,
            tolerance = %tolerance,
            "balances do not sum to zero"
        );
        return Err(Error::DataIntegrity {
            residual: total,
            tolerance,
        });
    }

    let last = walk(sheet, epsilon).last().unwrap_or_default();

    let residual = last.residual();
    if residual > tolerance {
        tracing::error!(
            participants = sheet.len(),
            residual = %residual,
            tolerance = %tolerance,
            "settlement walk left unmatched balance"
        );
        return Err(Error::DataIntegrity {
            residual,
            tolerance,
        });
    }
    if residual > Decimal::ZERO {
        tracing::warn!(residual = %residual, "dropping residual within tolerance");
    }

    tracing::debug!(
        creditors = last.creditors.len(),
        debtors = last.debtors.len(),
        instructions = last.instructions.len(),
        "optimized settlements"
    );

    Ok(last.instructions.into_iter().collect())
}

pub fn optimize(sheet: &BalanceSheet) -> Result<Vec<SettlementInstruction>> {
    optimize_with_epsilon(sheet, DEFAULT_EPSILON)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{optimize, optimize_with_epsilon, walk, DEFAULT_EPSILON};
    use crate::error::Error;
    use crate::types::{BalanceSheet, MonetaryAmount, ParticipantId, SettlementInstruction};

    fn sheet(entries: &[(u32, i64)]) -> BalanceSheet {
        entries
            .iter()
            .map(|(id, v)| (ParticipantId::new(*id), MonetaryAmount::new(Decimal::from(*v))))
            .collect()
    }

    fn instruction(from: u32, to: u32, v: i64) -> SettlementInstruction {
        SettlementInstruction {
            from: ParticipantId::new(from),
            to: ParticipantId::new(to),
            amount: MonetaryAmount::new(Decimal::from(v)),
        }
    }

    #[test]
    fn default_epsilon_is_one_cent() {
        assert_eq!(DEFAULT_EPSILON, Decimal::new(1, 2));
    }

    #[test]
    fn empty_sheet_needs_no_settlement() {
        assert!(optimize(&BalanceSheet::default()).unwrap().is_empty());
    }

    #[test]
    fn single_creditor_is_paid_by_each_debtor() {
        let result = optimize(&sheet(&[(1, 60), (2, -30), (3, -30)])).unwrap();
        assert_eq!(result, vec![instruction(2, 1, 30), instruction(3, 1, 30)]);
    }

    #[test]
    fn settled_participant_is_excluded() {
        let result = optimize(&sheet(&[(1, 30), (2, 0), (3, -30)])).unwrap();
        assert_eq!(result, vec![instruction(3, 1, 30)]);
    }

    #[test]
    fn single_debtor_pays_two_creditors_in_two_transfers() {
        let result = optimize(&sheet(&[(1, 50), (2, 50), (3, -100)])).unwrap();
        assert_eq!(result, vec![instruction(3, 1, 50), instruction(3, 2, 50)]);
    }

    #[test]
    fn largest_balances_are_matched_first() {
        let result = optimize(&sheet(&[(1, 10), (2, 70), (3, -20), (4, -60)])).unwrap();
        assert_eq!(
            result,
            vec![
                instruction(4, 2, 60),
                instruction(3, 2, 10),
                instruction(3, 1, 10),
            ]
        );
    }

    #[test]
    fn equal_amounts_are_ordered_by_participant_id() {
        let result = optimize(&sheet(&[(9, -25), (4, 25), (7, -25), (2, 25)])).unwrap();
        assert_eq!(result, vec![instruction(7, 2, 25), instruction(9, 4, 25)]);
    }

    #[test]
    fn near_zero_balances_are_ignored() {
        let sheet: BalanceSheet = [
            (ParticipantId::new(1), MonetaryAmount::new(Decimal::new(5000, 2))),
            (ParticipantId::new(2), MonetaryAmount::new(Decimal::new(-4999, 2))),
            (ParticipantId::new(3), MonetaryAmount::new(Decimal::new(-1, 2))),
        ]
        .into_iter()
        .collect();

        let result = optimize(&sheet).unwrap();

        assert_eq!(
            result,
            vec![SettlementInstruction {
                from: ParticipantId::new(2),
                to: ParticipantId::new(1),
                amount: MonetaryAmount::new(Decimal::new(4999, 2)),
            }]
        );
    }

    #[test]
    fn unbalanced_sheet_is_a_data_integrity_error() {
        let result = optimize(&sheet(&[(1, 60), (2, -30)]));
        assert!(matches!(result, Err(Error::DataIntegrity { .. })));
    }

    #[test]
    fn residual_within_tolerance_is_dropped() {
        let sheet: BalanceSheet = [
            (ParticipantId::new(1), MonetaryAmount::new(Decimal::new(3002, 2))),
            (ParticipantId::new(2), MonetaryAmount::new(Decimal::from(-30))),
        ]
        .into_iter()
        .collect();

        let result = optimize(&sheet).unwrap();

        assert_eq!(result, vec![instruction(2, 1, 30)]);
    }

    #[test]
    fn larger_epsilon_suppresses_small_transfers() {
        let result =
            optimize_with_epsilon(&sheet(&[(1, 3), (2, -3)]), Decimal::from(5)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn zero_epsilon_is_rejected() {
        let result = optimize_with_epsilon(&sheet(&[(1, 30), (2, -30)]), Decimal::ZERO);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn negative_epsilon_is_rejected() {
        let result = optimize_with_epsilon(&sheet(&[(1, 30), (2, -30)]), Decimal::new(-1, 2));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn walk_emits_at_most_one_instruction_per_step() {
        let sheet = sheet(&[(1, 40), (2, 25), (3, -35), (4, -30)]);

        let states: Vec<_> = walk(&sheet, DEFAULT_EPSILON).collect();

        states.windows(2).for_each(|pair| {
            let grown = pair[1].instructions.len() - pair[0].instructions.len();
            assert!(grown <= 1);
            assert!(pair[1].creditor_cursor >= pair[0].creditor_cursor);
            assert!(pair[1].debtor_cursor >= pair[0].debtor_cursor);
        });

        let last = states.last().unwrap();
        assert_eq!(last.creditor_cursor, last.creditors.len());
        assert_eq!(last.debtor_cursor, last.debtors.len());
        assert_eq!(last.residual(), Decimal::ZERO);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let sheet = sheet(&[(5, 12), (3, 12), (8, -8), (1, -8), (2, -8)]);
        assert_eq!(optimize(&sheet).unwrap(), optimize(&sheet).unwrap());
    }
}
