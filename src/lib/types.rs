use std::{
    fmt,
    iter::Sum,
    ops::{Add, Neg, Sub},
};

use im::OrdMap;
use rust_decimal::Decimal;

/// Identifier of a group member. Zero is reserved for an unset reference.
#[derive(Default, Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Debug)]
pub struct ParticipantId(u32);

impl ParticipantId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Display names for the participants of one computation.
#[derive(Default, Clone, Debug)]
pub struct Roster(OrdMap<ParticipantId, String>);

impl Roster {
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.0.contains_key(id)
    }

    /// Unknown participants render with an empty name.
    pub fn name(&self, id: &ParticipantId) -> &str {
        self.0.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Participant> for Roster {
    fn from_iter<I: IntoIterator<Item = Participant>>(iter: I) -> Self {
        Self(iter.into_iter().map(|p| (p.id, p.name)).collect())
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MonetaryAmount(Decimal);

impl MonetaryAmount {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl From<Decimal> for MonetaryAmount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for MonetaryAmount {
    type Output = MonetaryAmount;

    fn add(self, rhs: Self) -> Self::Output {
        MonetaryAmount(self.value() + rhs.value())
    }
}

impl Sub for MonetaryAmount {
    type Output = MonetaryAmount;

    fn sub(self, rhs: Self) -> Self::Output {
        MonetaryAmount(self.value() - rhs.value())
    }
}

impl Neg for MonetaryAmount {
    type Output = MonetaryAmount;

    fn neg(self) -> Self::Output {
        MonetaryAmount(-self.value())
    }
}

impl Sum for MonetaryAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MonetaryAmount::zero(), |acc, x| acc + x)
    }
}

/// One participant's share of a single expense.
///
/// The debtor is charged `amount` and the payer fronted it. The payer may be
/// its own debtor, in which case the row has no net effect.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExpenseSplit {
    pub payer: ParticipantId,
    pub debtor: ParticipantId,
    pub amount: MonetaryAmount,
}

/// A real-world payment acknowledged by its receiver.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConfirmedSettlement {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: MonetaryAmount,
}

/// Positive `net` means the participant is owed money, negative means they owe.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Balance {
    pub participant: ParticipantId,
    pub net: MonetaryAmount,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SettlementInstruction {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: MonetaryAmount,
}

/// Net balance per participant, always iterated in ascending id order.
#[derive(Default, Clone, PartialEq, Eq, Debug)]
pub struct BalanceSheet(pub OrdMap<ParticipantId, MonetaryAmount>);

impl BalanceSheet {
    pub fn get(&self, id: &ParticipantId) -> Option<MonetaryAmount> {
        self.0.get(id).copied()
    }

    pub fn total(&self) -> MonetaryAmount {
        self.0.values().copied().sum()
    }

    pub fn balances(&self) -> Vec<Balance> {
        self.0
            .iter()
            .map(|(participant, net)| Balance {
                participant: *participant,
                net: *net,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ParticipantId, MonetaryAmount)> for BalanceSheet {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, MonetaryAmount)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
