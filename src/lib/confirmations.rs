use crate::error::{Error, Result};
use crate::types::{ConfirmedSettlement, MonetaryAmount, ParticipantId};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfirmationStatus {
    /// Proposed by the payer, not yet acknowledged. Never affects balances.
    Pending,
    /// Acknowledged by the receiving participant.
    Confirmed { by: ParticipantId },
}

/// A peer-to-peer payment reported by its sender, optionally with a proof image URL.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PaymentConfirmation {
    pub id: u32,
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: MonetaryAmount,
    pub slip_url: Option<String>,
    pub status: ConfirmationStatus,
}

impl PaymentConfirmation {
    pub fn propose(
        id: u32,
        from: ParticipantId,
        to: ParticipantId,
        amount: MonetaryAmount,
        slip_url: Option<String>,
    ) -> Result<Self> {
        if from.is_unset() || to.is_unset() {
            return Err(Error::invalid(format!(
                "payment {id} references an unset participant"
            )));
        }
        if from == to {
            return Err(Error::invalid(format!(
                "payment {id} is addressed to its own sender"
            )));
        }
        if !amount.is_positive() {
            return Err(Error::invalid(format!(
                "payment {id} has non-positive amount {amount}"
            )));
        }
        Ok(Self {
            id,
            from,
            to,
            amount,
            slip_url,
            status: ConfirmationStatus::Pending,
        })
    }

    /// Marks the payment as received. Only the receiving participant may confirm, once.
    pub fn confirm(self, by: ParticipantId) -> Result<Self> {
        if let ConfirmationStatus::Confirmed { .. } = self.status {
            return Err(Error::AlreadyConfirmed(self.id));
        }
        if by != self.to {
            return Err(Error::NotRecipient {
                confirmation: self.id,
                by,
                to: self.to,
            });
        }
        Ok(Self {
            status: ConfirmationStatus::Confirmed { by },
            ..self
        })
    }

    /// Rejects amounts finer than the currency's minor unit.
    pub fn check_scale(&self, scale: u32) -> Result<()> {
        let amount = self.amount.value();
        if amount.round_dp(scale) != amount {
            return Err(Error::invalid(format!(
                "payment {} amount {} has more than {} decimal places",
                self.id, amount, scale
            )));
        }
        Ok(())
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, ConfirmationStatus::Confirmed { .. })
    }
}

/// Keeps only confirmed payments, in input order.
pub fn confirmed_settlements<'a, I>(confirmations: I) -> Vec<ConfirmedSettlement>
where
    I: IntoIterator<Item = &'a PaymentConfirmation>,
{
    confirmations
        .into_iter()
        .filter(|c| c.is_confirmed())
        .map(|c| ConfirmedSettlement {
            from: c.from,
            to: c.to,
            amount: c.amount,
        })
        .collect()
}
