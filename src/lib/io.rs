use std::{fs::File, path::Path};

use ::serde::{de::DeserializeOwned, Deserialize, Serialize};
use rust_decimal::Decimal;

use crate::confirmations::PaymentConfirmation;
use crate::error::{Error, Result};
use crate::splits::Expense;
use crate::types::{
    BalanceSheet, MonetaryAmount, Participant, ParticipantId, Roster, SettlementInstruction,
};

#[derive(Debug, Deserialize)]
pub struct ExpenseRowEntity {
    pub expense: u32,
    pub payer: u32,
    pub amount: Decimal,
    /// Space separated participant ids.
    pub split_with: String,
}

impl ExpenseRowEntity {
    fn into_domain(self) -> Result<Expense> {
        let split_with = self
            .split_with
            .split_whitespace()
            .map(|id| {
                id.parse::<u32>().map(ParticipantId::new).map_err(|_| {
                    Error::invalid(format!(
                        "expense {} has malformed participant '{}'",
                        self.expense, id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Expense {
            id: self.expense,
            payer: ParticipantId::new(self.payer),
            amount: MonetaryAmount::new(self.amount),
            split_with,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentRowEntity {
    pub confirmation: u32,
    pub from: u32,
    pub to: u32,
    pub amount: Decimal,
    pub confirmed_by: Option<u32>,
    pub slip_url: Option<String>,
}

impl PaymentRowEntity {
    fn into_domain(self) -> Result<PaymentConfirmation> {
        let proposed = PaymentConfirmation::propose(
            self.confirmation,
            ParticipantId::new(self.from),
            ParticipantId::new(self.to),
            MonetaryAmount::new(self.amount),
            self.slip_url,
        )?;
        match self.confirmed_by {
            Some(by) => proposed.confirm(ParticipantId::new(by)),
            None => Ok(proposed),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParticipantRowEntity {
    pub participant: u32,
    pub name: String,
}

impl ParticipantRowEntity {
    fn into_domain(self) -> Participant {
        Participant::new(ParticipantId::new(self.participant), self.name)
    }
}

fn fixed_scale(amount: MonetaryAmount, scale: u32) -> Decimal {
    let mut value = amount.value();
    value.rescale(scale);
    // never print "-0.00"
    if value.is_zero() {
        value.set_sign_positive(true);
    }
    value
}

#[derive(Debug, Serialize)]
pub struct BalanceEntity {
    participant: u32,
    name: String,
    balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SettlementEntity {
    from: u32,
    from_name: String,
    to: u32,
    to_name: String,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ReportEntity {
    balances: Vec<BalanceEntity>,
    settlements: Vec<SettlementEntity>,
}

impl ReportEntity {
    pub fn from_domain(
        sheet: &BalanceSheet,
        settlements: &[SettlementInstruction],
        roster: &Roster,
        scale: u32,
    ) -> Self {
        Self {
            balances: sheet
                .balances()
                .into_iter()
                .map(|b| BalanceEntity {
                    participant: b.participant.value(),
                    name: roster.name(&b.participant).to_string(),
                    balance: fixed_scale(b.net, scale),
                })
                .collect(),
            settlements: settlements
                .iter()
                .map(|s| SettlementEntity {
                    from: s.from.value(),
                    from_name: roster.name(&s.from).to_string(),
                    to: s.to.value(),
                    to_name: roster.name(&s.to).to_string(),
                    amount: fixed_scale(s.amount, scale),
                })
                .collect(),
        }
    }
}

fn read_csv<T: DeserializeOwned>(csv_path: &Path) -> Result<Vec<T>> {
    let file = File::open(csv_path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    // fail on the first bad row, no point in an incomplete ledger
    reader
        .deserialize::<T>()
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn read_expenses(csv_path: &Path) -> Result<Vec<Expense>> {
    read_csv::<ExpenseRowEntity>(csv_path)?
        .into_iter()
        .map(ExpenseRowEntity::into_domain)
        .collect()
}

pub fn read_payments(csv_path: &Path) -> Result<Vec<PaymentConfirmation>> {
    read_csv::<PaymentRowEntity>(csv_path)?
        .into_iter()
        .map(PaymentRowEntity::into_domain)
        .collect()
}

pub fn read_roster(csv_path: &Path) -> Result<Roster> {
    Ok(read_csv::<ParticipantRowEntity>(csv_path)?
        .into_iter()
        .map(ParticipantRowEntity::into_domain)
        .collect())
}

const BALANCE_HEADER: [&str; 3] = ["participant", "name", "balance"];
const SETTLEMENT_HEADER: [&str; 5] = ["from", "from_name", "to", "to_name", "amount"];

// header is written by hand so that an empty block still carries it
fn write_rows<T: Serialize>(header: &[&str], rows: &[T]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);

    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?
    }

    wtr.flush()?;
    let bytes = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::Encoding(e.to_string()))
}

/// Balances block, a blank line, then the settlements block.
pub fn output_csv(report: &ReportEntity) -> Result<String> {
    let balances = write_rows(&BALANCE_HEADER, &report.balances)?;
    let settlements = write_rows(&SETTLEMENT_HEADER, &report.settlements)?;
    Ok(format!("{balances}\n{settlements}"))
}

pub fn output_json(report: &ReportEntity) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
