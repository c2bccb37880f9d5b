mod balances;
mod confirmations;
mod error;
mod io;
mod optimizer;
mod settings;
mod splits;
mod types;
mod utils;

use std::path::PathBuf;

pub use balances::compute_balances;
pub use confirmations::{confirmed_settlements, ConfirmationStatus, PaymentConfirmation};
pub use error::{Error, Result};
pub use optimizer::{optimize, optimize_with_epsilon, DEFAULT_EPSILON};
pub use settings::{OutputFormat, Settings};
pub use splits::{split_expense, Expense};
pub use types::{
    Balance, BalanceSheet, ConfirmedSettlement, ExpenseSplit, MonetaryAmount, Participant,
    ParticipantId, Roster, SettlementInstruction,
};

use io::{output_csv, output_json, read_expenses, read_payments, read_roster, ReportEntity};

/// Ledger files for one group.
#[derive(Debug, Clone)]
pub struct GroupFiles {
    pub expenses: PathBuf,
    pub payments: Option<PathBuf>,
    pub participants: Option<PathBuf>,
}

/// Net balances and the transfers that would settle them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub balances: BalanceSheet,
    pub instructions: Vec<SettlementInstruction>,
}

/// Splits every expense, folds in the confirmed payments and optimizes the result.
pub fn settle_group(
    expenses: &[Expense],
    confirmations: &[PaymentConfirmation],
    settings: &Settings,
) -> Result<Settlement> {
    settings.validate()?;
    confirmations
        .iter()
        .try_for_each(|c| c.check_scale(settings.scale))?;

    let splits = expenses
        .iter()
        .map(|e| split_expense(e, settings.scale))
        .collect::<Result<Vec<_>>>()?
        .concat();
    let confirmed = confirmed_settlements(confirmations);

    let balances = compute_balances(&splits, &confirmed)?;
    let instructions = optimize_with_epsilon(&balances, settings.epsilon)?;

    Ok(Settlement {
        balances,
        instructions,
    })
}

fn check_roster(
    roster: &Roster,
    expenses: &[Expense],
    confirmations: &[PaymentConfirmation],
) -> Result<()> {
    if roster.is_empty() {
        return Ok(());
    }
    let expense_refs = expenses
        .iter()
        .flat_map(|e| std::iter::once(e.payer).chain(e.split_with.iter().copied()));
    let payment_refs = confirmations.iter().flat_map(|c| [c.from, c.to]);

    match expense_refs.chain(payment_refs).find(|id| !roster.contains(id)) {
        Some(unknown) => Err(Error::InvalidInput(format!(
            "participant {unknown} is not in the roster"
        ))),
        None => Ok(()),
    }
}

fn prune(balances: &BalanceSheet, settings: &Settings) -> BalanceSheet {
    if !settings.prune_zero_balances {
        return balances.clone();
    }
    balances
        .0
        .iter()
        .filter(|(_, net)| net.value().abs() > settings.epsilon)
        .map(|(id, net)| (*id, *net))
        .collect()
}

pub fn process_group(files: &GroupFiles, settings: &Settings) -> Result<String> {
    let expenses = read_expenses(&files.expenses)?;
    let confirmations = match &files.payments {
        Some(path) => read_payments(path)?,
        None => Vec::new(),
    };
    let roster = match &files.participants {
        Some(path) => read_roster(path)?,
        None => Roster::default(),
    };
    check_roster(&roster, &expenses, &confirmations)?;

    let settlement = settle_group(&expenses, &confirmations, settings)?;

    tracing::info!(
        expenses = expenses.len(),
        payments = confirmations.len(),
        participants = settlement.balances.len(),
        instructions = settlement.instructions.len(),
        "settled group"
    );

    let report = ReportEntity::from_domain(
        &prune(&settlement.balances, settings),
        &settlement.instructions,
        &roster,
        settings.scale,
    );
    match settings.output_format {
        OutputFormat::Csv => output_csv(&report),
        OutputFormat::Json => output_json(&report),
    }
}
