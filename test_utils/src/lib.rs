use std::{collections::HashMap, str};

use serde::Serialize;

#[derive(Serialize)]
struct BalanceRow {
    participant: &'static str,
    name: &'static str,
    balance: &'static str,
}

#[derive(Serialize)]
struct SettlementRow {
    from: &'static str,
    from_name: &'static str,
    to: &'static str,
    to_name: &'static str,
    amount: &'static str,
}

// Only used during testing so no need to return result
fn write_rows<T: Serialize>(rows: Vec<T>) -> String {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for r in rows {
        wtr.serialize(r).unwrap();
    }
    wtr.flush().unwrap();
    String::from_utf8(wtr.into_inner().unwrap()).unwrap()
}

/// Builds the expected two-block report.
///
/// An empty block still needs its header, which serializing zero rows does not
/// produce, so headers are written explicitly in that case.
pub fn create_report(
    balances: Vec<[&'static str; 3]>,
    settlements: Vec<[&'static str; 5]>,
) -> String {
    let balance_block = if balances.is_empty() {
        String::from("participant,name,balance\n")
    } else {
        write_rows(
            balances
                .into_iter()
                .map(|r| BalanceRow {
                    participant: r[0],
                    name: r[1],
                    balance: r[2],
                })
                .collect(),
        )
    };
    let settlement_block = if settlements.is_empty() {
        String::from("from,from_name,to,to_name,amount\n")
    } else {
        write_rows(
            settlements
                .into_iter()
                .map(|r| SettlementRow {
                    from: r[0],
                    from_name: r[1],
                    to: r[2],
                    to_name: r[3],
                    amount: r[4],
                })
                .collect(),
        )
    };
    format!("{}\n{}", balance_block, settlement_block)
}

fn split_to_dict(block: &str) -> HashMap<String, String> {
    block
        .lines()
        .skip(1) // ignore row titles
        .filter(|line| !line.is_empty())
        .map(|line| {
            (
                line.split(',').next().unwrap().to_string(),
                line.to_string(),
            )
        })
        .collect()
}

// Balance rows are keyed by participant, so their order can be ignored when a
// test only cares about the values
pub fn assert_balances_unsorted_eq(s1: &str, s2: &str) {
    let block = |s: &str| s.split("\n\n").next().unwrap_or("").to_string();
    let sut1 = split_to_dict(&block(s1));
    let sut2 = split_to_dict(&block(s2));
    if sut1.len() != sut2.len() {
        panic!("balance blocks do not contain the same number of rows");
    }

    sut1.iter().for_each(|(k, v)| match sut2.get(k) {
        Some(row) => assert_eq!(row, v),
        None => panic!("participant {} not found in both reports", k),
    })
}
