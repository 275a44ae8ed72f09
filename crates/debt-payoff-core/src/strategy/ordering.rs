use crate::types::{Debt, Strategy};

/// Order a portfolio by payoff priority under the given strategy.
///
/// A pure sort: the input is never mutated. Settled (zero-balance) debts are
/// excluded; they stay in reporting as settled but never receive budget.
/// Snowball orders ascending by current balance, avalanche descending by APR.
/// Ties break ascending by id, so a portfolio orders identically regardless
/// of input order.
pub fn order(debts: &[Debt], strategy: Strategy) -> Vec<Debt> {
    let mut open: Vec<Debt> = debts
        .iter()
        .filter(|d| d.current_balance > 0)
        .cloned()
        .collect();

    open.sort_by(|a, b| match strategy {
        Strategy::Snowball => a
            .current_balance
            .cmp(&b.current_balance)
            .then(a.id.cmp(&b.id)),
        Strategy::Avalanche => b.apr.cmp(&a.apr).then(a.id.cmp(&b.id)),
    });

    open
}
