use std::collections::HashMap;

use uuid::Uuid;

use crate::money::Cents;

/// Expense as the balance fold sees it: who fronted the money and the final
/// per-user shares.
pub struct ExpenseEntry {
    pub paid_by: Uuid,
    pub total: Cents,
    pub splits: Vec<(Uuid, Cents)>,
}

pub struct PaymentEntry {
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub amount: Cents,
    pub confirmed: bool,
}

/// Fold a trip's ledger into per-user signed balances in cents.
///
/// Positive means others owe the user, negative means the user owes others.
/// Every expense and every confirmed payment is zero-sum, so the balances
/// always sum to zero. Pending and declined payments do not move money.
pub fn compute_balances(
    members: &[Uuid],
    expenses: &[ExpenseEntry],
    payments: &[PaymentEntry],
) -> HashMap<Uuid, Cents> {
    let mut balances: HashMap<Uuid, Cents> = members.iter().map(|id| (*id, 0)).collect();

    for expense in expenses {
        *balances.entry(expense.paid_by).or_insert(0) += expense.total;
        for (user_id, share) in &expense.splits {
            *balances.entry(*user_id).or_insert(0) -= share;
        }
    }

    for payment in payments {
        if !payment.confirmed {
            continue;
        }
        *balances.entry(payment.from_user).or_insert(0) += payment.amount;
        *balances.entry(payment.to_user).or_insert(0) -= payment.amount;
    }

    balances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn empty_trip_is_all_zero() {
        let u = ids(3);
        let balances = compute_balances(&u, &[], &[]);
        assert!(balances.values().all(|b| *b == 0));
        assert_eq!(balances.len(), 3);
    }

    #[test]
    fn three_way_dinner() {
        let u = ids(3);
        let expenses = vec![ExpenseEntry {
            paid_by: u[0],
            total: 3600,
            splits: vec![(u[0], 1200), (u[1], 1200), (u[2], 1200)],
        }];
        let balances = compute_balances(&u, &expenses, &[]);
        assert_eq!(balances[&u[0]], 2400);
        assert_eq!(balances[&u[1]], -1200);
        assert_eq!(balances[&u[2]], -1200);
        assert_eq!(balances.values().sum::<Cents>(), 0);
    }

    #[test]
    fn confirmed_payment_moves_money() {
        let u = ids(3);
        let expenses = vec![ExpenseEntry {
            paid_by: u[0],
            total: 3600,
            splits: vec![(u[0], 1200), (u[1], 1200), (u[2], 1200)],
        }];
        let payments = vec![PaymentEntry {
            from_user: u[1],
            to_user: u[0],
            amount: 1200,
            confirmed: true,
        }];
        let balances = compute_balances(&u, &expenses, &payments);
        assert_eq!(balances[&u[0]], 1200);
        assert_eq!(balances[&u[1]], 0);
        assert_eq!(balances[&u[2]], -1200);
    }

    #[test]
    fn pending_payment_changes_nothing() {
        let u = ids(2);
        let expenses = vec![ExpenseEntry {
            paid_by: u[0],
            total: 1000,
            splits: vec![(u[0], 500), (u[1], 500)],
        }];
        let payments = vec![PaymentEntry {
            from_user: u[1],
            to_user: u[0],
            amount: 500,
            confirmed: false,
        }];
        let balances = compute_balances(&u, &expenses, &payments);
        assert_eq!(balances[&u[0]], 500);
        assert_eq!(balances[&u[1]], -500);
    }

    #[test]
    fn balances_always_sum_to_zero() {
        let u = ids(4);
        let expenses = vec![
            ExpenseEntry {
                paid_by: u[0],
                total: 1005,
                splits: vec![(u[0], 336), (u[1], 335), (u[2], 334)],
            },
            ExpenseEntry {
                paid_by: u[3],
                total: 777,
                splits: vec![(u[1], 259), (u[2], 259), (u[3], 259)],
            },
        ];
        let payments = vec![PaymentEntry {
            from_user: u[2],
            to_user: u[0],
            amount: 300,
            confirmed: true,
        }];
        let balances = compute_balances(&u, &expenses, &payments);
        assert_eq!(balances.values().sum::<Cents>(), 0);
    }
}
