//! Share computation for both expense shapes.
//!
//! Everything here is integer-cent arithmetic; the persistence layer and the
//! membership checks live in the handlers. The guarantee that matters: the
//! per-user shares of a computed expense always sum to its total, exactly.

use uuid::Uuid;

use crate::allocator::allocate_proportionally;
use crate::error::AppError;
use crate::expenses::dto::{ItemInput, SplitInput, TipInput};
use crate::money::{from_cents, to_cents, Cents, CENT_TOLERANCE};

pub struct ComputedItem {
    pub name: String,
    pub price: Cents,
    pub assignees: Vec<Uuid>,
}

pub struct ComputedExpense {
    pub subtotal: Cents,
    pub tax: Cents,
    pub tip: Cents,
    pub total: Cents,
    /// Final per-user shares in first-appearance order.
    pub shares: Vec<(Uuid, Cents)>,
    /// Empty for simple splits.
    pub items: Vec<ComputedItem>,
}

/// Simple split: a flat amount with caller-provided shares that must add up.
pub fn compute_simple(amount: f64, splits: &[SplitInput]) -> Result<ComputedExpense, AppError> {
    let amount_c = to_cents(amount);
    if amount_c <= 0 {
        return Err(AppError::Validation("amount must be positive".into()));
    }
    if splits.is_empty() {
        return Err(AppError::Validation("splits must be non-empty".into()));
    }

    let mut shares: Vec<(Uuid, Cents)> = Vec::with_capacity(splits.len());
    let mut sum: Cents = 0;
    for split in splits {
        let share_c = to_cents(split.share);
        if share_c <= 0 {
            return Err(AppError::Validation("shares must be positive".into()));
        }
        if shares.iter().any(|(id, _)| *id == split.user_id) {
            return Err(AppError::Validation("duplicate user in splits".into()));
        }
        shares.push((split.user_id, share_c));
        sum += share_c;
    }

    if (sum - amount_c).abs() > CENT_TOLERANCE {
        return Err(AppError::Validation(format!(
            "splits sum to {} but amount is {}",
            from_cents(sum),
            from_cents(amount_c)
        )));
    }

    Ok(ComputedExpense {
        subtotal: amount_c,
        tax: 0,
        tip: 0,
        total: amount_c,
        shares,
        items: vec![],
    })
}

/// Itemized receipt: divide each item evenly among its assignees, then
/// allocate tax and tip proportionally to the per-user item subtotals.
pub fn compute_itemized(
    items: &[ItemInput],
    tax: f64,
    tip: Option<&TipInput>,
) -> Result<ComputedExpense, AppError> {
    if items.is_empty() {
        return Err(AppError::Validation("items must be non-empty".into()));
    }
    if tax < 0.0 {
        return Err(AppError::Validation("tax must be non-negative".into()));
    }

    // Per-user item subtotals, in first-appearance order.
    let mut user_subtotals: Vec<(Uuid, Cents)> = Vec::new();
    let mut computed_items: Vec<ComputedItem> = Vec::with_capacity(items.len());
    let mut subtotal_c: Cents = 0;

    for item in items {
        if item.name.trim().is_empty() {
            return Err(AppError::Validation("item name must be non-empty".into()));
        }
        let price_c = to_cents(item.price);
        if price_c <= 0 {
            return Err(AppError::Validation("item prices must be positive".into()));
        }
        if item.assigned_user_ids.is_empty() {
            return Err(AppError::Validation(format!(
                "item '{}' has no assigned users",
                item.name
            )));
        }

        let n = item.assigned_user_ids.len() as Cents;
        let base = price_c / n;
        let extra = price_c - base * n;

        for (idx, user_id) in item.assigned_user_ids.iter().enumerate() {
            // First `extra` assignees carry the leftover cents.
            let portion = base + if (idx as Cents) < extra { 1 } else { 0 };
            match user_subtotals.iter_mut().find(|(id, _)| id == user_id) {
                Some((_, sub)) => *sub += portion,
                None => user_subtotals.push((*user_id, portion)),
            }
        }

        subtotal_c += price_c;
        computed_items.push(ComputedItem {
            name: item.name.trim().to_string(),
            price: price_c,
            assignees: item.assigned_user_ids.clone(),
        });
    }

    let tax_c = to_cents(tax);
    let tip_c = match tip {
        Some(TipInput::Amount(value)) => {
            if *value < 0.0 {
                return Err(AppError::Validation("tip must be non-negative".into()));
            }
            to_cents(*value)
        }
        Some(TipInput::Percent(value)) => {
            if *value < 0.0 {
                return Err(AppError::Validation("tip must be non-negative".into()));
            }
            to_cents(value / 100.0 * from_cents(subtotal_c))
        }
        None => 0,
    };

    let tax_alloc = allocate_proportionally(&user_subtotals, tax_c);
    let tip_alloc = allocate_proportionally(&user_subtotals, tip_c);

    let mut shares: Vec<(Uuid, Cents)> = user_subtotals
        .iter()
        .zip(tax_alloc.iter())
        .zip(tip_alloc.iter())
        .map(|(((id, sub), (_, tax_share)), (_, tip_share))| (*id, sub + tax_share + tip_share))
        .collect();

    let total_c = subtotal_c + tax_c + tip_c;

    // Exact allocation should already land on the total; if a cent slipped,
    // the user with the largest item subtotal absorbs it.
    let share_sum: Cents = shares.iter().map(|(_, s)| *s).sum();
    if share_sum != total_c {
        let delta = total_c - share_sum;
        let (largest_idx, _) = user_subtotals
            .iter()
            .enumerate()
            .max_by_key(|&(idx, &(_, sub))| (sub, std::cmp::Reverse(idx)))
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("no users after allocation")))?;
        shares[largest_idx].1 += delta;
    }

    Ok(ComputedExpense {
        subtotal: subtotal_c,
        tax: tax_c,
        tip: tip_c,
        total: total_c,
        shares,
        items: computed_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn item(name: &str, price: f64, assignees: &[Uuid]) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            price,
            assigned_user_ids: assignees.to_vec(),
        }
    }

    #[test]
    fn simple_split_accepts_matching_shares() {
        let u = ids(2);
        let splits = vec![
            SplitInput { user_id: u[0], share: 6.0 },
            SplitInput { user_id: u[1], share: 4.0 },
        ];
        let computed = compute_simple(10.0, &splits).expect("valid split");
        assert_eq!(computed.total, 1000);
        assert_eq!(computed.subtotal, 1000);
        assert_eq!(computed.tax, 0);
        assert_eq!(computed.tip, 0);
        assert_eq!(computed.shares, vec![(u[0], 600), (u[1], 400)]);
    }

    #[test]
    fn simple_split_tolerates_one_cent() {
        let u = ids(3);
        let splits = vec![
            SplitInput { user_id: u[0], share: 3.33 },
            SplitInput { user_id: u[1], share: 3.33 },
            SplitInput { user_id: u[2], share: 3.33 },
        ];
        // 9.99 vs 10.00 is within tolerance
        assert!(compute_simple(10.0, &splits).is_ok());
    }

    #[test]
    fn simple_split_rejects_mismatch() {
        let u = ids(2);
        let splits = vec![
            SplitInput { user_id: u[0], share: 5.0 },
            SplitInput { user_id: u[1], share: 4.0 },
        ];
        assert!(matches!(
            compute_simple(10.0, &splits),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn simple_split_rejects_duplicate_user() {
        let u = ids(1);
        let splits = vec![
            SplitInput { user_id: u[0], share: 5.0 },
            SplitInput { user_id: u[0], share: 5.0 },
        ];
        assert!(compute_simple(10.0, &splits).is_err());
    }

    #[test]
    fn even_three_way_dinner_with_percent_tip() {
        let u = ids(3);
        let items = vec![item("Pizza", 30.0, &u)];
        let computed =
            compute_itemized(&items, 0.0, Some(&TipInput::Percent(20.0))).expect("valid");
        assert_eq!(computed.subtotal, 3000);
        assert_eq!(computed.tax, 0);
        assert_eq!(computed.tip, 600);
        assert_eq!(computed.total, 3600);
        assert_eq!(
            computed.shares,
            vec![(u[0], 1200), (u[1], 1200), (u[2], 1200)]
        );
    }

    #[test]
    fn penny_distribution_on_item_and_tax() {
        let u = ids(3);
        let items = vec![item("Bread", 10.0, &u)];
        let computed = compute_itemized(&items, 0.05, None).expect("valid");
        // Item cents 334/333/333, tax cents 2/2/1
        assert_eq!(computed.shares, vec![(u[0], 336), (u[1], 335), (u[2], 334)]);
        assert_eq!(computed.total, 1005);
        assert_eq!(
            computed.shares.iter().map(|(_, s)| s).sum::<Cents>(),
            computed.total
        );
    }

    #[test]
    fn single_assignee_takes_full_price() {
        let u = ids(2);
        let items = vec![
            item("Steak", 25.0, &u[..1]),
            item("Salad", 10.0, &u[1..]),
        ];
        let computed = compute_itemized(&items, 0.0, None).expect("valid");
        assert_eq!(computed.shares, vec![(u[0], 2500), (u[1], 1000)]);
    }

    #[test]
    fn fixed_amount_tip_allocates_proportionally() {
        let u = ids(2);
        let items = vec![
            item("Pasta", 30.0, &u[..1]),
            item("Soup", 10.0, &u[1..]),
        ];
        let computed =
            compute_itemized(&items, 0.0, Some(&TipInput::Amount(4.0))).expect("valid");
        assert_eq!(computed.tip, 400);
        // 30/40 and 10/40 of 400 cents
        assert_eq!(computed.shares, vec![(u[0], 3300), (u[1], 1100)]);
    }

    #[test]
    fn shares_always_sum_to_total() {
        let u = ids(3);
        let items = vec![
            item("A", 7.77, &u),
            item("B", 3.01, &u[..2]),
            item("C", 0.99, &u[2..]),
        ];
        let computed =
            compute_itemized(&items, 1.13, Some(&TipInput::Percent(17.5))).expect("valid");
        assert_eq!(
            computed.shares.iter().map(|(_, s)| s).sum::<Cents>(),
            computed.total
        );
        assert!(computed.shares.iter().all(|(_, s)| *s >= 0));
    }

    #[test]
    fn repeated_assignee_accumulates_across_items() {
        let u = ids(2);
        let items = vec![
            item("Burger", 12.0, &u),
            item("Fries", 4.0, &u[..1]),
        ];
        let computed = compute_itemized(&items, 0.0, None).expect("valid");
        assert_eq!(computed.shares, vec![(u[0], 1000), (u[1], 600)]);
    }

    #[test]
    fn empty_items_rejected() {
        assert!(matches!(
            compute_itemized(&[], 0.0, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn item_without_assignees_rejected() {
        let items = vec![item("Orphan", 5.0, &[])];
        assert!(compute_itemized(&items, 0.0, None).is_err());
    }

    #[test]
    fn non_positive_price_rejected() {
        let u = ids(1);
        assert!(compute_itemized(&[item("Free", 0.0, &u)], 0.0, None).is_err());
        assert!(compute_itemized(&[item("Refund", -2.0, &u)], 0.0, None).is_err());
    }
}
