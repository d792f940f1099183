use uuid::Uuid;

use crate::money::Cents;

/// Distribute `pool` cents across users in proportion to their weights,
/// preserving the pool exactly.
///
/// Largest-remainder method over exact integer arithmetic: each user gets the
/// floor of their proportional share, then the leftover cents go one each to
/// the largest fractional remainders, ties broken by input order. The output
/// keeps the input order and covers every input key.
pub fn allocate_proportionally(weights: &[(Uuid, Cents)], pool: Cents) -> Vec<(Uuid, Cents)> {
    let total: i128 = weights.iter().map(|(_, w)| *w as i128).sum();
    if pool == 0 || total == 0 {
        return weights.iter().map(|(id, _)| (*id, 0)).collect();
    }

    let mut allocated: Vec<(Uuid, Cents)> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(weights.len());
    let mut assigned: i128 = 0;

    for (idx, (id, weight)) in weights.iter().enumerate() {
        let exact_num = pool as i128 * *weight as i128;
        let floor = exact_num.div_euclid(total);
        let remainder = exact_num.rem_euclid(total);
        allocated.push((*id, floor as Cents));
        remainders.push((idx, remainder));
        assigned += floor;
    }

    // Stable sort keeps input order between equal remainders.
    remainders.sort_by(|a, b| b.1.cmp(&a.1));

    let mut deficit = (pool as i128 - assigned) as i64;
    for (idx, _) in &remainders {
        if deficit <= 0 {
            break;
        }
        allocated[*idx].1 += 1;
        deficit -= 1;
    }

    // Exact integer math leaves no slack; if it ever did, the first user absorbs it.
    if deficit > 0 {
        if let Some(first) = allocated.first_mut() {
            first.1 += deficit;
        }
    }

    allocated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn amounts(result: &[(Uuid, Cents)]) -> Vec<Cents> {
        result.iter().map(|(_, c)| *c).collect()
    }

    #[test]
    fn zero_pool_allocates_zeros() {
        let u = ids(3);
        let weights = vec![(u[0], 100), (u[1], 200), (u[2], 300)];
        let result = allocate_proportionally(&weights, 0);
        assert_eq!(amounts(&result), vec![0, 0, 0]);
    }

    #[test]
    fn zero_weights_allocate_zeros() {
        let u = ids(2);
        let weights = vec![(u[0], 0), (u[1], 0)];
        let result = allocate_proportionally(&weights, 500);
        assert_eq!(amounts(&result), vec![0, 0]);
    }

    #[test]
    fn even_weights_split_evenly() {
        let u = ids(3);
        let weights = vec![(u[0], 100), (u[1], 100), (u[2], 100)];
        let result = allocate_proportionally(&weights, 600);
        assert_eq!(amounts(&result), vec![200, 200, 200]);
    }

    #[test]
    fn remainder_cents_go_to_largest_remainders_in_input_order() {
        // Tax of 5 cents over subtotals 334/333/333: exact shares are
        // 1.67/1.665/1.665, floors 1/1/1, so two extra cents land on the
        // first two entries.
        let u = ids(3);
        let weights = vec![(u[0], 334), (u[1], 333), (u[2], 333)];
        let result = allocate_proportionally(&weights, 5);
        assert_eq!(amounts(&result), vec![2, 2, 1]);
    }

    #[test]
    fn sum_is_preserved_for_awkward_ratios() {
        let u = ids(3);
        let weights = vec![(u[0], 1), (u[1], 1), (u[2], 1)];
        for pool in [1, 2, 7, 100, 101, 9999] {
            let result = allocate_proportionally(&weights, pool);
            assert_eq!(amounts(&result).iter().sum::<Cents>(), pool);
            assert!(result.iter().all(|(_, c)| *c >= 0));
        }
    }

    #[test]
    fn covers_every_key_in_input_order() {
        let u = ids(4);
        let weights: Vec<_> = u.iter().map(|id| (*id, 250)).collect();
        let result = allocate_proportionally(&weights, 10);
        let out_ids: Vec<_> = result.iter().map(|(id, _)| *id).collect();
        assert_eq!(out_ids, u);
    }

    #[test]
    fn scaling_weights_and_pool_scales_allocation() {
        let u = ids(3);
        let weights = vec![(u[0], 3), (u[1], 5), (u[2], 7)];
        let base = allocate_proportionally(&weights, 15);
        let scaled_weights: Vec<_> = weights.iter().map(|(id, w)| (*id, w * 4)).collect();
        let scaled = allocate_proportionally(&scaled_weights, 60);
        for (b, s) in base.iter().zip(scaled.iter()) {
            assert_eq!(b.1 * 4, s.1);
        }
    }

    #[test]
    fn zero_weight_user_gets_nothing() {
        let u = ids(3);
        let weights = vec![(u[0], 0), (u[1], 100), (u[2], 100)];
        let result = allocate_proportionally(&weights, 101);
        assert_eq!(result[0].1, 0);
        assert_eq!(amounts(&result).iter().sum::<Cents>(), 101);
    }
}
