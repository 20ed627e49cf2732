use crate::optimizer::population::Candidate;

/// Union crossover: the child holds every line of either parent.
pub fn crossover_union(a: &Candidate, b: &Candidate) -> Candidate {
    Candidate::from_sorted(merge_sorted(a.lines(), b.lines()))
}

/// Merges two sorted, duplicate-free index lists into one.
pub fn merge_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn union_collapses_shared_lines() {
        let a = Candidate::new(vec![1, 2, 3]);
        let b = Candidate::new(vec![3, 4, 9]);
        let child = crossover_union(&a, &b);
        assert_eq!(child.lines(), &[1, 2, 3, 4, 9]);
        assert_eq!(child.fitness, 0.0);
    }

    #[test]
    fn union_with_self_is_identity() {
        let a = Candidate::new(vec![5, 6]);
        assert_eq!(crossover_union(&a, &a).lines(), a.lines());
    }

    proptest! {
        #[test]
        fn prop_union_matches_set_union(
            a in prop::collection::btree_set(0usize..200, 0..30),
            b in prop::collection::btree_set(0usize..200, 0..30),
        ) {
            let ca = Candidate::new(a.iter().copied().collect());
            let cb = Candidate::new(b.iter().copied().collect());
            let child = crossover_union(&ca, &cb);

            let expected: Vec<usize> = a.union(&b).copied().collect::<BTreeSet<_>>().into_iter().collect();
            prop_assert_eq!(child.lines(), expected.as_slice());
        }
    }
}
