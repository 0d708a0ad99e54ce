use crate::common::Hit;

/// Remove hits that overlap a higher-scoring hit on the same target and
/// strand. Any shared residue counts as overlap.
///
/// Surviving hits keep their original relative order.
pub fn remove_overlaps(hits: Vec<Hit>) -> Vec<Hit> {
    if hits.len() < 2 {
        return hits;
    }

    let mut order: Vec<usize> = (0..hits.len()).collect();
    order.sort_by(|&a, &b| {
        hits[b]
            .score
            .partial_cmp(&hits[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(hits[a].span().0.cmp(&hits[b].span().0))
    });

    let mut keep = vec![false; hits.len()];
    let mut kept: Vec<usize> = Vec::new();
    for idx in order {
        let hit = &hits[idx];
        let dominated = kept.iter().any(|&k| {
            let other = &hits[k];
            if hit.target != other.target || hit.strand != other.strand {
                return false;
            }
            let (s1, e1) = hit.span();
            let (s2, e2) = other.span();
            calculate_overlap(s1, e1, s2, e2) > 0
        });
        if !dominated {
            keep[idx] = true;
            kept.push(idx);
        }
    }

    hits.into_iter()
        .zip(keep)
        .filter_map(|(h, k)| k.then_some(h))
        .collect()
}

/// Residues shared by two inclusive intervals.
pub fn calculate_overlap(start1: usize, end1: usize, start2: usize, end2: usize) -> usize {
    let overlap_start = start1.max(start2);
    let overlap_end = end1.min(end2);

    if overlap_start <= overlap_end {
        overlap_end - overlap_start + 1
    } else {
        0
    }
}
