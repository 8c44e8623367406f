//! Height consensus: find the height window most working nodes agree on

use std::ops::RangeInclusive;

use crate::nodes::ConnectionStatus;

/// Window `[h, h + epsilon - 1]` that contains the most reported heights.
///
/// Every reported height is tried as the window start; on equal counts the
/// lowest window wins. Returns None when nothing was reported.
pub fn consensus_window(heights: &[u64], epsilon: u64) -> Option<RangeInclusive<u64>> {
    let mut sorted = heights.to_vec();
    sorted.sort_unstable();

    let span = epsilon.saturating_sub(1);
    let mut best: Option<(usize, RangeInclusive<u64>)> = None;
    let mut end = 0;

    for (start, &low) in sorted.iter().enumerate() {
        let high = low.saturating_add(span);
        // end never moves back: the window upper bound only grows with start
        end = end.max(start);
        while end < sorted.len() && sorted[end] <= high {
            end += 1;
        }

        let count = end - start;
        if best.as_ref().is_none_or(|(best_count, _)| count > *best_count) {
            best = Some((count, low..=high));
        }
    }

    best.map(|(_, window)| window)
}

/// Status a working node gets from the winning window; None without a height
pub fn classify(height: Option<u64>, window: Option<&RangeInclusive<u64>>) -> Option<ConnectionStatus> {
    let height = height?;
    match window {
        Some(window) if window.contains(&height) => Some(ConnectionStatus::Allowed),
        _ => Some(ConnectionStatus::Synchronizing),
    }
}
