use chrono::NaiveDate;

use crate::tally::model::{AggregationRecord, GroupLayout};

/// Partitions the two metric columns into `layout.group_count` contiguous
/// blocks of `layout.group_size` cells and sums each block.
///
/// `metric_a` and `metric_b` start at `layout.start_row`; `members` is the
/// whole member column starting at row 1. Positions missing from a metric
/// slice count as zero and a missing member cell yields an empty name.
pub fn aggregate_groups<S: AsRef<str>>(
    date: NaiveDate,
    layout: &GroupLayout,
    metric_a: &[f64],
    metric_b: &[f64],
    members: &[S],
) -> Vec<AggregationRecord> {
    let size = layout.group_size as usize;

    (0..layout.group_count)
        .map(|group_index| {
            let offset = (group_index as usize).saturating_mul(size);
            let start_row = layout
                .start_row
                .saturating_add(group_index.saturating_mul(layout.group_size));
            let end_row = start_row.saturating_add(layout.group_size.saturating_sub(1));
            let member_name = (start_row as usize)
                .checked_sub(1)
                .and_then(|index| members.get(index))
                .map(|name| name.as_ref().to_string())
                .unwrap_or_default();

            AggregationRecord {
                date,
                group_id: group_index + 1,
                member_name,
                start_row,
                end_row,
                metric_a_sum: block_sum(metric_a, offset, size),
                metric_b_sum: block_sum(metric_b, offset, size),
            }
        })
        .collect()
}

fn block_sum(values: &[f64], offset: usize, size: usize) -> f64 {
    values.iter().skip(offset).take(size).sum()
}
