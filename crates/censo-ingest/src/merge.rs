use crate::aggregate::Groups;
use censo_model::SchoolRecord;

/// Left join of the aggregated counters with the reconciled attributes,
/// driven by the aggregate side: every group yields exactly one record,
/// with defaulted attributes when the donor row had blank cells. The
/// derived total is computed by the record constructor, after all
/// defaulting, so it is never null and never trusted from the source.
#[must_use]
pub fn merge_groups(groups: Groups) -> Vec<SchoolRecord> {
    groups
        .into_iter()
        .map(|(key, group)| SchoolRecord::new(key.code, key.year, group.attrs, group.counts))
        .collect()
}
