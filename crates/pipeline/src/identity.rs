use std::collections::HashSet;
use storysync_model::RawRecord;

/// Deduplicate a record stream by identity key, preserving input order.
///
/// The same underlying event observed from several stages (or shown to
/// several parents) produces byte-different records with the same
/// `(source_tag, entity_id, timestamp)` key; the first occurrence wins and
/// later ones are dropped silently. Duplication is expected, not anomalous.
///
/// Pure over the input sequence and idempotent: resolving the output again
/// drops nothing further.
pub fn resolve(records: impl IntoIterator<Item = RawRecord>) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for record in records {
        let key = record.identity_key();
        if seen.insert(key) {
            unique.push(record);
        } else {
            log::debug!(
                "dropping duplicate record {} from {}",
                record.timestamp_or_empty(),
                record.source_tag
            );
        }
    }
    unique
}
