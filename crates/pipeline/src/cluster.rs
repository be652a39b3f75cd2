use std::collections::HashMap;
use storysync_model::timefmt::{abs_gap_secs, lex_max, lex_min, parse_instant};
use storysync_model::{MergedSession, RawRecord, SessionWindow};

/// Two windows merge when they overlap or lie within this many seconds of
/// each other. Short gaps (a network hiccup during a continuous play
/// session) stay one logical session; genuinely separate sessions do not.
pub const MERGE_THRESHOLD_SECS: i64 = 600;

/// Group deduplicated records into merged sessions.
///
/// Clustering is strictly per entity; sessions never merge across entities.
/// Output order follows entity first-encounter order, then window
/// first-encounter order within an entity.
///
/// The merge is a greedy single pass in window first-encounter order with
/// first-match-wins, so it is order-dependent and non-transitive: an
/// absorbed window does not re-check later accepted sessions. Downstream
/// consumers depend on these exact semantics; keep them.
pub fn cluster(records: Vec<RawRecord>) -> Vec<MergedSession> {
    let mut entity_order: Vec<String> = Vec::new();
    let mut by_entity: HashMap<String, Vec<RawRecord>> = HashMap::new();
    for record in records {
        if !by_entity.contains_key(&record.entity_id) {
            entity_order.push(record.entity_id.clone());
        }
        by_entity
            .entry(record.entity_id.clone())
            .or_default()
            .push(record);
    }

    let mut sessions = Vec::new();
    for entity in entity_order {
        if let Some(records) = by_entity.remove(&entity) {
            sessions.extend(cluster_entity(&entity, records));
        }
    }
    sessions
}

/// Window bounds for one record: explicit `(session_start, session_end)`
/// when both are present and non-empty, otherwise a singleton anchored at
/// the timestamp.
fn window_bounds(record: &RawRecord) -> (String, String) {
    match (&record.session_start, &record.session_end) {
        (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
            (start.clone(), end.clone())
        }
        _ => {
            let anchor = record.timestamp_or_empty().to_string();
            (anchor.clone(), anchor)
        }
    }
}

fn cluster_entity(entity: &str, records: Vec<RawRecord>) -> Vec<MergedSession> {
    // Candidate windows in first-encounter order; the index map only dedups
    // bounds, it never drives iteration order.
    let mut windows: Vec<SessionWindow> = Vec::new();
    let mut by_bounds: HashMap<(String, String), usize> = HashMap::new();
    for record in records {
        let bounds = window_bounds(&record);
        match by_bounds.get(&bounds) {
            Some(&slot) => windows[slot].members.push(record),
            None => {
                by_bounds.insert(bounds.clone(), windows.len());
                windows.push(SessionWindow {
                    start: bounds.0,
                    end: bounds.1,
                    members: vec![record],
                });
            }
        }
    }

    for window in &mut windows {
        window
            .members
            .sort_by(|a, b| a.timestamp_or_empty().cmp(b.timestamp_or_empty()));
    }

    let mut merged: Vec<MergedSession> = Vec::new();
    for mut window in windows {
        let mut absorbed = false;
        for session in merged.iter_mut() {
            if windows_qualify(&window.start, &window.end, &session.start, &session.end) {
                session.members.append(&mut window.members);
                let start = lex_min(&session.start, &window.start).to_string();
                let end = lex_max(&session.end, &window.end).to_string();
                session.start = start;
                session.end = end;
                absorbed = true;
                break;
            }
        }
        if !absorbed {
            merged.push(MergedSession::from_window(entity, window));
        }
    }

    log::debug!(
        "entity {entity}: {} window(s) -> {} session(s)",
        by_bounds.len(),
        merged.len()
    );
    merged
}

/// Proximity/overlap rule. A bound that fails ISO-8601 parsing never
/// qualifies, so malformed windows degrade into their own sessions instead
/// of raising.
fn windows_qualify(new_start: &str, new_end: &str, acc_start: &str, acc_end: &str) -> bool {
    let (Some(ns), Some(ne), Some(astart), Some(aend)) = (
        parse_instant(new_start),
        parse_instant(new_end),
        parse_instant(acc_start),
        parse_instant(acc_end),
    ) else {
        return false;
    };

    abs_gap_secs(ns, aend) <= MERGE_THRESHOLD_SECS
        || abs_gap_secs(ne, astart) <= MERGE_THRESHOLD_SECS
        || (ns <= aend && ne >= astart)
}
