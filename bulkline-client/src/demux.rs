use tracing::trace;

use bulkline_core::{Outcome, StatusLabel, WireResponse};

use crate::ledger::LedgerEntry;

/// Delivers each response record to the ledger entry at the same index.
///
/// Correlation is purely positional: the wire format carries no request
/// identifiers, so a reordering or dropping bulk endpoint silently
/// misattributes responses. Indexes present on only one side are
/// silently dropped, as are entries whose matching callback is absent.
/// Returns the number of callbacks actually invoked.
pub(crate) fn deliver(entries: Vec<LedgerEntry>, responses: Vec<WireResponse>) -> usize {
    let mut dispatched = 0;

    for (entry, response) in entries.into_iter().zip(responses) {
        let LedgerEntry {
            handle,
            mut settings,
            ..
        } = entry;

        let label = StatusLabel::from_status(response.status);
        handle.complete(response.status, label);

        let (body, callback) = match Outcome::from(response) {
            Outcome::Success { body } => (body, settings.success.take()),
            Outcome::Error { body } => (body, settings.error.take()),
        };

        match callback {
            Some(callback) => {
                callback(body, label, &handle);
                dispatched += 1;
            }
            None => trace!(%label, "no callback registered for entry"),
        }
    }

    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkline_core::{normalize, RequestHandle, RequestSettings};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn entry(settings: RequestSettings) -> LedgerEntry {
        let request = normalize(&settings);
        LedgerEntry {
            handle: Arc::new(RequestHandle::new()),
            settings,
            request,
        }
    }

    fn record(status: u16, body: Value) -> WireResponse {
        WireResponse {
            status,
            body: Some(body),
        }
    }

    #[test]
    fn test_delivery_routes_by_outcome() {
        let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));

        let ok_seen = seen.clone();
        let err_seen = seen.clone();
        let entries = vec![
            entry(RequestSettings::get("/a").on_success(move |body, label, _| {
                ok_seen.lock().unwrap().push((label.as_str().into(), body));
            })),
            entry(RequestSettings::get("/b").on_error(move |body, label, _| {
                err_seen.lock().unwrap().push((label.as_str().into(), body));
            })),
        ];
        let responses = vec![
            record(200, json!({"id": 1})),
            record(500, json!({"error": 1})),
        ];

        assert_eq!(deliver(entries, responses), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], ("success".to_string(), json!({"id": 1})));
        assert_eq!(seen[1], ("error".to_string(), json!({"error": 1})));
    }

    #[test]
    fn test_not_modified_goes_to_success_with_its_own_label() {
        let label_seen = Arc::new(Mutex::new(None));
        let captured = label_seen.clone();

        let entries = vec![entry(RequestSettings::get("/a").on_success(
            move |_, label, handle| {
                *captured.lock().unwrap() = Some((label, handle.status()));
            },
        ))];
        let responses = vec![WireResponse {
            status: 304,
            body: None,
        }];

        assert_eq!(deliver(entries, responses), 1);
        assert_eq!(
            *label_seen.lock().unwrap(),
            Some((StatusLabel::NotModified, Some(304)))
        );
    }

    #[test]
    fn test_extra_responses_are_ignored() {
        let entries = vec![entry(RequestSettings::get("/a"))];
        let responses = vec![record(200, json!(1)), record(200, json!(2))];
        assert_eq!(deliver(entries, responses), 0);
    }

    #[test]
    fn test_short_responses_leave_trailing_entries_undelivered() {
        let fired = Arc::new(Mutex::new(0));
        let counter = fired.clone();
        let entries = vec![
            entry(RequestSettings::get("/a").on_success({
                let counter = counter.clone();
                move |_, _, _| *counter.lock().unwrap() += 1
            })),
            entry(RequestSettings::get("/b").on_success({
                let counter = counter.clone();
                move |_, _, _| *counter.lock().unwrap() += 1
            })),
        ];
        let responses = vec![record(200, json!(1))];

        assert_eq!(deliver(entries, responses), 1);
        assert_eq!(*fired.lock().unwrap(), 1);
    }

    #[test]
    fn test_missing_callback_is_skipped() {
        let entries = vec![entry(RequestSettings::get("/a"))];
        let responses = vec![record(500, json!({"error": 1}))];
        assert_eq!(deliver(entries, responses), 0);
    }
}
