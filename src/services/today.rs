use crate::models::record::Record;

/// The latest record of a kind, but only if it was entered on `today_key`.
///
/// Only the single newest insert is considered: a day with no inserts and a day
/// whose newest insert is from an earlier day both mean "not entered yet".
pub fn latest_for_today(
    records: impl IntoIterator<Item = Record>,
    today_key: &str,
) -> Option<Record> {
    records
        .into_iter()
        .reduce(|best, r| if r.is_newer_than(&best) { r } else { best })
        .filter(|r| r.date_str == today_key)
}
