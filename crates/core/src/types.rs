/// Machines, tires, alerts, occurrences and telemetry rows are keyed by UUID.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Length of a hyphenated UUID (`8-4-4-4-12`).
const HYPHENATED_ID_LEN: usize = 36;

/// Parse an id in the hyphenated `8-4-4-4-12` form only.
///
/// `Uuid::parse_str` also takes the simple, braced and URN forms; ids on the
/// wire are accepted in one shape everywhere.
pub fn parse_id(value: &str) -> Option<DbId> {
    if value.len() != HYPHENATED_ID_LEN {
        return None;
    }
    uuid::Uuid::try_parse(value).ok()
}
