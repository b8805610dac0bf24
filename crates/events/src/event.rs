use chrono::{DateTime, Utc};

/// A fact recorded by the ledger.
///
/// An event exists only once its command passed validation; it is never edited
/// afterwards. `event_type` plus `version` identify the payload schema.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. `ledger.stock_removed`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time the operation was submitted.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// `event_type@vN`, as written to logs.
    fn schema(&self) -> String {
        format!("{}@v{}", self.event_type(), self.version())
    }
}
