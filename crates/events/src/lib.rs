//! Ledger events and the envelope a committed operation is reported in.

pub mod envelope;
pub mod event;

pub use envelope::EventEnvelope;
pub use event::Event;
