pub mod store;

pub use store::{RecordStore, StoredProfile, UpsertOutcome};
