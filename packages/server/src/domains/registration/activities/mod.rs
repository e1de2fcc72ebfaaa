pub mod derive;

pub use derive::{derive_for_registration, DeriveOutcome};
