pub mod expo;
pub mod notifier;

pub use expo::ExpoNotifier;
pub use notifier::{Notifier, PushMessage, RecordingNotifier};
