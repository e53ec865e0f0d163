pub mod email;
pub mod traits;

pub use email::{EmailNotifier, render_profile_email};
pub use traits::Notifier;
