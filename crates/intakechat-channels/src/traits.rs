use async_trait::async_trait;
use intakechat_common::{Profile, Result};

/// Delivers a submitted profile to the fixed staff recipient.
///
/// Implementations make exactly one delivery attempt per call; there is no
/// retry or queueing behind this interface.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short identifier used in logs (e.g. "email").
    fn channel_type(&self) -> &str;

    async fn notify(&self, profile: &Profile) -> Result<()>;
}
