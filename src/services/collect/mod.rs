//! The collect collaborator: plays a prompt, listens, returns one outcome.

pub mod http;
pub mod scripted;

use async_trait::async_trait;

use crate::kernel::error::IvrError;
use crate::kernel::menu::Prompt;
use crate::kernel::options::CollectOptions;
use crate::kernel::result::CollectResult;

pub use http::HttpCollector;
pub use scripted::ScriptedCollector;

/// Media/recognition engine as seen by the kernel.
///
/// One call per attempt. The engine never issues a second call while one
/// is outstanding. Errors returned here are transport failures and are
/// propagated to the embedder, never retried.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self, prompt: &Prompt, options: &CollectOptions) -> Result<CollectResult, IvrError>;
}
