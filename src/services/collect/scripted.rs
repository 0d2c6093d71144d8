use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::debug;

use super::Collector;
use crate::kernel::error::IvrError;
use crate::kernel::menu::Prompt;
use crate::kernel::options::CollectOptions;
use crate::kernel::result::CollectResult;

/// One recorded collect invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectCall {
    pub prompt: Prompt,
    pub options: CollectOptions,
}

/// Replays a fixed script of outcomes and records what it was asked.
/// An exhausted script answers `stop`.
#[derive(Debug, Default)]
pub struct ScriptedCollector {
    script: Mutex<VecDeque<CollectResult>>,
    calls: Mutex<Vec<CollectCall>>,
}

impl ScriptedCollector {
    pub fn new(script: impl IntoIterator<Item = CollectResult>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn push(&self, result: CollectResult) {
        self.script.lock().await.push_back(result);
    }

    pub async fn calls(&self) -> Vec<CollectCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn prompts(&self) -> Vec<Prompt> {
        self.calls.lock().await.iter().map(|c| c.prompt.clone()).collect()
    }
}

#[async_trait]
impl Collector for ScriptedCollector {
    async fn collect(&self, prompt: &Prompt, options: &CollectOptions) -> Result<CollectResult, IvrError> {
        self.calls.lock().await.push(CollectCall {
            prompt: prompt.clone(),
            options: options.clone(),
        });

        let next = self.script.lock().await.pop_front();
        match next {
            Some(result) => Ok(result),
            None => {
                debug!("Script exhausted, answering stop");
                Ok(CollectResult::Stop)
            }
        }
    }
}
