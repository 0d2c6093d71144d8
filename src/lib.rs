pub mod kernel;
pub mod services;

// Re-export the pieces an embedder needs to define and run a menu
pub use kernel::call::Call;
pub use kernel::context::InteractionContext;
pub use kernel::engine::{InteractionEngine, Outcome};
pub use kernel::error::IvrError;
pub use kernel::menu::{MenuBuilder, MenuDefinition, Prompt, PromptSource};
pub use kernel::result::{CollectKind, CollectResult, Utterance};
pub use services::collect::Collector;
