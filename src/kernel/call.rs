use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Handle to the call an interaction runs on.
///
/// The real session lives in the host. The kernel only needs an id for
/// logging and a termination flag shared with whoever owns the channel.
#[derive(Debug, Clone)]
pub struct Call {
    id: Uuid,
    terminated: Arc<AtomicBool>,
}

impl Call {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Marks the call dead. Visible to every clone of this handle.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl Default for Call {
    fn default() -> Self {
        Self::new()
    }
}
