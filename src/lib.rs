pub mod attachments;
pub mod config;
pub mod flash;
pub mod storage;
pub mod tasks;
pub mod web;

use std::sync::Arc;

use attachments::AttachmentStore;
use config::ServerConfig;
use flash::FlashBag;
use storage::Storage;
use tasks::TaskStorage;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// Task table operations, sharing the storage pool.
    pub tasks: Arc<TaskStorage>,
    /// Filesystem-backed attachment store under `{data_dir}/attachments`.
    pub attachments: Arc<AttachmentStore>,
    /// One-shot status messages, drained by the next list render.
    pub flash: FlashBag,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Wire up the full context from a loaded config and opened storage.
    pub fn new(config: Arc<ServerConfig>, storage: Arc<Storage>) -> Self {
        let pool = storage.pool();
        let attachments = Arc::new(AttachmentStore::new(&config.data_dir));
        Self {
            config,
            storage,
            tasks: Arc::new(TaskStorage::new(pool)),
            attachments,
            flash: FlashBag::default(),
            started_at: std::time::Instant::now(),
        }
    }
}
