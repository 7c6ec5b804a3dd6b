//! Self-update lifecycle: phases, progress, events and the updater seam.

pub mod event;
pub mod model;
pub mod service;

pub use event::{UpdateEvent, UpdateEventKind};
pub use model::{DownloadProgress, UpdatePhase, UpdateSnapshot};
pub use service::UpdaterService;
