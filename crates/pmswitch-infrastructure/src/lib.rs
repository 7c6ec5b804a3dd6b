//! Adapters behind the core seams: file storage, the event bus and the
//! HTTP updater.

pub mod config_service;
pub mod dto;
pub mod event_bus;
pub mod http_updater;
pub mod local_backend;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::event_bus::EventBus;
pub use crate::http_updater::HttpUpdater;
pub use crate::local_backend::LocalSettingsBackend;
pub use crate::paths::PmsPaths;
