//! Update lifecycle services.

mod coordinator;

pub use coordinator::UpdateCoordinator;
