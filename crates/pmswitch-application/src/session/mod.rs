//! Session lifetime management.

mod controller;

pub use controller::SessionController;
