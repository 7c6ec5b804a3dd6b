pub mod preference;
pub mod run;
pub mod status;
pub mod update;
