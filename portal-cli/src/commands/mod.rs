pub mod completion;
pub mod config;
pub mod context;
pub mod earnings;
pub mod jobs;
pub mod profile;
pub mod recruit;
pub mod session;
