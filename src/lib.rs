// Library for tests to access modules

pub mod backup;
pub mod config;
pub mod docker_repo;
pub mod events;
pub mod format;
pub mod health;
pub mod history_repo;
pub mod models;
pub mod rate;
pub mod routes;
pub mod source;
pub mod sysinfo_repo;
pub mod watchdog;
pub mod worker;
