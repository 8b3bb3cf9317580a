pub mod cloud;
pub mod config_store;
pub mod defaults;
pub mod ipc;
pub mod local_model;
pub mod probes;
pub mod secrets;
