pub mod event;
pub mod record;
pub mod error;
pub mod store;
pub mod directory;

pub mod organization;
pub mod network;
pub mod user;
pub mod normalizer;
pub mod topics;
pub mod handler;
pub mod component;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod backend;

pub mod config;
pub mod env;
pub mod init;
