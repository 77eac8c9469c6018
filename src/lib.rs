pub mod app;
pub mod channel;
pub mod config;
pub mod domain;
pub mod error;
pub mod group;
pub mod illum;
pub mod input;
pub mod join;
pub mod key;
pub mod manifest;
pub mod output;
pub mod writer;
