#![allow(clippy::new_without_default)]

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod storage;
pub mod store;
pub mod util;
