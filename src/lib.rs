#![forbid(unsafe_code)]

pub mod app;
pub mod blocks;
pub mod bundle;
pub mod cli;
pub mod columns;
pub mod config;
pub mod dates;
pub mod error;
pub mod formats;
pub mod group;
pub mod logging;
pub mod notion;
pub mod output_dir;
pub mod register;
pub mod render;
pub mod split;
