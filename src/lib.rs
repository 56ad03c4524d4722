pub mod application;
pub mod archive;
pub mod commands;
pub mod error;
pub mod http;
pub mod package;
pub mod packer;
pub mod report;
pub mod resolver;
pub mod runtime;
