pub mod config;
pub mod logging;

pub mod assets;
pub mod downloader;
pub mod export;
pub mod http;
pub mod layout;
pub mod storage;
