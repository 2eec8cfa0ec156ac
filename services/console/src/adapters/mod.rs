pub mod demo;
pub mod http;
pub mod storage;

pub use demo::DemoBackend;
pub use http::HttpBackend;
pub use storage::{FileStorage, MemoryStorage};
