pub mod demo;
pub mod http;
pub mod memory;

pub use demo::DemoSource;
pub use http::HttpSource;
pub use memory::MemorySource;
