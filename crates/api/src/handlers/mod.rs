pub mod ingest;
pub mod method;
pub mod timeline;
