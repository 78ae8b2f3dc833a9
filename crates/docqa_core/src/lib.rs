pub mod chunker;
pub mod document;
pub mod error;
pub mod ingest;
pub mod settings;
pub mod state;
