pub mod client;
pub mod core;
pub mod documents;
pub mod embeddings;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
