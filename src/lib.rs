pub mod agent;
pub mod config;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod post;
pub mod rag;
pub mod server;
pub mod state;
pub mod tools;
