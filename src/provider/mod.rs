pub mod ollama;

pub use ollama::{OllamaCapability, DEFAULT_OLLAMA_BASE_URL};
