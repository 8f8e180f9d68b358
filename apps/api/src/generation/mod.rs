// Document generation: assistant registration, the thread/run/poll engine,
// template assembly and output.
// Remote calls go through llm_client::assistants only.

pub mod document;
pub mod engine;
pub mod handlers;
pub mod output;
pub mod prompts;
pub mod registry;
pub mod templates;
