// Interview engine: session state machine, coaching dialogue and feedback.
// All inference goes through llm_client — no direct Gemini calls here.

pub mod catalog;
pub mod dialogue;
pub mod feedback;
pub mod handlers;
pub mod prompts;
pub mod session;
pub mod store;
pub mod transcript;
