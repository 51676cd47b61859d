// Resume review: prompt building, the stage pipeline, feedback parsing,
// the review view model and the HTTP handlers in front of them.
// All LLM calls go through llm_client; all persistence through store.

pub mod handlers;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;
