use serde::{Deserialize, Serialize};

/// What the user asked the assistant to do with their text.
///
/// Summarize and Proofread wrap the raw input in a fixed framing before
/// dispatch; Optimize sends it through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Task {
    #[default]
    Optimize,
    Summarize,
    Proofread,
}

impl Task {
    pub fn frame_input(&self, input: &str) -> String {
        match self {
            Task::Optimize => input.to_string(),
            Task::Summarize => {
                format!("Please summarize the following text:\n\n---\n\n{input}")
            }
            Task::Proofread => format!(
                "Please proofread the following text and return only the corrected version:\n\n---\n\n{input}"
            ),
        }
    }
}
