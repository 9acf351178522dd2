use std::cell::{Cell, RefCell};

use crate::prompt::{Prompt, PromptError};

/// Prompt that answers with a fixed option, or cancels.
pub struct ScriptedPrompt {
    answer: Option<String>,
    asked: Cell<usize>,
    last_options: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            asked: Cell::new(0),
            last_options: RefCell::new(Vec::new()),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            answer: None,
            asked: Cell::new(0),
            last_options: RefCell::new(Vec::new()),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.get()
    }

    pub fn last_options(&self) -> Vec<String> {
        self.last_options.borrow().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn select(&self, _label: &str, options: &[String]) -> Result<String, PromptError> {
        self.asked.set(self.asked.get() + 1);
        *self.last_options.borrow_mut() = options.to_vec();
        self.answer.clone().ok_or(PromptError::Cancelled)
    }
}
