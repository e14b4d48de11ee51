//! Interactive prompts
//!
//! Menu flows talk to the terminal through [`Prompter`], so they can be
//! driven by a scripted prompter in tests.

use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::error::StashResult;

/// Source of interactive answers
pub trait Prompter {
    /// Pick one item; `None` when the user cancels
    fn select(&mut self, prompt: &str, items: &[String], default: usize)
        -> StashResult<Option<usize>>;

    /// Pick any number of items
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> StashResult<Vec<usize>>;

    /// Free text, pre-filled with `initial`
    fn input(&mut self, prompt: &str, initial: &str) -> StashResult<String>;

    /// Yes/no question
    fn confirm(&mut self, prompt: &str, default: bool) -> StashResult<bool>;
}

/// [`Prompter`] backed by the terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select(
        &mut self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> StashResult<Option<usize>> {
        Ok(Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact_opt()?)
    }

    fn multi_select(&mut self, prompt: &str, items: &[String]) -> StashResult<Vec<usize>> {
        Ok(MultiSelect::new()
            .with_prompt(prompt)
            .items(items)
            .interact_opt()?
            .unwrap_or_default())
    }

    fn input(&mut self, prompt: &str, initial: &str) -> StashResult<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> StashResult<bool> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;

    use super::Prompter;
    use crate::error::{StashError, StashResult};

    /// One scripted answer
    #[derive(Debug, Clone)]
    pub enum Answer {
        /// Select the item with this label
        Pick(&'static str),
        Cancel,
        Many(Vec<&'static str>),
        Text(&'static str),
        Yes,
        No,
    }

    /// Replays answers in order and records every prompt it was shown
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        answers: VecDeque<Answer>,
        pub prompts: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                prompts: Vec::new(),
            }
        }

        pub fn is_done(&self) -> bool {
            self.answers.is_empty()
        }

        fn next(&mut self, prompt: &str) -> StashResult<Answer> {
            self.prompts.push(prompt.to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| StashError::Prompt(format!("No scripted answer for '{}'", prompt)))
        }
    }

    fn position(items: &[String], label: &str) -> StashResult<usize> {
        items
            .iter()
            .position(|item| item == label || item.starts_with(label))
            .ok_or_else(|| StashError::Prompt(format!("'{}' not in {:?}", label, items)))
    }

    impl Prompter for ScriptedPrompter {
        fn select(
            &mut self,
            prompt: &str,
            items: &[String],
            _default: usize,
        ) -> StashResult<Option<usize>> {
            match self.next(prompt)? {
                Answer::Pick(label) => position(items, label).map(Some),
                Answer::Cancel => Ok(None),
                other => Err(StashError::Prompt(format!("Unexpected {:?} for select", other))),
            }
        }

        fn multi_select(&mut self, prompt: &str, items: &[String]) -> StashResult<Vec<usize>> {
            match self.next(prompt)? {
                Answer::Many(labels) => labels.into_iter().map(|l| position(items, l)).collect(),
                Answer::Cancel => Ok(Vec::new()),
                other => Err(StashError::Prompt(format!(
                    "Unexpected {:?} for multi-select",
                    other
                ))),
            }
        }

        fn input(&mut self, prompt: &str, _initial: &str) -> StashResult<String> {
            match self.next(prompt)? {
                Answer::Text(text) => Ok(text.to_string()),
                other => Err(StashError::Prompt(format!("Unexpected {:?} for input", other))),
            }
        }

        fn confirm(&mut self, prompt: &str, _default: bool) -> StashResult<bool> {
            match self.next(prompt)? {
                Answer::Yes => Ok(true),
                Answer::No => Ok(false),
                other => Err(StashError::Prompt(format!("Unexpected {:?} for confirm", other))),
            }
        }
    }
}
