use anyhow::Result;
use inquire::{Confirm, Text};

/// Answers questions from the person running the tool.
pub trait Console {
    /// Ask for a line of text. An empty answer yields `default`.
    fn ask(&mut self, question: &str, default: &str) -> Result<String>;

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;
}

/// Terminal prompts.
pub struct InquireConsole;

impl Console for InquireConsole {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        let mut prompt = Text::new(question);
        if !default.is_empty() {
            prompt = prompt.with_default(default);
        }
        let answer = prompt.prompt()?;
        Ok(if answer.trim().is_empty() {
            default.to_string()
        } else {
            answer.trim().to_string()
        })
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new(question).with_default(default).prompt()?)
    }
}

/// Replays canned answers, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedConsole {
    answers: std::collections::VecDeque<String>,
    confirmations: std::collections::VecDeque<bool>,
    pub questions: Vec<String>,
}

#[cfg(test)]
impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|answer| answer.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_confirmations(mut self, confirmations: &[bool]) -> Self {
        self.confirmations = confirmations.iter().copied().collect();
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.answers.is_empty() && self.confirmations.is_empty()
    }
}

#[cfg(test)]
impl Console for ScriptedConsole {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        self.questions.push(question.to_string());
        let answer = self
            .answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("Unexpected question: {question}"))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    fn confirm(&mut self, question: &str, _default: bool) -> Result<bool> {
        self.questions.push(question.to_string());
        self.confirmations
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("Unexpected confirmation: {question}"))
    }
}
