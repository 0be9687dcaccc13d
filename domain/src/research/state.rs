//! Per-specialist research loop state
//!
//! Owned by exactly one specialist runner and dropped when its loop ends;
//! only the resulting counter-referral survives.

use crate::generation::message::Message;
use crate::tool::entities::ToolCall;
use crate::tool::value_objects::ToolResult;

/// Corrective iteration a specialist may receive once per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Terminal output lacked required citations
    Citations,
    /// Response was free text or an unparseable submission
    Format,
}

impl Correction {
    pub fn instruction(&self, detail: &str) -> String {
        match self {
            Correction::Citations => format!(
                "Your counter-referral was rejected: citations are required but evidence_used is empty. \
Call submit_counter_referral again and list the guidelines, studies (with PMID) or criteria you relied on. {}",
                detail
            ),
            Correction::Format => format!(
                "Your response could not be accepted: {}. Continue researching with the available tools, \
or finish by calling submit_counter_referral with the required fields. Do not answer in free text.",
                detail
            ),
        }
    }
}

/// Mutable state of one research loop
#[derive(Debug, Clone)]
pub struct ResearchLoopState {
    history: Vec<Message>,
    max_iterations: usize,
    iterations_used: usize,
    tool_calls: usize,
    failed_tool_calls: usize,
    citations_corrected: bool,
    format_corrected: bool,
}

impl ResearchLoopState {
    /// Start a loop whose first message is the consultation note
    pub fn new(opening: Message, max_iterations: usize) -> Self {
        Self {
            history: vec![opening],
            max_iterations,
            iterations_used: 0,
            tool_calls: 0,
            failed_tool_calls: 0,
            citations_corrected: false,
            format_corrected: false,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn iterations_used(&self) -> usize {
        self.iterations_used
    }

    pub fn remaining(&self) -> usize {
        self.max_iterations.saturating_sub(self.iterations_used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.iterations_used >= self.max_iterations
    }

    pub fn tool_calls(&self) -> usize {
        self.tool_calls
    }

    pub fn failed_tool_calls(&self) -> usize {
        self.failed_tool_calls
    }

    /// Count a generation turn against the budget; returns the 1-based iteration number
    pub fn begin_iteration(&mut self) -> usize {
        self.iterations_used += 1;
        self.iterations_used
    }

    /// Record what the model said (text and tool calls) for this turn
    pub fn record_turn(&mut self, text: impl Into<String>, calls: Vec<ToolCall>) {
        self.history.push(Message::assistant(text, calls));
    }

    /// Append a routed tool result verbatim to the observation history
    pub fn record_observation(&mut self, call: &ToolCall, result: &ToolResult) {
        self.tool_calls += 1;
        if !result.is_success() {
            self.failed_tool_calls += 1;
        }
        self.history.push(Message::tool_result(call, result));
    }

    /// Tell the model a call was not executed (e.g. research calls ignored in favour of a submission)
    pub fn record_rejection(&mut self, call: &ToolCall, reason: &str) {
        self.history.push(Message::tool(call, reason));
    }

    /// Grant the one corrective iteration of this kind, if still available
    ///
    /// The rejected turn is refunded, so the rejected turn and its correction
    /// together consume a single iteration of the budget.
    pub fn grant_correction(&mut self, correction: Correction, detail: &str) -> bool {
        let used = match correction {
            Correction::Citations => &mut self.citations_corrected,
            Correction::Format => &mut self.format_corrected,
        };
        if *used {
            return false;
        }
        *used = true;
        self.iterations_used = self.iterations_used.saturating_sub(1);
        self.history.push(Message::user(correction.instruction(detail)));
        true
    }

    pub fn push_instruction(&mut self, instruction: impl Into<String>) {
        self.history.push(Message::user(instruction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::message::Role;
    use crate::tool::value_objects::ToolError;

    fn state(max: usize) -> ResearchLoopState {
        ResearchLoopState::new(Message::user("consultation"), max)
    }

    #[test]
    fn test_budget_counts_iterations() {
        let mut s = state(2);
        assert_eq!(s.remaining(), 2);
        assert_eq!(s.begin_iteration(), 1);
        assert!(!s.is_exhausted());
        s.begin_iteration();
        assert!(s.is_exhausted());
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn test_correction_is_granted_once_and_refunds() {
        let mut s = state(3);
        s.begin_iteration();
        assert!(s.grant_correction(Correction::Citations, ""));
        assert_eq!(s.iterations_used(), 0);
        s.begin_iteration();
        assert!(!s.grant_correction(Correction::Citations, ""));
        assert_eq!(s.iterations_used(), 1);
        // the other kind is independent
        assert!(s.grant_correction(Correction::Format, "free text"));
        let last = s.history().last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.contains("free text"));
    }

    #[test]
    fn test_observations_are_counted() {
        let mut s = state(4);
        let call = ToolCall::new("literature_search");
        s.record_turn("", vec![call.clone()]);
        s.record_observation(&call, &ToolResult::failure("literature_search", ToolError::rate_limited("429")));
        s.record_observation(&call, &ToolResult::success("literature_search", "[]"));
        assert_eq!(s.tool_calls(), 2);
        assert_eq!(s.failed_tool_calls(), 1);
        assert_eq!(s.history().len(), 4);
    }
}
