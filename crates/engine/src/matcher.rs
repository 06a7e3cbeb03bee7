// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability-based task/worker matching. Pure function — no I/O, no store
//! access — so the Dispatch Daemon can call it against any candidate pool.

use orc_core::{AgentId, CapabilitySet, TaskRequirements};

#[derive(Debug, Clone)]
pub struct Candidate {
    pub agent_id: AgentId,
    pub capabilities: CapabilitySet,
    pub currently_assigned_count: u32,
}

fn is_eligible(task: &TaskRequirements, candidate: &Candidate) -> bool {
    candidate.currently_assigned_count < candidate.capabilities.max_concurrent_tasks
        && task.required.skills.is_subset(&candidate.capabilities.skills.skills)
        && task.required.languages.is_subset(&candidate.capabilities.skills.languages)
}

fn preferred_overlap(task: &TaskRequirements, candidate: &Candidate) -> usize {
    task.preferred
        .skills
        .intersection(&candidate.capabilities.skills.skills)
        .count()
        + task
            .preferred
            .languages
            .intersection(&candidate.capabilities.skills.languages)
            .count()
}

/// Picks the best-scoring eligible candidate for `task`, or `None` if no
/// candidate is eligible. Ranks by preferred-skill/language overlap
/// (descending), then fewer currently-assigned tasks, then agent id.
pub fn best_match<'a>(task: &TaskRequirements, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
    candidates
        .iter()
        .filter(|c| is_eligible(task, c))
        .max_by(|a, b| {
            preferred_overlap(task, a)
                .cmp(&preferred_overlap(task, b))
                .then_with(|| b.currently_assigned_count.cmp(&a.currently_assigned_count))
                .then_with(|| b.agent_id.as_str().cmp(a.agent_id.as_str()))
        })
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
