// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::{AgentId, CapabilitySet, SkillSet};

fn candidate(id: &str, skills: &[&str], langs: &[&str], assigned: u32, max: u32) -> Candidate {
    Candidate {
        agent_id: AgentId::from(id),
        capabilities: CapabilitySet {
            skills: SkillSet::new(skills.to_vec(), langs.to_vec()),
            max_concurrent_tasks: max,
        },
        currently_assigned_count: assigned,
    }
}

fn requirements(req_skills: &[&str], pref_skills: &[&str]) -> TaskRequirements {
    TaskRequirements {
        required: SkillSet::new(req_skills.to_vec(), Vec::<&str>::new()),
        preferred: SkillSet::new(pref_skills.to_vec(), Vec::<&str>::new()),
    }
}

#[test]
fn agent_at_max_capacity_is_ineligible() {
    let task = requirements(&[], &[]);
    let full = candidate("full", &[], &[], 2, 2);
    assert!(best_match(&task, &[full]).is_none());
}

#[test]
fn missing_required_skill_is_ineligible() {
    let task = requirements(&["rust"], &[]);
    let no_rust = candidate("a", &["python"], &[], 0, 2);
    assert!(best_match(&task, &[no_rust]).is_none());
}

#[test]
fn empty_requirements_match_any_agent() {
    let task = requirements(&[], &[]);
    let a = candidate("a", &[], &[], 0, 1);
    let candidates = [a];
    let best = best_match(&task, &candidates).unwrap();
    assert_eq!(best.agent_id.as_str(), "a");
}

#[test]
fn higher_preferred_overlap_wins() {
    let task = requirements(&[], &["rust", "terraform"]);
    let one_match = candidate("one", &["rust"], &[], 0, 2);
    let two_matches = candidate("two", &["rust", "terraform"], &[], 0, 2);
    let candidates = [one_match, two_matches];
    let best = best_match(&task, &candidates).unwrap();
    assert_eq!(best.agent_id.as_str(), "two");
}

#[test]
fn tie_break_prefers_fewer_assigned_tasks() {
    let task = requirements(&[], &["rust"]);
    let busy = candidate("busy", &["rust"], &[], 3, 5);
    let free = candidate("free", &["rust"], &[], 0, 5);
    let candidates = [busy, free];
    let best = best_match(&task, &candidates).unwrap();
    assert_eq!(best.agent_id.as_str(), "free");
}

#[test]
fn tie_break_falls_back_to_agent_id() {
    let task = requirements(&[], &["rust"]);
    let b = candidate("b-agent", &["rust"], &[], 0, 5);
    let a = candidate("a-agent", &["rust"], &[], 0, 5);
    let candidates = [b, a];
    let best = best_match(&task, &candidates).unwrap();
    assert_eq!(best.agent_id.as_str(), "a-agent");
}

#[test]
fn adding_preferred_overlap_never_lowers_rank_monotonicity() {
    let weak = requirements(&[], &["rust"]);
    let strong = requirements(&[], &["rust", "terraform"]);
    let candidate_a = candidate("a", &["rust", "terraform"], &[], 0, 5);
    let candidate_b = candidate("b", &["rust"], &[], 0, 5);

    let weak_candidates = [candidate_a.clone(), candidate_b.clone()];
    let weak_best = best_match(&weak, &weak_candidates).unwrap();
    let strong_candidates = [candidate_a, candidate_b];
    let strong_best = best_match(&strong, &strong_candidates).unwrap();
    assert_eq!(weak_best.agent_id.as_str(), "a");
    assert_eq!(strong_best.agent_id.as_str(), "a");
}
