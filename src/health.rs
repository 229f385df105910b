// Health score, verdict and system-state classification. Pure functions of one sample.

use crate::models::{HealthVerdict, SystemState};

const LOAD_PENALTY_BASE: f64 = 1.0;
const LOAD_PENALTY_PER_UNIT: f64 = 20.0;
const RAM_PENALTY_THRESHOLD: f64 = 80.0;
const RAM_PENALTY: i32 = 10;
const SSH_DOWN_PENALTY: i32 = 5;

const OVERLOAD_LOAD: f64 = 2.0;
const MEMORY_FULL_PERCENT: f64 = 90.0;
const SUSTAINED_LOAD: f64 = 0.8;

/// Inputs the evaluator looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthInputs {
    pub load: f64,
    pub ram_percent: f64,
    pub ssh_up: bool,
    /// Reported for completeness; the web probe hits this very process, so it does not
    /// affect the score.
    pub web_up: bool,
}

/// Score in [0, 100]. The load penalty is truncated toward zero, not rounded.
pub fn score(inputs: &HealthInputs) -> u8 {
    let mut score: i32 = 100;
    if inputs.load > LOAD_PENALTY_BASE {
        score -= ((inputs.load - LOAD_PENALTY_BASE) * LOAD_PENALTY_PER_UNIT) as i32;
    }
    if inputs.ram_percent > RAM_PENALTY_THRESHOLD {
        score -= RAM_PENALTY;
    }
    if !inputs.ssh_up {
        score -= SSH_DOWN_PENALTY;
    }
    score.clamp(0, 100) as u8
}

pub fn verdict(score: u8) -> HealthVerdict {
    match score {
        90.. => HealthVerdict::Excellent,
        70..=89 => HealthVerdict::Good,
        50..=69 => HealthVerdict::Attention,
        _ => HealthVerdict::Critical,
    }
}

/// First matching rule wins.
pub fn state(inputs: &HealthInputs) -> SystemState {
    if !inputs.ssh_up {
        SystemState::ServiceFailure
    } else if inputs.load > OVERLOAD_LOAD {
        SystemState::CpuOverload
    } else if inputs.ram_percent > MEMORY_FULL_PERCENT {
        SystemState::MemoryFull
    } else if inputs.load > SUSTAINED_LOAD {
        SystemState::SustainedLoad
    } else {
        SystemState::Stable
    }
}

/// Score, verdict and state in one call.
pub fn evaluate(inputs: &HealthInputs) -> (u8, HealthVerdict, SystemState) {
    let s = score(inputs);
    (s, verdict(s), state(inputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(load: f64, ram_percent: f64, ssh_up: bool) -> HealthInputs {
        HealthInputs {
            load,
            ram_percent,
            ssh_up,
            web_up: true,
        }
    }

    #[test]
    fn idle_host_is_perfect() {
        assert_eq!(score(&inputs(0.3, 40.0, true)), 100);
        assert_eq!(verdict(100), HealthVerdict::Excellent);
        assert_eq!(state(&inputs(0.3, 40.0, true)), SystemState::Stable);
    }

    #[test]
    fn load_penalty_truncates() {
        // 20 * 0.29 = 5.8 -> 5
        assert_eq!(score(&inputs(1.29, 10.0, true)), 95);
        // 20 * 0.5 = 10
        assert_eq!(score(&inputs(1.5, 10.0, true)), 90);
        assert_eq!(score(&inputs(1.0, 10.0, true)), 100);
    }

    #[test]
    fn penalties_accumulate_and_clamp() {
        assert_eq!(score(&inputs(2.0, 85.0, false)), 100 - 20 - 10 - 5);
        assert_eq!(score(&inputs(50.0, 99.0, false)), 0);
    }

    #[test]
    fn web_probe_does_not_change_score() {
        let mut i = inputs(1.7, 81.0, true);
        let with_web = score(&i);
        i.web_up = false;
        assert_eq!(score(&i), with_web);
    }

    #[test]
    fn verdict_bucket_edges() {
        assert_eq!(verdict(90), HealthVerdict::Excellent);
        assert_eq!(verdict(89), HealthVerdict::Good);
        assert_eq!(verdict(70), HealthVerdict::Good);
        assert_eq!(verdict(69), HealthVerdict::Attention);
        assert_eq!(verdict(50), HealthVerdict::Attention);
        assert_eq!(verdict(49), HealthVerdict::Critical);
        assert_eq!(verdict(0), HealthVerdict::Critical);
    }

    #[test]
    fn exactly_one_verdict_per_score() {
        let thresholds = [
            (HealthVerdict::Excellent, 90u8..=100),
            (HealthVerdict::Good, 70..=89),
            (HealthVerdict::Attention, 50..=69),
            (HealthVerdict::Critical, 0..=49),
        ];
        for s in 0..=100u8 {
            let matching: Vec<_> = thresholds
                .iter()
                .filter(|(_, r)| r.contains(&s))
                .map(|(v, _)| *v)
                .collect();
            assert_eq!(matching, vec![verdict(s)], "score {s}");
        }
    }

    #[test]
    fn score_is_non_increasing_in_load_and_ram() {
        for ssh_up in [true, false] {
            let mut prev = u8::MAX;
            for step in 0..=400 {
                let s = score(&inputs(step as f64 * 0.025, 50.0, ssh_up));
                assert!(s <= prev, "load step {step}");
                prev = s;
            }
            let mut prev = u8::MAX;
            for step in 0..=1000 {
                let s = score(&inputs(1.2, step as f64 * 0.1, ssh_up));
                assert!(s <= prev, "ram step {step}");
                prev = s;
            }
        }
    }

    #[test]
    fn state_priority_order() {
        assert_eq!(state(&inputs(5.0, 95.0, false)), SystemState::ServiceFailure);
        assert_eq!(state(&inputs(2.1, 95.0, true)), SystemState::CpuOverload);
        assert_eq!(state(&inputs(2.0, 95.0, true)), SystemState::MemoryFull);
        assert_eq!(state(&inputs(0.9, 90.0, true)), SystemState::SustainedLoad);
        assert_eq!(state(&inputs(0.8, 90.0, true)), SystemState::Stable);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let i = inputs(1.37, 82.5, false);
        let first = evaluate(&i);
        for _ in 0..10 {
            assert_eq!(evaluate(&i), first);
        }
    }
}
