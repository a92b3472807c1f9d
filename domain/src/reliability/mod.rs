//! Reliability and cost estimates for K-ahead voting
//!
//! Closed-form estimates relating the per-step accuracy `p` of a proposer,
//! the voting margin `k`, and the length of a task:
//!
//! ```text
//! per step:  P(correct) = 1 / (1 + ((1-p)/p)^k)
//! full task: P(no error) = (1 + ((1-p)/p)^k)^(-s/m)
//! minimum k: k_min = ceil( ln(t^(-m/s) - 1) / ln((1-p)/p) )
//! ```
//!
//! `s` is the number of steps, `m` the number of steps per subtask and `t`
//! the target task success probability. Every function rejects arguments
//! outside its domain instead of clamping them.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Safety floor applied by [`recommend_k`] to all but `fast` tasks.
pub const RECOMMENDED_MIN_K: u32 = 3;

/// Share of attempts assumed to be red-flagged in cost estimates.
const RED_FLAG_RATE: f64 = 0.1;

/// Reliability profile of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// 90% task success target, no safety floor on k
    Fast,
    /// 99% task success target
    #[default]
    Standard,
    /// 99.9% task success target
    HighStakes,
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Fast => "fast",
            TaskType::Standard => "standard",
            TaskType::HighStakes => "high_stakes",
        }
    }

    /// Target full-task success probability
    pub fn target(&self) -> f64 {
        match self {
            TaskType::Fast => 0.90,
            TaskType::Standard => 0.99,
            TaskType::HighStakes => 0.999,
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fast" => Ok(TaskType::Fast),
            "standard" => Ok(TaskType::Standard),
            "high_stakes" => Ok(TaskType::HighStakes),
            _ => Err(DomainError::InvalidTaskType(s.to_string())),
        }
    }
}

/// Expected voting cost for a whole task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub votes_per_step: f64,
    pub total_votes: f64,
    pub total_cost: f64,
    pub cost_per_step: f64,
}

/// Suggested margin for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KRecommendation {
    pub recommended_k: u32,
    pub k_min: u32,
    pub task_success_probability: f64,
    pub target: f64,
    pub reasoning: String,
}

fn check_probability(name: &'static str, value: f64) -> Result<(), DomainError> {
    // Written so NaN fails too
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(DomainError::ProbabilityOutOfRange { name, value })
    }
}

fn check_count(name: &'static str, value: u32) -> Result<(), DomainError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(DomainError::CountBelowOne {
            name,
            value: u64::from(value),
        })
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Probability that K-ahead voting selects the correct action for one step.
///
/// # Example
///
/// ```
/// use maker_domain::reliability::per_step_success_probability;
///
/// let p = per_step_success_probability(0.9, 3).unwrap();
/// assert!(p > 0.998);
/// assert!(per_step_success_probability(1.0, 3).is_err());
/// ```
pub fn per_step_success_probability(p: f64, k: u32) -> Result<f64, DomainError> {
    check_probability("p", p)?;
    check_count("k", k)?;

    let ratio = (1.0 - p) / p;
    Ok(1.0 / (1.0 + ratio.powf(f64::from(k))))
}

/// Probability of finishing `s` steps with zero errors, voting once per
/// subtask of `m` steps.
pub fn full_task_success_probability(p: f64, k: u32, s: u32, m: u32) -> Result<f64, DomainError> {
    check_probability("p", p)?;
    check_count("k", k)?;
    check_count("s", s)?;
    check_count("m", m)?;

    let ratio = (1.0 - p) / p;
    let exponent = -f64::from(s) / f64::from(m);
    Ok((1.0 + ratio.powf(f64::from(k))).powf(exponent))
}

/// Smallest margin whose full-task success probability reaches `target`.
///
/// Fails with [`DomainError::TargetUnreachable`] when `p <= 0.5` and even
/// `k = 1` misses the target: voting cannot amplify a proposer that is no
/// better than chance.
pub fn minimum_k_for_target(p: f64, s: u32, target: f64, m: u32) -> Result<u32, DomainError> {
    check_probability("p", p)?;
    check_probability("target", target)?;
    check_count("s", s)?;
    check_count("m", m)?;

    if full_task_success_probability(p, 1, s, m)? >= target {
        return Ok(1);
    }
    if p <= 0.5 {
        return Err(DomainError::TargetUnreachable { p, target });
    }

    let inner = target.powf(-f64::from(m) / f64::from(s)) - 1.0;
    let ratio = (1.0 - p) / p;
    let estimate = (inner.ln() / ratio.ln()).ceil();
    let mut k = if estimate.is_finite() && estimate >= 1.0 {
        estimate.min(f64::from(u32::MAX)) as u32
    } else {
        1
    };

    // The closed form can land one short through rounding
    while k < u32::MAX && full_task_success_probability(p, k, s, m)? < target {
        k += 1;
    }
    Ok(k)
}

/// Expected number of calls and cost for a task of `s` steps.
///
/// Assumes the winner needs `k` votes, the runner-up collects about half of
/// `k - 1`, and one attempt in ten is red-flagged.
pub fn expected_cost_estimate(
    p: f64,
    k: u32,
    s: u32,
    cost_per_call: f64,
) -> Result<CostEstimate, DomainError> {
    check_probability("p", p)?;
    check_count("k", k)?;
    check_count("s", s)?;
    if !(cost_per_call >= 0.0 && cost_per_call.is_finite()) {
        return Err(DomainError::InvalidCost(cost_per_call));
    }

    let k = f64::from(k);
    let votes_per_step = k + (k - 1.0) * 0.5 + k * RED_FLAG_RATE;
    let total_votes = votes_per_step * f64::from(s);

    Ok(CostEstimate {
        votes_per_step: round_to(votes_per_step, 2),
        total_votes: round_to(total_votes, 1),
        total_cost: round_to(total_votes * cost_per_call, 4),
        cost_per_step: round_to(votes_per_step * cost_per_call, 4),
    })
}

/// Recommend a margin for a task of `s` steps with per-step accuracy `p`.
pub fn recommend_k(p: f64, s: u32, task_type: TaskType) -> Result<KRecommendation, DomainError> {
    let target = task_type.target();
    let k_min = minimum_k_for_target(p, s, target, 1)?;
    let recommended_k = match task_type {
        TaskType::Fast => k_min,
        TaskType::Standard | TaskType::HighStakes => k_min.max(RECOMMENDED_MIN_K),
    };
    let reliability = full_task_success_probability(p, recommended_k, s, 1)?;

    Ok(KRecommendation {
        recommended_k,
        k_min,
        task_success_probability: round_to(reliability, 4),
        target,
        reasoning: format!(
            "For p={:.2} and s={} steps, k={} achieves {:.1}% reliability",
            p,
            s,
            recommended_k,
            reliability * 100.0
        ),
    })
}
