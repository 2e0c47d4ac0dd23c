use crate::battle::rng::TurnRng;
use crate::config::CaptureConfig;
use schema::StatusType;
use tracing::trace;

/// A modified rate at or above this skips every check.
pub const GUARANTEED_RATE: u32 = 255;
const SHAKE_EXPONENT: f64 = 0.1875;
const SHAKE_RANGE: u32 = 65536;

pub fn status_multiplier(status: Option<StatusType>) -> f64 {
    match status {
        Some(StatusType::Sleep) | Some(StatusType::Freeze) => 2.5,
        Some(_) => 1.5,
        None => 1.0,
    }
}

/// Capture difficulty after HP, tool and status are accounted for.
///
/// `round(((3*max_hp - 2*current_hp) * base_rate * tool / (3*max_hp)) * status)`,
/// rounded half away from zero.
pub fn modified_rate(
    max_hp: u16,
    current_hp: u16,
    base_rate: u8,
    tool_multiplier: f64,
    status_multiplier: f64,
) -> u32 {
    if max_hp == 0 {
        return 0;
    }
    let max_hp = f64::from(max_hp);
    let current_hp = f64::from(current_hp).min(max_hp);
    let hp_term = 3.0 * max_hp - 2.0 * current_hp;
    let rate = hp_term * f64::from(base_rate) * tool_multiplier / (3.0 * max_hp) * status_multiplier;
    rate.round().max(0.0) as u32
}

/// Chance, out of 65536, that one check passes.
pub fn shake_probability(modified_rate: u32) -> u32 {
    if modified_rate == 0 {
        return 0;
    }
    let ratio = f64::from(GUARANTEED_RATE) / f64::from(modified_rate);
    (f64::from(SHAKE_RANGE) / ratio.powf(SHAKE_EXPONENT)).round() as u32
}

/// Chance, out of 256, that an attempt is critical.
pub fn critical_chance(modified_rate: u32, multiplier: f64) -> u32 {
    let capped = f64::from(modified_rate.min(GUARANTEED_RATE));
    (capped * multiplier / 6.0).floor().max(0.0) as u32
}

/// What happened during one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub modified_rate: u32,
    pub critical: bool,
    /// Outcome of each check performed, in order. Stops at the first failure.
    pub checks: Vec<bool>,
    pub success: bool,
}

impl CaptureResult {
    pub fn checks_passed(&self) -> u8 {
        self.checks.iter().filter(|&&passed| passed).count() as u8
    }
}

/// Inputs for an attempt, gathered by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureAttempt {
    pub modified_rate: u32,
    pub guaranteed: bool,
    pub obtainable: bool,
}

/// Runs the critical roll and the shake checks for one attempt.
///
/// Draw order: the critical roll (only when its chance is non-zero), then one
/// draw per check until a check fails.
pub fn resolve_attempt(
    attempt: CaptureAttempt,
    config: &CaptureConfig,
    rng: &mut TurnRng,
) -> CaptureResult {
    let modified_rate = attempt.modified_rate;
    let mut result = CaptureResult {
        modified_rate,
        critical: false,
        checks: Vec::new(),
        success: false,
    };

    if !attempt.obtainable {
        result.checks.push(false);
        return result;
    }
    if attempt.guaranteed || modified_rate >= GUARANTEED_RATE {
        result.checks = vec![true; usize::from(config.shake_checks)];
        result.success = true;
        return result;
    }
    if modified_rate == 0 {
        return result;
    }

    let critical_odds = critical_chance(modified_rate, config.critical_multiplier);
    if critical_odds > 0 {
        result.critical = rng.range(0, 256, "critical capture") < critical_odds;
    }
    let required = if result.critical { 1 } else { config.shake_checks };
    let probability = shake_probability(modified_rate);

    for check in 0..required {
        let roll = rng.range(0, SHAKE_RANGE, "shake check");
        let passed = roll < probability;
        trace!(check, roll, probability, passed, "shake check");
        result.checks.push(passed);
        if !passed {
            return result;
        }
    }
    result.success = true;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_modified_rate_at_full_health() {
        // (300 - 200) * 45 / 300 = 15
        assert_eq!(modified_rate(100, 100, 45, 1.0, 1.0), 15);
        assert_eq!(shake_probability(15), 38527);
    }

    #[test]
    fn test_modified_rate_rounds_half_away_from_zero() {
        // (300 - 100) * 45 * 1.5 / 300 * 2.5 = 112.5
        assert_eq!(modified_rate(100, 50, 45, 1.5, 2.5), 113);
    }

    #[rstest]
    #[case(None, 1.0)]
    #[case(Some(StatusType::Sleep), 2.5)]
    #[case(Some(StatusType::Freeze), 2.5)]
    #[case(Some(StatusType::Paralysis), 1.5)]
    #[case(Some(StatusType::Toxic), 1.5)]
    fn test_status_multiplier(#[case] status: Option<StatusType>, #[case] expected: f64) {
        assert_eq!(status_multiplier(status), expected);
    }

    #[test]
    fn test_critical_chance() {
        assert_eq!(critical_chance(15, 1.0), 2);
        assert_eq!(critical_chance(400, 1.0), 42);
        assert_eq!(critical_chance(15, 0.0), 0);
    }

    fn attempt(modified_rate: u32) -> CaptureAttempt {
        CaptureAttempt {
            modified_rate,
            guaranteed: false,
            obtainable: true,
        }
    }

    #[test]
    fn test_normal_attempt_needs_every_check() {
        // Critical roll 200 >= 2, then three passing checks.
        let mut rng = TurnRng::scripted(vec![200, 0, 38526, 100]);
        let result = resolve_attempt(attempt(15), &CaptureConfig::default(), &mut rng);
        assert!(!result.critical);
        assert_eq!(result.checks, vec![true, true, true]);
        assert!(result.success);
        assert_eq!(rng.script_remaining(), 0);
    }

    #[test]
    fn test_failed_check_stops_the_attempt() {
        let mut rng = TurnRng::scripted(vec![200, 10, 38527, 0]);
        let result = resolve_attempt(attempt(15), &CaptureConfig::default(), &mut rng);
        assert_eq!(result.checks, vec![true, false]);
        assert_eq!(result.checks_passed(), 1);
        assert!(!result.success);
        // The third check was never drawn.
        assert_eq!(rng.script_remaining(), 1);
    }

    #[test]
    fn test_critical_attempt_performs_one_check() {
        let mut rng = TurnRng::scripted(vec![1, 5]);
        let result = resolve_attempt(attempt(15), &CaptureConfig::default(), &mut rng);
        assert!(result.critical);
        assert_eq!(result.checks, vec![true]);
        assert!(result.success);
    }

    #[test]
    fn test_guaranteed_and_threshold_skip_the_rng() {
        let mut rng = TurnRng::scripted(vec![]);
        let tool = CaptureAttempt {
            guaranteed: true,
            ..attempt(3)
        };
        assert!(resolve_attempt(tool, &CaptureConfig::default(), &mut rng).success);
        assert!(resolve_attempt(attempt(255), &CaptureConfig::default(), &mut rng).success);
        assert_eq!(rng.state().seed, 0);
    }

    #[test]
    fn test_unobtainable_and_zero_rate_fail() {
        let mut rng = TurnRng::scripted(vec![]);
        let locked = CaptureAttempt {
            obtainable: false,
            guaranteed: true,
            modified_rate: 255,
        };
        let result = resolve_attempt(locked, &CaptureConfig::default(), &mut rng);
        assert_eq!(result.checks, vec![false]);
        assert!(!result.success);

        let result = resolve_attempt(attempt(0), &CaptureConfig::default(), &mut rng);
        assert!(result.checks.is_empty());
        assert!(!result.success);
    }
}
