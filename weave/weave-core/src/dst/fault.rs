//! Fault Injection
//!
//! TigerStyle: Faults are declared up front and drawn from the seeded RNG.

use tokio::sync::Mutex;

use super::rng::DeterministicRng;
use crate::constants::DST_FAULT_PROBABILITY_MAX;

/// Kinds of fault a simulated store can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    /// Reads (`find_by_id`, `filter`, `count`) fail
    StoreReadFail,
    /// Writes (`next_id`, `insert`, `update`, `delete`) fail
    StoreWriteFail,
    /// Writes stall before they apply, then succeed
    StoreWriteSlow,
}

impl FaultType {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StoreReadFail => "store_read_fail",
            Self::StoreWriteFail => "store_write_fail",
            Self::StoreWriteSlow => "store_write_slow",
        }
    }
}

impl std::fmt::Display for FaultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fault and how often it fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultConfig {
    /// What fails
    pub fault_type: FaultType,
    /// Chance per operation, in `[0, 1]`
    pub probability: f64,
}

impl FaultConfig {
    /// Create a fault configuration.
    ///
    /// # Panics
    /// Panics if `probability` is outside `[0, DST_FAULT_PROBABILITY_MAX]`.
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        assert!(
            (0.0..=DST_FAULT_PROBABILITY_MAX).contains(&probability),
            "fault probability must be in [0, {}], got {}",
            DST_FAULT_PROBABILITY_MAX,
            probability
        );
        Self {
            fault_type,
            probability,
        }
    }

    /// A fault that fires on every operation.
    #[must_use]
    pub fn always(fault_type: FaultType) -> Self {
        Self::new(fault_type, DST_FAULT_PROBABILITY_MAX)
    }
}

/// Decides, per operation, whether a configured fault fires.
#[derive(Debug)]
pub struct FaultInjector {
    faults: Vec<FaultConfig>,
    rng: Mutex<DeterministicRng>,
}

impl FaultInjector {
    /// Create an injector with no faults.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            faults: Vec::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Register a fault.
    pub fn register(&mut self, config: FaultConfig) {
        self.faults.push(config);
    }

    /// Configured faults.
    #[must_use]
    pub fn faults(&self) -> &[FaultConfig] {
        &self.faults
    }

    /// Roll for `fault_type`. Returns true if it fires.
    pub async fn should_inject(&self, fault_type: FaultType) -> bool {
        let probability = self
            .faults
            .iter()
            .filter(|f| f.fault_type == fault_type)
            .map(|f| f.probability)
            .fold(0.0_f64, f64::max);
        if probability == 0.0 {
            return false;
        }

        let fired = self.rng.lock().await.chance(probability);
        if fired {
            tracing::debug!(fault = %fault_type, "Injecting fault");
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unregistered_fault_never_fires() {
        let injector = FaultInjector::new(DeterministicRng::new(3));

        for _ in 0..50 {
            assert!(!injector.should_inject(FaultType::StoreReadFail).await);
        }
    }

    #[tokio::test]
    async fn test_always_fires() {
        let mut injector = FaultInjector::new(DeterministicRng::new(3));
        injector.register(FaultConfig::always(FaultType::StoreWriteFail));

        assert!(injector.should_inject(FaultType::StoreWriteFail).await);
        assert!(!injector.should_inject(FaultType::StoreReadFail).await);
    }

    #[test]
    fn test_same_seed_same_faults() {
        let run = |seed| {
            tokio_test::block_on(async move {
                let mut injector = FaultInjector::new(DeterministicRng::new(seed));
                injector.register(FaultConfig::new(FaultType::StoreReadFail, 0.5));
                let mut fired = Vec::new();
                for _ in 0..32 {
                    fired.push(injector.should_inject(FaultType::StoreReadFail).await);
                }
                fired
            })
        };

        assert_eq!(run(99), run(99));
    }

    #[test]
    #[should_panic(expected = "fault probability must be in")]
    fn test_invalid_probability() {
        let _ = FaultConfig::new(FaultType::StoreReadFail, -0.1);
    }
}
