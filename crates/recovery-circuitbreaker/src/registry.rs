use crate::circuit::{CircuitBreakerStats, CircuitState};
use crate::config::CircuitBreakerConfig;
use crate::CircuitBreaker;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Maps dependency names to breakers, creating them on first access.
///
/// Breakers are never removed; they can only be reset.
pub struct CircuitBreakerRegistry {
    default_config: CircuitBreakerConfig,
    breakers: RwLock<BTreeMap<String, CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    /// Creates a registry whose lazily created breakers use `default_config`.
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            default_config,
            breakers: RwLock::new(BTreeMap::new()),
        }
    }

    /// The process-wide default registry.
    pub fn global() -> Arc<CircuitBreakerRegistry> {
        static GLOBAL: OnceLock<Arc<CircuitBreakerRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(CircuitBreakerRegistry::default())))
    }

    /// Returns the breaker for `name`, creating it with the default config.
    pub fn get_or_create(&self, name: &str) -> CircuitBreaker {
        self.get_or_create_with(name, || self.default_config.clone())
    }

    /// Returns the breaker for `name`, creating it with `config()` if absent.
    /// An existing breaker keeps its original config.
    pub fn get_or_create_with<F>(&self, name: &str, config: F) -> CircuitBreaker
    where
        F: FnOnce() -> CircuitBreakerConfig,
    {
        if let Some(breaker) = self.breakers.read().get(name) {
            return breaker.clone();
        }

        let mut breakers = self.breakers.write();
        breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                #[cfg(feature = "tracing")]
                tracing::debug!(breaker = name, "registering circuit breaker");
                CircuitBreaker::new(name, config())
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<CircuitBreaker> {
        self.breakers.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.breakers.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.read().is_empty()
    }

    /// Names of dependencies whose breaker is open, in name order.
    pub fn unhealthy(&self) -> Vec<String> {
        self.breakers
            .read()
            .iter()
            .filter(|(_, breaker)| breaker.state() == CircuitState::Open)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn all_stats(&self) -> BTreeMap<String, CircuitBreakerStats> {
        let breakers: Vec<CircuitBreaker> = self.breakers.read().values().cloned().collect();
        breakers
            .into_iter()
            .map(|breaker| (breaker.name().to_string(), breaker.get_stats()))
            .collect()
    }

    /// Resets one breaker. Returns false if no breaker has that name.
    pub fn reset(&self, name: &str) -> bool {
        match self.get(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    /// Resets every breaker and returns how many there were.
    pub fn reset_all(&self) -> usize {
        let breakers: Vec<CircuitBreaker> = self.breakers.read().values().cloned().collect();
        for breaker in &breakers {
            breaker.reset();
        }
        breakers.len()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("breakers", &self.names())
            .finish()
    }
}
