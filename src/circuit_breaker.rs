use failsafe::backoff::{self, Exponential};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::{Config, StateMachine};
use std::time::Duration;

/// Circuit breaker type guarding geocoder lookups.
pub type GeocoderCircuitBreaker = StateMachine<ConsecutiveFailures<Exponential>, ()>;

/// Creates a circuit breaker for geocoder requests so a failing postcode API
/// is not hammered once per company in a batch.
///
/// # Configuration
///
/// - **Failure threshold**: `failure_threshold` consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// While OPEN, lookups are rejected without a request and the resolver
/// reports the distance as unresolved.
///
/// # Arguments
///
/// * `failure_threshold` - Consecutive failures before the circuit opens.
///
/// # Returns
///
/// * `GeocoderCircuitBreaker` - The configured circuit breaker instance.
pub fn create_geocoder_circuit_breaker(failure_threshold: u32) -> GeocoderCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(failure_threshold, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
