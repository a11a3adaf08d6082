//! Reaction engine configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::CoordinatorConfig;

/// Retry settings for the reaction coordinator.
///
/// Read from `REACTIONS_MAX_ATTEMPTS`, `REACTIONS_INITIAL_BACKOFF_MS` and
/// `REACTIONS_MAX_BACKOFF_MS`. Unset values take the same defaults as
/// [`CoordinatorConfig::default`].
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REACTIONS")]
pub struct ReactionSettings {
    /// Commit attempts per reaction, including the first.
    #[ortho_config(default = 3)]
    pub max_attempts: u32,
    /// Backoff before the first retry, in milliseconds.
    #[ortho_config(default = 20)]
    pub initial_backoff_ms: u64,
    /// Upper bound on a single backoff, in milliseconds.
    #[ortho_config(default = 250)]
    pub max_backoff_ms: u64,
}

impl ReactionSettings {
    /// Coordinator configuration built from these settings.
    ///
    /// `max_attempts` is clamped to at least one and `max_backoff` to at
    /// least `initial_backoff`.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let initial_backoff = Duration::from_millis(self.initial_backoff_ms);
        CoordinatorConfig {
            max_attempts: self.max_attempts.max(1),
            initial_backoff,
            max_backoff: Duration::from_millis(self.max_backoff_ms).max(initial_backoff),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for reaction settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> ReactionSettings {
        ReactionSettings::load_from_iter([OsString::from("reactions")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env([
            ("REACTIONS_MAX_ATTEMPTS", None::<String>),
            ("REACTIONS_INITIAL_BACKOFF_MS", None::<String>),
            ("REACTIONS_MAX_BACKOFF_MS", None::<String>),
        ]);

        let config = load_from_empty_args().coordinator_config();
        assert_eq!(config, CoordinatorConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("REACTIONS_MAX_ATTEMPTS", Some("5".to_owned())),
            ("REACTIONS_INITIAL_BACKOFF_MS", Some("5".to_owned())),
            ("REACTIONS_MAX_BACKOFF_MS", Some("80".to_owned())),
        ]);

        let config = load_from_empty_args().coordinator_config();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_backoff, Duration::from_millis(5));
        assert_eq!(config.max_backoff, Duration::from_millis(80));
    }

    #[rstest]
    fn partial_environment_keeps_remaining_defaults() {
        let _guard = lock_env([
            ("REACTIONS_MAX_ATTEMPTS", Some("7".to_owned())),
            ("REACTIONS_INITIAL_BACKOFF_MS", None),
            ("REACTIONS_MAX_BACKOFF_MS", None),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.max_attempts, 7);
        assert_eq!(settings.initial_backoff_ms, 20);
        assert_eq!(settings.max_backoff_ms, 250);
    }

    #[rstest]
    #[case(0, 40, 10, 1, 40)]
    #[case(3, 30, 250, 3, 250)]
    #[case(2, 20, 5, 2, 20)]
    fn coordinator_config_clamps_out_of_range_values(
        #[case] max_attempts: u32,
        #[case] initial_backoff_ms: u64,
        #[case] max_backoff_ms: u64,
        #[case] expected_attempts: u32,
        #[case] expected_max_backoff_ms: u64,
    ) {
        let settings = ReactionSettings {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
        };

        let config = settings.coordinator_config();
        assert_eq!(config.max_attempts, expected_attempts);
        assert_eq!(config.max_backoff, Duration::from_millis(expected_max_backoff_ms));
    }
}
