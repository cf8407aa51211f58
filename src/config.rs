use std::time::Duration;

/// Tunables for the game engine and turn scheduler
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Per-turn duration used when a game is created without one
    pub default_turn_duration_secs: u64,
    /// Points awarded for playing the whole rack in one move
    pub bingo_bonus: u32,
    /// Rounds of consecutive skips (times player count) before a game is ended early
    pub consecutive_skip_rounds: u32,
    /// How long a lobby may stay in WAITING before it is terminated
    pub waiting_timeout: Duration,
    /// Delay used for near-immediate deferred transitions (start/end)
    pub deferred_delay: Duration,
    /// Board side length used when a game is created without dimensions
    pub default_board_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_turn_duration_secs: 120,
            bingo_bonus: 50,
            consecutive_skip_rounds: 2,
            waiting_timeout: Duration::from_secs(60 * 60), // 1 hour
            deferred_delay: Duration::from_millis(100),
            default_board_size: 15,
        }
    }
}

impl GameConfig {
    /// Builds the configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_turn_duration_secs: env_or(
                "TURN_DURATION_SECONDS",
                defaults.default_turn_duration_secs,
            ),
            bingo_bonus: env_or("BINGO_BONUS", defaults.bingo_bonus),
            consecutive_skip_rounds: env_or(
                "SKIP_ROUNDS_BEFORE_END",
                defaults.consecutive_skip_rounds,
            ),
            waiting_timeout: Duration::from_secs(env_or(
                "WAITING_TIMEOUT_SECONDS",
                defaults.waiting_timeout.as_secs(),
            )),
            deferred_delay: Duration::from_millis(env_or(
                "DEFERRED_ACTION_DELAY_MS",
                defaults.deferred_delay.as_millis() as u64,
            )),
            default_board_size: env_or("BOARD_SIZE", defaults.default_board_size),
        }
    }

    /// Number of consecutive skips that force a game to end for the given player count
    pub fn skip_threshold(&self, player_count: u32) -> u32 {
        self.consecutive_skip_rounds.max(1) * player_count.max(1)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
