//! Process configuration loaded from environment variables

use crate::types::GameConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP/WebSocket server listens on
    pub bind: SocketAddr,
    /// JSON question file (None = built-in questions)
    pub questions_path: Option<PathBuf>,
    /// Directory served for everything that isn't an API route
    pub static_dir: PathBuf,
    pub game: GameConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            questions_path: None,
            static_dir: PathBuf::from("static"),
            game: GameConfig::default(),
        }
    }
}

/// Parse an env var, falling back to `default` when unset or invalid
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = GameConfig::default();

        let bind = env_or("IMPOSTER_BIND", Self::default().bind);
        let questions_path = std::env::var("IMPOSTER_QUESTIONS")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let static_dir = std::env::var("IMPOSTER_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));

        let mut game = GameConfig {
            max_players: env_or("IMPOSTER_MAX_PLAYERS", defaults.max_players),
            min_players: env_or("IMPOSTER_MIN_PLAYERS", defaults.min_players),
            max_answer_chars: env_or("IMPOSTER_MAX_ANSWER_CHARS", defaults.max_answer_chars),
        };

        // A round needs at least one player and must fit in the lobby
        if game.min_players == 0 || game.min_players > game.max_players {
            tracing::warn!(
                "IMPOSTER_MIN_PLAYERS={} is outside 1..={}, using {}",
                game.min_players,
                game.max_players,
                defaults.min_players.min(game.max_players)
            );
            game.min_players = defaults.min_players.min(game.max_players).max(1);
        }

        tracing::info!(
            %bind,
            questions = ?questions_path,
            static_dir = %static_dir.display(),
            max_players = game.max_players,
            min_players = game.min_players,
            max_answer_chars = game.max_answer_chars,
            "Config loaded"
        );

        Self {
            bind,
            questions_path,
            static_dir,
            game,
        }
    }
}
