use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for the remote speech services and the local audio tools.
#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub api_key: String,
    pub api_base: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub stt_model: String,
    /// Program plus arguments used to play a synthesized mp3. The file path
    /// replaces a `{file}` argument, or is appended when there is none.
    pub player_command: Vec<String>,
    /// Program plus arguments used to record one utterance as WAV, with the
    /// same `{file}` convention.
    pub recorder_command: Vec<String>,
    /// How long to wait for the learner to start speaking.
    pub listen_timeout: Duration,
    /// Maximum length of one recorded phrase.
    pub phrase_limit: Duration,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub visual_catalog_path: PathBuf,
    pub hearing_catalog_path: PathBuf,
    pub video_dir: PathBuf,
    pub speech: SpeechConfig,
    /// Ask "Are you visually impaired?" out loud on `/` instead of only showing the choice screen.
    pub voice_greeting: bool,
    /// Speak the topic summary on the server whenever a video is requested.
    pub caption_playback: bool,
}

fn default_player() -> &'static str {
    if cfg!(target_os = "macos") {
        "afplay"
    } else {
        "mpg123 -q"
    }
}

/// sox: record mono 16 kHz and stop after 1.5 s of silence following speech.
const DEFAULT_RECORDER: &str = "rec -q -c 1 -r 16000 {file} silence 1 0.1 1% 1 1.5 1%";

fn split_command(var: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        return Err(ConfigError::InvalidValue(
            var.to_string(),
            "command must not be empty".to_string(),
        ));
    }
    Ok(parts)
}

fn parse_secs(var: &str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string())),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

fn parse_flag(var: &str) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue(
                var.to_string(),
                format!("'{}' is not a boolean", value),
            )),
        },
        Err(_) => Ok(false),
    }
}

fn path_var(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::MissingVar("OPENAI_API_KEY must be set for speech services".to_string())
        })?;
        let api_base = std::env::var("SPEECH_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let player = std::env::var("PLAYER_COMMAND").unwrap_or_else(|_| default_player().to_string());
        let recorder = std::env::var("RECORDER_COMMAND").unwrap_or_else(|_| DEFAULT_RECORDER.to_string());

        let speech = SpeechConfig {
            api_key,
            api_base,
            tts_model: std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            tts_voice: std::env::var("TTS_VOICE").unwrap_or_else(|_| "alloy".to_string()),
            stt_model: std::env::var("STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string()),
            player_command: split_command("PLAYER_COMMAND", &player)?,
            recorder_command: split_command("RECORDER_COMMAND", &recorder)?,
            listen_timeout: parse_secs("LISTEN_TIMEOUT_SECS", 6)?,
            phrase_limit: parse_secs("PHRASE_LIMIT_SECS", 6)?,
        };

        Ok(Self {
            bind_address,
            log_level,
            visual_catalog_path: path_var("VISUAL_CATALOG_PATH", "./visual.json"),
            hearing_catalog_path: path_var("HEARING_CATALOG_PATH", "./hearing.json"),
            video_dir: path_var("VIDEO_DIR", "./static/videos"),
            speech,
            voice_greeting: parse_flag("VOICE_GREETING")?,
            caption_playback: parse_flag("CAPTION_PLAYBACK")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    const ALL_VARS: &[&str] = &[
        "BIND_ADDRESS",
        "RUST_LOG",
        "VISUAL_CATALOG_PATH",
        "HEARING_CATALOG_PATH",
        "VIDEO_DIR",
        "OPENAI_API_KEY",
        "SPEECH_API_BASE",
        "TTS_MODEL",
        "TTS_VOICE",
        "STT_MODEL",
        "PLAYER_COMMAND",
        "RECORDER_COMMAND",
        "LISTEN_TIMEOUT_SECS",
        "PHRASE_LIMIT_SECS",
        "VOICE_GREETING",
        "CAPTION_PLAYBACK",
    ];

    fn clear_env_vars() {
        unsafe {
            for var in ALL_VARS {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.visual_catalog_path, PathBuf::from("./visual.json"));
        assert_eq!(config.hearing_catalog_path, PathBuf::from("./hearing.json"));
        assert_eq!(config.video_dir, PathBuf::from("./static/videos"));
        assert_eq!(config.speech.api_key, "test-openai-key");
        assert_eq!(config.speech.api_base, "https://api.openai.com/v1");
        assert_eq!(config.speech.tts_model, "tts-1");
        assert_eq!(config.speech.tts_voice, "alloy");
        assert_eq!(config.speech.stt_model, "whisper-1");
        assert_eq!(config.speech.recorder_command[0], "rec");
        assert!(config.speech.recorder_command.contains(&"{file}".to_string()));
        assert!(!config.speech.player_command.is_empty());
        assert_eq!(config.speech.listen_timeout, Duration::from_secs(6));
        assert_eq!(config.speech.phrase_limit, Duration::from_secs(6));
        assert!(!config.voice_greeting);
        assert!(!config.caption_playback);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("RUST_LOG", "debug");
            env::set_var("VISUAL_CATALOG_PATH", "/data/visual.json");
            env::set_var("HEARING_CATALOG_PATH", "/data/hearing.json");
            env::set_var("VIDEO_DIR", "/data/videos");
            env::set_var("SPEECH_API_BASE", "http://localhost:8000/v1");
            env::set_var("TTS_VOICE", "nova");
            env::set_var("PLAYER_COMMAND", "ffplay -nodisp -autoexit");
            env::set_var("RECORDER_COMMAND", "arecord -q -f S16_LE");
            env::set_var("LISTEN_TIMEOUT_SECS", "3");
            env::set_var("PHRASE_LIMIT_SECS", "10");
            env::set_var("VOICE_GREETING", "true");
            env::set_var("CAPTION_PLAYBACK", "1");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.visual_catalog_path, PathBuf::from("/data/visual.json"));
        assert_eq!(config.hearing_catalog_path, PathBuf::from("/data/hearing.json"));
        assert_eq!(config.video_dir, PathBuf::from("/data/videos"));
        assert_eq!(config.speech.api_base, "http://localhost:8000/v1");
        assert_eq!(config.speech.tts_voice, "nova");
        assert_eq!(
            config.speech.player_command,
            vec!["ffplay", "-nodisp", "-autoexit"]
        );
        assert_eq!(
            config.speech.recorder_command,
            vec!["arecord", "-q", "-f", "S16_LE"]
        );
        assert_eq!(config.speech.listen_timeout, Duration::from_secs(3));
        assert_eq!(config.speech.phrase_limit, Duration::from_secs(10));
        assert!(config.voice_greeting);
        assert!(config.caption_playback);
    }

    #[test]
    #[serial]
    fn test_config_missing_api_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_timeouts_and_flags() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("LISTEN_TIMEOUT_SECS", "soon");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "LISTEN_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for LISTEN_TIMEOUT_SECS"),
        }

        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("VOICE_GREETING", "maybe");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "VOICE_GREETING"),
            _ => panic!("Expected InvalidValue for VOICE_GREETING"),
        }
    }

    #[test]
    #[serial]
    fn test_config_blank_recorder_command() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RECORDER_COMMAND", "   ");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RECORDER_COMMAND"),
            _ => panic!("Expected InvalidValue for RECORDER_COMMAND"),
        }
    }
}
