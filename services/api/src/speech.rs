//! Remote Speech Adapter
//!
//! Production `SpeechIo`: text-to-speech and speech-to-text go through an
//! OpenAI-compatible audio API, playback and microphone capture through
//! external commands. Every failure is contained here; callers only ever see
//! "speech finished" or a (possibly empty) transcript.

use crate::config::SpeechConfig;
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        CreateSpeechRequestArgs, CreateTranscriptionRequestArgs, SpeechModel,
        SpeechResponseFormat, Voice,
    },
};
use async_trait::async_trait;
use clearpath_core::speech::SpeechIo;
use std::{
    ffi::OsString,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};
use tempfile::NamedTempFile;
use tokio::{process::Command, sync::Mutex};
use tracing::{debug, error, info, warn};

/// Placeholder replaced by the audio file path in player/recorder commands.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// A WAV file holding nothing but its header.
const EMPTY_WAV_LEN: u64 = 44;

#[derive(Debug, thiserror::Error)]
enum SpeechError {
    #[error("speech service error: {0}")]
    Service(#[from] OpenAIError),
    #[error("audio file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with {status}")]
    Command { program: String, status: ExitStatus },
    #[error("no speech detected within {0:?}")]
    Timeout(Duration),
    #[error("transcript was empty")]
    Unintelligible,
}

impl SpeechError {
    /// What the learner hears when listening fails.
    fn notice(&self) -> &'static str {
        match self {
            SpeechError::Unintelligible => "Sorry, I didn't understand that. Please try again.",
            SpeechError::Service(_) => "Couldn't connect to the speech service. Check your internet.",
            SpeechError::Timeout(_) => "Timed out waiting for speech. Please try again.",
            SpeechError::Io(_) | SpeechError::Command { .. } => {
                "Microphone error. Ensure microphone permissions are granted."
            }
        }
    }
}

/// `SpeechIo` backed by an OpenAI-compatible audio API and local audio tools.
pub struct RemoteSpeech {
    client: Client<OpenAIConfig>,
    config: SpeechConfig,
    /// Only one speak/listen may touch the audio devices at a time.
    io_lock: Mutex<()>,
}

impl RemoteSpeech {
    pub fn new(config: SpeechConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.api_base);
        info!(
            api_base = %config.api_base,
            tts_model = %config.tts_model,
            stt_model = %config.stt_model,
            "Configured remote speech adapter"
        );
        Self {
            client: Client::with_config(openai_config),
            config,
            io_lock: Mutex::new(()),
        }
    }

    async fn speak_unlocked(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        debug!(%text, "Speaking");
        if let Err(e) = self.try_speak(text).await {
            error!(error = %e, "Text-to-speech failed");
        }
    }

    async fn try_speak(&self, text: &str) -> Result<(), SpeechError> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(speech_model(&self.config.tts_model))
            .voice(voice(&self.config.tts_voice))
            .response_format(SpeechResponseFormat::Mp3)
            .build()?;
        let response = self.client.audio().speech(request).await?;

        let audio = temp_audio("clearpath_tts_", ".mp3")?;
        tokio::fs::write(audio.path(), &response.bytes).await?;
        run_to_end(&self.config.player_command, audio.path()).await
    }

    async fn try_transcribe(&self) -> Result<String, SpeechError> {
        let recording = temp_audio("clearpath_stt_", ".wav")?;
        self.record(recording.path()).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(recording.path())
            .model(&self.config.stt_model)
            .language("en")
            .build()?;
        let response = self.client.audio().transcribe(request).await?;

        let transcript = response.text.trim().to_lowercase();
        if transcript.is_empty() {
            return Err(SpeechError::Unintelligible);
        }
        info!(%transcript, "Recognized speech");
        Ok(transcript)
    }

    /// Records one utterance, bounded by the listen timeout plus the phrase limit.
    async fn record(&self, path: &Path) -> Result<(), SpeechError> {
        let bound = self.config.listen_timeout + self.config.phrase_limit;
        let (program, args) = command_line(&self.config.recorder_command, path);
        let mut child = Command::new(&program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        match tokio::time::timeout(bound, child.wait()).await {
            Ok(status) => {
                let status = status?;
                if !status.success() {
                    return Err(SpeechError::Command { program, status });
                }
            }
            Err(_) => {
                debug!(?bound, "Recording bound reached, stopping recorder");
                child.kill().await?;
            }
        }

        let recorded = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        if recorded <= EMPTY_WAV_LEN {
            return Err(SpeechError::Timeout(self.config.listen_timeout));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechIo for RemoteSpeech {
    async fn speak(&self, text: &str) {
        let _guard = self.io_lock.lock().await;
        self.speak_unlocked(text).await;
    }

    async fn listen(&self, prompt: &str) -> String {
        let _guard = self.io_lock.lock().await;
        self.speak_unlocked(prompt).await;
        match self.try_transcribe().await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(error = %e, "Speech recognition failed");
                self.speak_unlocked(e.notice()).await;
                String::new()
            }
        }
    }
}

fn temp_audio(prefix: &str, suffix: &str) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()
}

/// Splits a configured command into program and arguments, substituting the
/// file path for `{file}` or appending it when no placeholder is present.
fn command_line(parts: &[String], path: &Path) -> (String, Vec<OsString>) {
    let program = parts.first().cloned().unwrap_or_default();
    let mut substituted = false;
    let mut args: Vec<OsString> = parts
        .iter()
        .skip(1)
        .map(|arg| {
            if arg == FILE_PLACEHOLDER {
                substituted = true;
                path.as_os_str().to_os_string()
            } else {
                OsString::from(arg)
            }
        })
        .collect();
    if !substituted {
        args.push(path.as_os_str().to_os_string());
    }
    (program, args)
}

async fn run_to_end(parts: &[String], path: &Path) -> Result<(), SpeechError> {
    let (program, args) = command_line(parts, path);
    let status = Command::new(&program)
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(SpeechError::Command { program, status })
    }
}

fn speech_model(name: &str) -> SpeechModel {
    match name {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

fn voice(name: &str) -> Voice {
    match name.to_lowercase().as_str() {
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        "alloy" => Voice::Alloy,
        other => {
            warn!(voice = %other, "Unknown TTS voice, falling back to alloy");
            Voice::Alloy
        }
    }
}
