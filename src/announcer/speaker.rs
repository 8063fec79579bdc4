use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use crate::settings::VoiceSettings;

/// Speech backend. One call speaks one message and returns when it is finished.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, message: &str) -> Result<()>;
}

/// macOS `say` command.
pub struct SaySpeaker {
    voice: String,
    rate: u32,
    program: String,
}

impl SaySpeaker {
    pub fn new(settings: &VoiceSettings) -> Self {
        Self::with_program(settings, "say")
    }

    pub fn with_program(settings: &VoiceSettings, program: impl Into<String>) -> Self {
        Self {
            voice: settings.voice.clone(),
            rate: settings.rate,
            program: program.into(),
        }
    }
}

#[async_trait]
impl Speaker for SaySpeaker {
    async fn speak(&self, message: &str) -> Result<()> {
        // The message is passed as its own argv entry, so no shell quoting is involved.
        let output = Command::new(&self.program)
            .arg("-v")
            .arg(&self.voice)
            .arg("-r")
            .arg(self.rate.to_string())
            .arg(message)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.program))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let speaker = SaySpeaker::with_program(&VoiceSettings::default(), "angeleyes-no-such-say");
        let err = speaker.speak("hello").await.unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let speaker = SaySpeaker::with_program(&VoiceSettings::default(), "false");
        assert!(speaker.speak("hello").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_exit_is_ok() {
        let speaker = SaySpeaker::with_program(&VoiceSettings::default(), "true");
        speaker.speak("it's fine").await.unwrap();
    }
}
