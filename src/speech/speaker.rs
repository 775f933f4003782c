use std::future::Future;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Failed to run speech command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Speech command exited with {0}")]
    Failed(ExitStatus),
}

/// Something that can read text aloud.
pub trait Speaker: Send + Sync + 'static {
    fn speak(
        &self,
        text: &str,
        language: &str,
    ) -> impl Future<Output = Result<(), SpeechError>> + Send;
}

/// Speaks through an external synthesizer such as `espeak-ng`.
///
/// Runs `<program> -v <language>` and writes the text to its stdin, so the
/// text can never be mistaken for a command-line flag.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn spawn_error(&self, source: std::io::Error) -> SpeechError {
        SpeechError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str, language: &str) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Ok(());
        }

        tracing::debug!(program = %self.program, language, chars = text.len(), "Speaking");

        let mut child = Command::new(&self.program)
            .arg("-v")
            .arg(language)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(text.as_bytes()).await {
                Ok(()) => {}
                // The synthesizer may exit without reading; its status decides.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!("Speech command closed stdin early");
                }
                Err(e) => return Err(self.spawn_error(e)),
            }
        }

        let status = child.wait().await.map_err(|e| self.spawn_error(e))?;
        if !status.success() {
            tracing::warn!(program = %self.program, %status, "Speech command failed");
            return Err(SpeechError::Failed(status));
        }
        Ok(())
    }
}
