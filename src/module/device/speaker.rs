//! Speech Handler.

use std::process::{Child, Command, Stdio};

/// Errors from the speech backend.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("failed to start speech command {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// Speech output capability.
///
/// At most one utterance is audible at a time; callers cancel before speaking.
pub trait Narrator: Send {
    /// Start speaking `text` without waiting for it to finish.
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;
    /// Stop the utterance in progress, if any.
    fn cancel_current(&mut self);
}

/// Speak through an external command such as `espeak-ng`.
///
/// The sentence is passed as the last argument of the command.
pub struct CommandNarrator {
    command: String,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandNarrator {
    pub fn new(command: &str, args: &[String]) -> Self {
        Self {
            command: command.to_string(),
            args: args.to_vec(),
            current: None,
        }
    }
}

impl Narrator for CommandNarrator {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        self.current = Some(child);
        Ok(())
    }

    fn cancel_current(&mut self) {
        if let Some(mut child) = self.current.take() {
            // Already finished utterances are simply reaped.
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
                log::debug!("Utterance cancelled. pid: {}", child.id());
            }
            let _ = child.wait();
        }
    }
}

impl Drop for CommandNarrator {
    fn drop(&mut self) {
        self.cancel_current();
    }
}

/// Narrator for hosts without speech. Does nothing.
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        log::debug!("Silent narration: {}", text);
        Ok(())
    }

    fn cancel_current(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_command_test() {
        let mut narrator = CommandNarrator::new("visiontalk-no-such-speech-command", &[]);
        let res = narrator.speak("hello");
        assert!(matches!(res, Err(SpeechError::Spawn { .. })));
        // nothing to cancel
        narrator.cancel_current();
    }

    #[test]
    fn cancel_running_command_test() {
        // `sleep` stands in for a long utterance; the text becomes its argument.
        let mut narrator = CommandNarrator::new("sleep", &[]);
        narrator.speak("5").unwrap();
        assert!(narrator.current.is_some());
        let started = std::time::Instant::now();
        narrator.cancel_current();
        assert!(narrator.current.is_none());
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn silent_narrator_test() {
        let mut narrator = SilentNarrator;
        assert!(narrator.speak("hello").is_ok());
        narrator.cancel_current();
    }
}
