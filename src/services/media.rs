//! Media and speech collaborators, interface-only. Hosts own the actual
//! capture pipelines; the core only needs to start/stop them and consume
//! transcripts.

use async_trait::async_trait;
use mockall::automock;
use tokio::sync::mpsc;

use crate::services::error::FocusdeckError;

/// A recognized chunk of speech. Interim results may be revised; a final
/// result is stable and ends the utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub is_final: bool,
}

#[automock]
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Starts a capture stream and returns a URL the card can attach.
    async fn start_capture(&self, kind: String) -> Result<String, FocusdeckError>;
    async fn stop_capture(&self) -> Result<(), FocusdeckError>;
}

#[automock]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Starts listening; transcripts flow through the returned channel
    /// until the stream ends or `stop` is called.
    async fn start(&self) -> Result<mpsc::UnboundedReceiver<Transcript>, FocusdeckError>;
    async fn stop(&self) -> Result<(), FocusdeckError>;
}

#[automock]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: String, voice: Option<String>) -> Result<(), FocusdeckError>;
}
