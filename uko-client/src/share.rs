//! Share and clipboard adapters
//!
//! A share target is optional (the platform may not have one); the
//! clipboard is the fallback. The share target is an external program fed
//! on stdin; the clipboard goes through `arboard`, with command-line tools
//! as a last resort.

use crate::error::{ClipboardError, ShareError};
use async_trait::async_trait;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub const SHARE_TITLE: &str = "My Single Status";

/// What gets handed to a share target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

/// Summary line used for both sharing and copying
pub fn share_text(displayed_percentage: u8, message: &str) -> String {
    format!(
        "According to Uko Single Predictor, I'm {}% single! {}",
        displayed_percentage, message
    )
}

/// Native "share" capability
#[async_trait]
pub trait ShareTarget: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// Plain-text clipboard
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Share target backed by a user-configured command
///
/// The text goes to stdin; title and link are exported as
/// `UKO_SHARE_TITLE` / `UKO_SHARE_URL`.
pub struct CommandShareTarget {
    argv: Vec<String>,
}

impl CommandShareTarget {
    /// `None` for an empty command line
    pub fn new(argv: Vec<String>) -> Option<Self> {
        (!argv.is_empty()).then_some(Self { argv })
    }
}

#[async_trait]
impl ShareTarget for CommandShareTarget {
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| ShareError::Unavailable("empty share command".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .env("UKO_SHARE_TITLE", &payload.title)
            .env("UKO_SHARE_URL", payload.url.as_deref().unwrap_or(""));

        let status = pipe_text(command, &payload.text).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ShareError::Unavailable(format!("{} not found", program))
            } else {
                ShareError::Io(e)
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ShareError::Failed(format!("{} exited with {}", program, status)))
        }
    }
}

/// Clipboard backed by the platform clipboard service
///
/// Writes through `arboard` first. When no native clipboard is reachable
/// (headless session, no display server) the text goes to the first
/// command-line tool that accepts it.
pub struct SystemClipboard {
    // kept alive for the whole session; on X11 the selection is served by
    // this handle and disappears when it is dropped
    native: Mutex<Option<arboard::Clipboard>>,
    tools: ToolClipboard,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            native: Mutex::new(None),
            tools: ToolClipboard::platform_default(),
        }
    }

    fn write_native(&self, text: &str) -> Result<(), String> {
        let mut guard = self
            .native
            .lock()
            .map_err(|_| "clipboard handle poisoned".to_string())?;
        if guard.is_none() {
            *guard = Some(arboard::Clipboard::new().map_err(|e| e.to_string())?);
        }
        match guard.as_mut() {
            Some(clipboard) => clipboard.set_text(text.to_string()).map_err(|e| e.to_string()),
            None => Err("clipboard unavailable".to_string()),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        match self.write_native(text) {
            Ok(()) => {
                debug!("Copied text to native clipboard");
                Ok(())
            }
            Err(reason) => {
                debug!(reason = %reason, "Native clipboard unavailable, trying clipboard tools");
                self.tools.write_text(text).await
            }
        }
    }
}

/// Clipboard that pipes text into external tools, trying each in turn
///
/// A tool that is missing or exits non-zero is skipped; the last failure is
/// reported only when none of them accepted the text.
#[derive(Debug, Clone)]
pub struct ToolClipboard {
    tools: Vec<(String, Vec<String>)>,
}

impl ToolClipboard {
    pub fn new(tools: Vec<(String, Vec<String>)>) -> Self {
        Self { tools }
    }

    /// wl-copy, xclip, xsel, pbcopy, clip
    pub fn platform_default() -> Self {
        let tools: [(&str, &[&str]); 5] = [
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
            ("pbcopy", &[]),
            ("clip", &[]),
        ];
        Self::new(
            tools
                .iter()
                .map(|(tool, args)| {
                    (tool.to_string(), args.iter().map(|a| a.to_string()).collect())
                })
                .collect(),
        )
    }
}

#[async_trait]
impl Clipboard for ToolClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut last_error = ClipboardError::NoBackend;

        for (tool, args) in &self.tools {
            let mut command = Command::new(tool);
            command.args(args);

            match pipe_text(command, text).await {
                Ok(status) if status.success() => {
                    debug!(tool = %tool, "Copied text to clipboard");
                    return Ok(());
                }
                Ok(status) => {
                    debug!(tool = %tool, status = %status, "Clipboard tool failed, trying next");
                    last_error = ClipboardError::Tool {
                        tool: tool.clone(),
                        reason: format!("exited with {}", status),
                    };
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    debug!(tool = %tool, error = %e, "Clipboard tool could not run, trying next");
                    last_error = ClipboardError::Io(e);
                }
            }
        }
        Err(last_error)
    }
}

/// Run a command with `text` on stdin and wait for it
async fn pipe_text(mut command: Command, text: &str) -> io::Result<ExitStatus> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        // a tool may exit without reading; its exit status decides the outcome
        let written = match stdin.write_all(text.as_bytes()).await {
            Ok(()) => stdin.shutdown().await,
            Err(e) => Err(e),
        };
        match written {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
            _ => {}
        }
    }
    child.wait().await
}
