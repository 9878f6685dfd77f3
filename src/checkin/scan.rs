//! Bridges a code-scanning capability into a single decoded token per session.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::checkin::error::ScanError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Decoded(String),
    Undecodable,
    Closed,
}

/// Camera plus decoder. `stop` must be idempotent.
#[async_trait]
pub trait CodeScanner: Send {
    async fn start(&mut self) -> Result<(), ScanError>;
    async fn next_frame(&mut self) -> Result<Frame, ScanError>;
    fn stop(&mut self);
}

/// One scanning session. Emits at most one token and always releases the scanner,
/// including when the session is dropped before finishing.
pub struct ScanSession<'a, S: CodeScanner + ?Sized> {
    scanner: &'a mut S,
    started: bool,
}

impl<'a, S: CodeScanner + ?Sized> ScanSession<'a, S> {
    pub fn new(scanner: &'a mut S) -> Self {
        Self { scanner, started: false }
    }

    /// Scans until the first decodable code and sends it on `tx`.
    pub async fn run(mut self, tx: &mpsc::Sender<String>) -> Result<String, ScanError> {
        self.started = true;
        self.scanner.start().await?;
        info!("scanner started");

        let token = loop {
            match self.scanner.next_frame().await? {
                Frame::Decoded(token) if !token.trim().is_empty() => break token,
                Frame::Decoded(_) | Frame::Undecodable => debug!("frame without a code"),
                Frame::Closed => return Err(ScanError::NoCodeFound),
            }
        };

        // Release the camera before handing the token over.
        self.release();
        info!(%token, "code decoded");
        if tx.send(token.clone()).await.is_err() {
            warn!("decoded token dropped, nobody is consuming scans");
        }
        Ok(token)
    }

    fn release(&mut self) {
        if self.started {
            self.scanner.stop();
            self.started = false;
        }
    }
}

impl<S: CodeScanner + ?Sized> Drop for ScanSession<'_, S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Runs sessions back to back until the code stream closes or the receiver goes away.
/// Any other scan error is handed to `on_error` and the scanner is restarted after
/// `retry_delay`.
pub async fn capture_until_closed<S, F>(
    scanner: &mut S,
    tx: &mpsc::Sender<String>,
    retry_delay: Duration,
    mut on_error: F,
) where
    S: CodeScanner + ?Sized,
    F: FnMut(&ScanError),
{
    loop {
        match ScanSession::new(&mut *scanner).run(tx).await {
            Ok(_) if tx.is_closed() => return,
            Ok(_) => {}
            Err(e @ ScanError::NoCodeFound) => {
                info!("code stream closed");
                on_error(&e);
                return;
            }
            Err(e) => {
                warn!("scan session failed, restarting: {e}");
                on_error(&e);
                if tx.is_closed() {
                    return;
                }
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

/// Reads one code per line, e.g. from a keyboard-wedge reader on stdin.
/// Blank lines count as frames without a code; end of input closes the stream.
pub struct LineScanner<R> {
    lines: Lines<R>,
    running: bool,
}

impl<R: AsyncBufRead + Unpin + Send> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), running: false }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CodeScanner for LineScanner<R> {
    async fn start(&mut self) -> Result<(), ScanError> {
        self.running = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Frame, ScanError> {
        if !self.running {
            return Err(ScanError::CameraUnavailable("scanner is stopped".to_string()));
        }
        match self.lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => Ok(Frame::Undecodable),
            Ok(Some(line)) => Ok(Frame::Decoded(line.trim().to_string())),
            Ok(None) => Ok(Frame::Closed),
            Err(e) => Err(ScanError::CameraUnavailable(e.to_string())),
        }
    }

    fn stop(&mut self) {
        self.running = false;
    }
}
