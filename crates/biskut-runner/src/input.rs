//! Operator input forwarded to the program's pty
//!
//! When stdin is a terminal the caller's keystrokes arrive as crossterm
//! events. They are translated back into the byte sequences a terminal
//! would send, so the program's line discipline sees the same input an
//! interactive shell would give it. Piped or redirected stdin is copied
//! through byte for byte.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::IsTerminal;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Interval at which the terminal reader re-checks cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Where program input comes from.
#[derive(Debug, Clone, Default)]
pub enum InputSource {
    /// The caller's stdin: keystrokes on a terminal, raw bytes otherwise.
    #[default]
    Terminal,
    /// Fixed bytes written once at start.
    Script(Vec<u8>),
    /// No input at all.
    Closed,
}

impl InputSource {
    /// Scripted input from text.
    pub fn script(text: impl Into<String>) -> Self {
        Self::Script(text.into().into_bytes())
    }
}

/// Spawn the input pump. It ends when `cancel` fires or its source is
/// exhausted; write failures end it silently.
pub fn spawn_input_pump<W>(
    source: InputSource,
    mut writer: W,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match source {
            InputSource::Closed => {}
            InputSource::Script(bytes) => {
                if let Err(e) = writer.write_all(&bytes).await {
                    debug!("Scripted input not delivered: {}", e);
                    return;
                }
                let _ = writer.flush().await;
                cancel.cancelled().await;
            }
            InputSource::Terminal if std::io::stdin().is_terminal() => {
                forward_terminal(writer, cancel).await
            }
            InputSource::Terminal => {
                debug!("stdin is not a terminal; copying it through");
                forward_stream(tokio::io::stdin(), writer, cancel).await
            }
        }
    })
}

/// End-of-file character in canonical mode (`^D`).
const EOT: u8 = 0x04;

/// Copy `reader` into the pty until it is exhausted or `cancel` fires.
///
/// Exhaustion is passed on as `^D`, so a program reading to end-of-file
/// finishes instead of waiting for the deadline.
async fn forward_stream<R, W>(mut reader: R, mut writer: W, cancel: CancellationToken)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => return,
            n = reader.read(&mut buf) => match n {
                Ok(n) => n,
                Err(e) => {
                    debug!("Input read failed: {}", e);
                    return;
                }
            },
        };
        let chunk: &[u8] = if n == 0 { &[EOT] } else { &buf[..n] };
        if let Err(e) = writer.write_all(chunk).await {
            debug!("Input pump stopped: {}", e);
            return;
        }
        let _ = writer.flush().await;
        if n == 0 {
            break;
        }
    }
    cancel.cancelled().await;
}

async fn forward_terminal<W>(mut writer: W, cancel: CancellationToken)
where
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    let reader_cancel = cancel.clone();
    let reader = tokio::task::spawn_blocking(move || read_terminal(tx, reader_cancel));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            bytes = rx.recv() => {
                let Some(bytes) = bytes else { break };
                if let Err(e) = writer.write_all(&bytes).await {
                    debug!("Input pump stopped: {}", e);
                    break;
                }
                let _ = writer.flush().await;
            }
        }
    }

    // The reader observes the token within one poll interval.
    cancel.cancel();
    drop(rx);
    let _ = reader.await;
}

fn read_terminal(tx: mpsc::Sender<Vec<u8>>, cancel: CancellationToken) {
    while !cancel.is_cancelled() && !tx.is_closed() {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                debug!("Terminal poll failed: {}", e);
                break;
            }
        }
        let ev = match event::read() {
            Ok(ev) => ev,
            Err(e) => {
                debug!("Terminal read failed: {}", e);
                break;
            }
        };
        if let Some(bytes) = encode_event(&ev) {
            if tx.blocking_send(bytes).is_err() {
                break;
            }
        }
    }
}

/// Bytes a terminal sends for `ev`, if any.
pub fn encode_event(ev: &Event) -> Option<Vec<u8>> {
    match ev {
        Event::Key(key) => encode_key(key),
        Event::Paste(text) => Some(text.as_bytes().to_vec()),
        _ => None,
    }
}

/// Bytes a terminal sends for a key press.
pub fn encode_key(key: &KeyEvent) -> Option<Vec<u8>> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let mut bytes = match key.code {
        KeyCode::Char(c) if ctrl => vec![control_byte(c)?],
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::F(n) => function_key(n)?,
        _ => return None,
    };

    if alt {
        bytes.insert(0, 0x1b);
    }
    Some(bytes)
}

fn control_byte(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a' + 1),
        'A'..='Z' => Some(c as u8 - b'A' + 1),
        '@' | ' ' => Some(0x00),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' => Some(0x1f),
        _ => None,
    }
}

fn function_key(n: u8) -> Option<Vec<u8>> {
    let seq: &[u8] = match n {
        1 => b"\x1bOP",
        2 => b"\x1bOQ",
        3 => b"\x1bOR",
        4 => b"\x1bOS",
        5 => b"\x1b[15~",
        6 => b"\x1b[17~",
        7 => b"\x1b[18~",
        8 => b"\x1b[19~",
        9 => b"\x1b[20~",
        10 => b"\x1b[21~",
        11 => b"\x1b[23~",
        12 => b"\x1b[24~",
        _ => return None,
    };
    Some(seq.to_vec())
}
