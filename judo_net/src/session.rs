//! Per-connection framing and the read/dispatch loop. Grounded on
//! `squire_sdk`'s per-session actor shape: reads and writes for one
//! connection are serialized through this task (the "network strand"),
//! while mutations to the gathering's tournament are serialized through
//! the gathering's own task (the "tournament strand"). Handoff between
//! the two is by channel send, mirroring the two-level strand discipline
//! rather than sharing a lock across connections.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::messages::{JoinRequest, Message, MessageBody};

/// Frames larger than this are rejected rather than buffered, bounding
/// memory a misbehaving peer can force a session to allocate.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Reads the handshake frame a freshly-accepted connection must send
/// first. Any other message kind arriving here is a protocol violation.
pub async fn read_join(stream: &mut TcpStream) -> Result<JoinRequest, ProtocolError> {
    let (mut read_half, _write_half) = stream.split();
    match read_frame(&mut read_half).await? {
        Some(Message { body: MessageBody::Join(join), .. }) => Ok(join),
        Some(_) => Err(ProtocolError::Decode("expected JOIN as first message".to_string())),
        None => Err(ProtocolError::SessionClosed),
    }
}

/// Drives one connection: reads frames off the socket and forwards them
/// to `inbound`, while draining `outbound` and writing frames back. Ends
/// when the socket closes or a `Quit` is read.
pub async fn run_session(
    mut stream: TcpStream,
    inbound: mpsc::UnboundedSender<Message>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    let (mut read_half, mut write_half) = stream.split();
    loop {
        tokio::select! {
            incoming = read_frame(&mut read_half) => {
                match incoming {
                    Ok(Some(message)) => {
                        let is_quit = matches!(message.body, crate::messages::MessageBody::Quit);
                        if inbound.send(message).is_err() {
                            break;
                        }
                        if is_quit {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!(%err, "session read failed");
                        break;
                    }
                }
            }
            outgoing = outbound.recv() => {
                match outgoing {
                    Some(message) => {
                        if let Err(err) = write_frame(&mut write_half, &message).await {
                            warn!(%err, "session write failed");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
    debug!("session ended");
}

async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Option<Message>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    if reader.read_exact(&mut len_buf).await.is_err() {
        return Ok(None);
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut type_buf = [0u8; 2];
    reader.read_exact(&mut type_buf).await?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(Message::decode(&payload)?))
}

async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, message: &Message) -> Result<(), ProtocolError> {
    let framed = message.encode()?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}
