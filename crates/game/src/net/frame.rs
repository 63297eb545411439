use std::io::{self, Read, Write};

use super::protocol::{MAX_FRAME_SIZE, Message, ProtocolError};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("connection closed")]
    Closed,
    #[error("frame of {0} bytes exceeds the limit")]
    TooLarge(usize),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl FrameError {
    /// Whether the stream is still usable after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

fn read_exact_or_closed<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), FrameError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => FrameError::Closed,
        _ => FrameError::Io(e),
    })
}

/// Writes a 4-byte big-endian length followed by the payload.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut header = [0u8; 4];
    read_exact_or_closed(reader, &mut header)?;
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge(len));
    }
    let mut payload = vec![0u8; len];
    read_exact_or_closed(reader, &mut payload)?;
    Ok(payload)
}

pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<(), FrameError> {
    write_frame(writer, &message.encode()?)
}

/// Reads one frame and decodes it. A frame holding bad JSON is fully
/// consumed, so the stream stays aligned for the next read.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Message, FrameError> {
    let payload = read_frame(reader)?;
    Ok(Message::decode(&payload)?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::net::protocol::{Heartbeat, MessageType};

    fn heartbeat() -> Message {
        Message::new(
            MessageType::Heartbeat,
            &Heartbeat {
                player_id: "p1".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn length_prefix_is_big_endian() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").unwrap();
        assert_eq!(&buf[..4], &[0, 0, 0, 5]);
        assert_eq!(read_frame(&mut Cursor::new(buf)).unwrap(), b"hello");
    }

    #[test]
    fn bad_json_skips_one_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"{broken").unwrap();
        write_message(&mut buf, &heartbeat()).unwrap();

        let mut cursor = Cursor::new(buf);
        let err = read_message(&mut cursor).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(read_message(&mut cursor).unwrap().kind, MessageType::Heartbeat);
        assert!(matches!(read_message(&mut cursor), Err(FrameError::Closed)));
    }

    #[test]
    fn short_read_is_closed() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"truncated payload").unwrap();
        buf.truncate(8);
        assert!(matches!(
            read_frame(&mut Cursor::new(buf)),
            Err(FrameError::Closed)
        ));
    }

    #[test]
    fn oversized_length_rejected() {
        let buf = u32::MAX.to_be_bytes().to_vec();
        assert!(matches!(
            read_frame(&mut Cursor::new(buf)),
            Err(FrameError::TooLarge(_))
        ));
    }
}
