//! Length-prefixed frame codec: 4-byte big-endian length, then payload.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame; anything larger is a protocol violation.
const MAX_FRAME_LEN: usize = 1024 * 1024;

pub async fn write_frame<S>(stream: &mut S, data: &[u8]) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    // Length prefix (4 bytes)
    let len = data.len() as u32;
    stream.write_all(&len.to_be_bytes()).await?;

    // Payload
    stream.write_all(data).await?;
    stream.flush().await?;

    Ok(())
}

pub async fn read_frame<S>(stream: &mut S) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    // Read length prefix
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit", len),
        ));
    }

    // Read payload
    let mut data = vec![0u8; len];
    stream.read_exact(&mut data).await?;

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_round_trip() {
        let (mut writer, mut reader) = tokio::io::duplex(256);

        write_frame(&mut writer, b"hello frame").await.unwrap();
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame, b"hello frame");
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let (mut writer, mut reader) = tokio::io::duplex(256);

        let len = (MAX_FRAME_LEN as u32 + 1).to_be_bytes();
        tokio::io::AsyncWriteExt::write_all(&mut writer, &len)
            .await
            .unwrap();

        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
