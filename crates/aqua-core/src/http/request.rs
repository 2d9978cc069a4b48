use embedded_io_async::Read;

use super::PublishError;

/// Longest request line that is kept for logging.
pub const MAX_REQUEST_LINE: usize = 128;

/// Stop scanning for the end of the request line after this many bytes.
const MAX_REQUEST_SCAN: usize = 1024;

/// Read the request line and throw it away.
///
/// Reads until the first CR or LF, end of stream, or [`MAX_REQUEST_SCAN`]
/// bytes. The returned prefix of the line is only good for logging; the
/// request never influences the response.
pub async fn read_request_line<R: Read>(
    reader: &mut R,
) -> Result<heapless::Vec<u8, MAX_REQUEST_LINE>, PublishError> {
    let mut line = heapless::Vec::new();
    let mut chunk = [0u8; 64];
    let mut scanned = 0;

    while scanned < MAX_REQUEST_SCAN {
        let n = reader.read(&mut chunk).await.map_err(PublishError::from_io)?;
        if n == 0 {
            break;
        }
        scanned += n;

        for &byte in &chunk[..n] {
            if byte == b'\r' || byte == b'\n' {
                return Ok(line);
            }
            // Overlong lines are truncated, not rejected
            let _ = line.push(byte);
        }
    }

    Ok(line)
}
