use embedded_io_async::Read;

use super::request::{UplinkError, UplinkRequest};

/// Opens one transmission handle per uplink cycle.
///
/// The returned session owns whatever the transmission needs (sockets, TLS
/// buffers, the request line) and gives it all back when dropped.
pub trait UplinkTransport {
    type Session<'t>: UplinkSession
    where
        Self: 't;

    fn open<'t>(&'t mut self, request: &UplinkRequest<'t>)
        -> Result<Self::Session<'t>, UplinkError>;
}

#[allow(async_fn_in_trait)]
pub trait UplinkSession {
    /// Sends `body` and waits for the response head. Returns the status code.
    async fn perform(&mut self, body: &[u8]) -> Result<u16, UplinkError>;

    /// Copies up to `buf.len()` bytes of the response body. Extra bytes are dropped.
    async fn read_response(&mut self, buf: &mut [u8]) -> Result<usize, UplinkError>;
}

/// Fills `buf` from a streaming body until it is full or the body ends.
///
/// Whatever follows the first `buf.len()` bytes stays unread on the wire, so a
/// body of any length costs at most one buffer.
pub async fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, R::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            read => filled += read,
        }
    }
    Ok(filled)
}
