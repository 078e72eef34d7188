//! Newline-delimited JSON event ingestion

use crate::error::Result;
use crate::listener::EventHandle;
use settlement_core::IncomingEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

/// Decode one `IncomingEvent` per line and submit it, in order.
///
/// Blank lines are ignored and lines that do not decode are logged and
/// skipped. Returns the number of events forwarded.
pub async fn forward_json_lines<R>(reader: R, handle: &EventHandle) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LinesStream::new(reader.lines());
    let mut forwarded = 0;

    while let Some(line) = lines.next().await {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<IncomingEvent>(line) {
            Ok(event) => {
                handle.submit(event).await?;
                forwarded += 1;
            }
            Err(e) => warn!("Skipping undecodable event {:?}: {}", line, e),
        }
    }

    debug!("Forwarded {} events", forwarded);
    Ok(forwarded)
}
