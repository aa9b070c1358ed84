//! Notification output: one line per notification on stdout.

use std::io;

use pulsectrl_core::Notification;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Write one notification line and flush, so consumers see it immediately.
pub async fn write_notification<W>(out: &mut W, notification: &Notification) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(format!("{notification}\n").as_bytes()).await?;
    out.flush().await
}
