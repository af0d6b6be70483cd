//! Telegram file transfer: attachment acquisition and result delivery.

use crate::utils::retry_telegram_operation;
use anyhow::Result;
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, MessageId, ReplyParameters};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Download a Telegram file into `dest`, creating (or truncating) the
/// destination file. Transient transport failures are retried with
/// backoff.
///
/// # Errors
///
/// Returns an error when the transport stays unreachable or the
/// destination cannot be written.
pub async fn download_to(bot: &Bot, file_id: FileId, dest: &Path) -> Result<()> {
    retry_telegram_operation(|| async {
        let file = bot.get_file(file_id.clone()).await?;
        let mut out = tokio::fs::File::create(dest).await?;
        bot.download_file(&file.path, &mut out).await?;
        out.flush().await?;
        Ok(())
    })
    .await?;

    info!(path = %dest.display(), "Attachment downloaded");
    Ok(())
}

/// Send the file at `path` back as a reply document with a caption.
/// The delivered file name is the path's base name.
///
/// # Errors
///
/// Returns an error if Telegram rejects or fails the upload.
pub async fn send_converted_document(
    bot: &Bot,
    chat_id: ChatId,
    reply_to: MessageId,
    path: &Path,
    caption: &str,
) -> Result<()> {
    bot.send_document(chat_id, InputFile::file(path.to_path_buf()))
        .caption(caption.to_string())
        .reply_parameters(ReplyParameters::new(reply_to))
        .await?;
    Ok(())
}
