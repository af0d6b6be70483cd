//! Message handlers: the `/start` greeting plus the document and photo
//! conversion flows.
//!
//! Each incoming attachment is downloaded to a per-request temporary
//! file, converted to `.xlsx`, delivered back as a reply document and
//! cleaned up, whatever the outcome.

use crate::bot::transfer;
use crate::config::{Settings, MAX_FILE_SIZE};
use crate::conversion::{convert_file, unique_temp_path, SourceFormat};
use crate::utils::sanitize_file_name;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{FileId, ReplyParameters};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Commands understood by the bot.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Поддерживаемые команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
}

const UNSUPPORTED_FORMAT_REPLY: &str =
    "Формат файла не поддерживается.\n Поддерживаемые форматы .jpg, .docx, .xls, .bmp";

const CONVERSION_FAILED_REPLY: &str =
    "К сожалению при конвертации файла произошла ошибка, попытайся снова!";

const DELIVERY_CAPTION: &str = "Вот твой файл";

/// Greets the user and lists the accepted source formats.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    let user_name = msg.from.as_ref().map_or("", |user| user.first_name.as_str());
    let welcome = format!(
        "Привет {user_name}! Чтобы начать работу, отправь файл из разрешенных \
         форматов: .jpg, .docx, .xls или .bmp и я переведу для тебя файл в \
         excel формат"
    );
    bot.send_message(msg.chat.id, welcome).await?;
    Ok(())
}

/// Converts an uploaded document to `.xlsx` and replies with the result.
///
/// Unsupported and extensionless names are rejected before anything is
/// downloaded or written to disk.
pub async fn handle_document(bot: Bot, msg: Message, settings: Arc<Settings>) -> Result<()> {
    let Some(document) = msg.document() else {
        return Ok(());
    };
    let file_name = document.file_name.clone().unwrap_or_default();
    let extension = declared_extension(&file_name);

    info!(file_name = %file_name, extension = ?extension, "Received document");

    let Some(extension) = extension.filter(|e| SourceFormat::from_extension(e).is_some()) else {
        return reply_text(&bot, &msg, UNSUPPORTED_FORMAT_REPLY).await;
    };

    if document.file.size > MAX_FILE_SIZE {
        warn!(size = document.file.size, "Document exceeds the download limit");
        return reply_text(&bot, &msg, CONVERSION_FAILED_REPLY).await;
    }

    let delivered_name = delivered_file_name(&file_name);
    convert_and_deliver(
        &bot,
        &msg,
        document.file.id.clone(),
        &extension,
        &delivered_name,
        &settings,
    )
    .await
}

/// Converts an uploaded photo to `.xlsx` and replies with the result.
///
/// Telegram strips photo names, so the largest rendition is taken as a
/// `.jpg` and delivered as `photo.xlsx`.
pub async fn handle_photo(bot: Bot, msg: Message, settings: Arc<Settings>) -> Result<()> {
    let Some(photo) = msg
        .photo()
        .and_then(|sizes| sizes.iter().max_by_key(|p| p.width * p.height))
    else {
        return Ok(());
    };

    info!(width = photo.width, height = photo.height, "Received photo");

    convert_and_deliver(
        &bot,
        &msg,
        photo.file.id.clone(),
        SourceFormat::Jpg.extension(),
        "photo.xlsx",
        &settings,
    )
    .await
}

/// Runs one full request: download, convert, deliver, clean up.
///
/// A conversion or delivery failure turns into the failure reply; the
/// temporary files are removed in every case.
async fn convert_and_deliver(
    bot: &Bot,
    msg: &Message,
    file_id: FileId,
    extension: &str,
    delivered_name: &str,
    settings: &Settings,
) -> Result<()> {
    let job = ConversionJob::new(extension, delivered_name);

    let reply_result = match run_job(bot, &job, file_id, extension, settings).await {
        Ok(()) => {
            match transfer::send_converted_document(
                bot,
                msg.chat.id,
                msg.id,
                &job.final_path,
                DELIVERY_CAPTION,
            )
            .await
            {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!("Failed to deliver the converted file: {e:#}");
                    reply_text(bot, msg, CONVERSION_FAILED_REPLY).await
                }
            }
        }
        Err(e) => {
            error!("Conversion error: {e:#}");
            reply_text(bot, msg, CONVERSION_FAILED_REPLY).await
        }
    };

    job.cleanup().await;
    reply_result
}

/// Downloads the attachment, converts it off the async runtime and
/// moves the workbook under its delivered name.
async fn run_job(
    bot: &Bot,
    job: &ConversionJob,
    file_id: FileId,
    extension: &str,
    settings: &Settings,
) -> Result<()> {
    transfer::download_to(bot, file_id, &job.input_path).await?;

    // Reserve the output name before the converter runs.
    tokio::fs::File::create(&job.output_path).await?;

    let input = job.input_path.clone();
    let output = job.output_path.clone();
    let ext = extension.to_string();
    let language = settings.ocr_language.clone();
    tokio::task::spawn_blocking(move || convert_file(&input, &output, &ext, &language))
        .await
        .map_err(|e| anyhow!("conversion task failed: {e}"))??;

    tokio::fs::create_dir_all(&job.delivery_dir).await?;
    tokio::fs::rename(&job.output_path, &job.final_path).await?;
    Ok(())
}

async fn reply_text(bot: &Bot, msg: &Message, text: &str) -> Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Lower-cased extension of a declared file name, without the dot.
fn declared_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Builds the delivered name: original stem, `.xlsx` extension, unsafe
/// characters replaced.
fn delivered_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    sanitize_file_name(&format!("{stem}.xlsx"))
}

/// Filesystem footprint of one conversion request.
///
/// The handler owns every path for the duration of the request and
/// removes them all afterwards; the delivered file lives in its own
/// directory so concurrent requests never fight over a name.
struct ConversionJob {
    input_path: PathBuf,
    output_path: PathBuf,
    delivery_dir: PathBuf,
    final_path: PathBuf,
}

impl ConversionJob {
    fn new(extension: &str, delivered_name: &str) -> Self {
        let delivery_dir =
            std::env::temp_dir().join(format!("xlsxify-delivery-{}", Uuid::new_v4().as_simple()));
        Self {
            input_path: unique_temp_path(&format!(".{extension}")),
            output_path: unique_temp_path(".xlsx"),
            final_path: delivery_dir.join(delivered_name),
            delivery_dir,
        }
    }

    /// Removes everything the job may have created. Failures are logged
    /// and swallowed so a reply already sent is never degraded.
    async fn cleanup(&self) {
        for path in [&self.input_path, &self.output_path] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    error!(path = %path.display(), "Failed to remove a temporary file: {e}");
                }
            }
        }
        match tokio::fs::remove_dir_all(&self.delivery_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                error!(path = %self.delivery_dir.display(), "Failed to remove the delivery directory: {e}");
            }
        }
    }
}
