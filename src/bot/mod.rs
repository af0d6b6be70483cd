/// Command, document and photo message handlers
pub mod handlers;
/// Attachment download and converted-file delivery
pub mod transfer;
