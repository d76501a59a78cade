//! Attachment preparation.
//!
//! Turns a raw attachment into either an inline payload for vision-capable
//! providers or extracted plain text that any provider can read. Every decode
//! or parse failure surfaces as a [`ModalityError`]; nothing panics past this
//! module.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use tracing::{info, warn};

use crate::error::{ModalityError, ModalityResult};
use crate::providers::InlinePayload;

const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

static DOCX_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>").expect("valid docx text pattern")
});

/// A user-supplied file, alive only for one orchestration call.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Plain text extracted from a document attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentText {
    pub filename: String,
    pub text: String,
}

/// What an attachment contributes to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedContent {
    /// Binary image/video content; requires a vision-capable provider.
    Inline(InlinePayload),
    /// Extracted document text.
    Text(DocumentText),
}

/// All usable content from one call's attachments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedAttachments {
    pub media: Vec<InlinePayload>,
    pub documents: Vec<DocumentText>,
    /// Attachments that contributed nothing.
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Decode a base64 attachment. A `data:<type>;base64,` prefix is tolerated.
    pub fn from_base64(
        filename: impl Into<String>,
        media_type: impl Into<String>,
        data: &str,
    ) -> ModalityResult<Self> {
        let filename = filename.into();
        let payload = match data.find(";base64,") {
            Some(idx) if data.starts_with("data:") => &data[idx + ";base64,".len()..],
            _ => data,
        };
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| ModalityError::Decode {
                filename: filename.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            filename,
            media_type: media_type.into(),
            bytes,
        })
    }

    fn normalized_media_type(&self) -> String {
        self.media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }

    fn is_visual(&self) -> bool {
        let media_type = self.normalized_media_type();
        media_type.starts_with("image/") || media_type.starts_with("video/")
    }

    fn document_kind(&self) -> Option<DocumentKind> {
        let media_type = self.normalized_media_type();
        let filename = self.filename.to_lowercase();

        if media_type == "application/pdf" || filename.ends_with(".pdf") {
            Some(DocumentKind::Pdf)
        } else if media_type == DOCX_MEDIA_TYPE || filename.ends_with(".docx") {
            Some(DocumentKind::Docx)
        } else if media_type == "text/plain" || filename.ends_with(".txt") {
            Some(DocumentKind::PlainText)
        } else {
            None
        }
    }
}

/// Prepare one attachment for submission.
pub fn prepare(attachment: Attachment) -> ModalityResult<PreparedContent> {
    if attachment.is_visual() {
        return Ok(PreparedContent::Inline(InlinePayload {
            media_type: attachment.normalized_media_type(),
            filename: attachment.filename,
            bytes: attachment.bytes,
        }));
    }

    let kind = attachment
        .document_kind()
        .ok_or_else(|| ModalityError::UnsupportedType {
            filename: attachment.filename.clone(),
            media_type: attachment.media_type.clone(),
        })?;

    let text = match kind {
        DocumentKind::PlainText => extract_plain_text(&attachment)?,
        DocumentKind::Pdf => extract_pdf_text(&attachment)?,
        DocumentKind::Docx => extract_docx_text(&attachment)?,
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ModalityError::Extraction {
            filename: attachment.filename,
            message: "document contains no text".to_string(),
        });
    }

    Ok(PreparedContent::Text(DocumentText {
        filename: attachment.filename,
        text,
    }))
}

/// Prepare every attachment, logging and dropping the ones that yield nothing.
pub fn prepare_all(attachments: Vec<Attachment>) -> PreparedAttachments {
    let mut prepared = PreparedAttachments::default();

    for attachment in attachments {
        let filename = attachment.filename.clone();
        match prepare(attachment) {
            Ok(PreparedContent::Inline(payload)) => {
                info!(
                    filename = %filename,
                    media_type = %payload.media_type,
                    bytes = payload.bytes.len(),
                    "Attached inline media"
                );
                prepared.media.push(payload);
            }
            Ok(PreparedContent::Text(document)) => {
                info!(
                    filename = %filename,
                    chars = document.text.len(),
                    "Extracted document text"
                );
                prepared.documents.push(document);
            }
            Err(e) => {
                warn!(filename = %filename, error = %e, "Attachment contributed no content");
                prepared.dropped += 1;
            }
        }
    }

    prepared
}

/// Render extracted documents as an evidence block appended to the user message.
pub fn render_documents(documents: &[DocumentText]) -> Option<String> {
    if documents.is_empty() {
        return None;
    }

    let mut block = String::from("Document Evidence:\n");
    for doc in documents {
        block.push_str(&format!(
            "\n--- Document: {} ---\n{}\n",
            doc.filename, doc.text
        ));
    }
    Some(block)
}

fn extract_plain_text(attachment: &Attachment) -> ModalityResult<String> {
    String::from_utf8(attachment.bytes.clone()).map_err(|e| ModalityError::Extraction {
        filename: attachment.filename.clone(),
        message: e.to_string(),
    })
}

fn extract_pdf_text(attachment: &Attachment) -> ModalityResult<String> {
    let bytes = attachment.bytes.as_slice();
    // pdf-extract panics on some malformed inputs
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ModalityError::Extraction {
            filename: attachment.filename.clone(),
            message: e.to_string(),
        }),
        Err(_) => Err(ModalityError::Extraction {
            filename: attachment.filename.clone(),
            message: "PDF parser aborted on malformed input".to_string(),
        }),
    }
}

fn extract_docx_text(attachment: &Attachment) -> ModalityResult<String> {
    let extraction_error = |message: String| ModalityError::Extraction {
        filename: attachment.filename.clone(),
        message,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(attachment.bytes.as_slice()))
        .map_err(|e| extraction_error(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| extraction_error(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| extraction_error(e.to_string()))?;

    Ok(docx_xml_to_text(&xml))
}

/// Paragraph-per-line text of a WordprocessingML body.
fn docx_xml_to_text(xml: &str) -> String {
    xml.split("</w:p>")
        .map(|paragraph| {
            DOCX_TEXT_RE
                .captures_iter(paragraph)
                .map(|cap| match cap.get(1) {
                    Some(text) => unescape_xml(text.as_str()),
                    None => "\t".to_string(),
                })
                .collect::<String>()
        })
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
