//! Text and metadata extraction from PDF documents.
//!
//! Callers hand over either a URL or base64 content. The configured
//! [`DocumentExtractor`] turns it into plain text plus page count and
//! title.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, redirect};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::{Host, Url};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No PDF URL or content provided")]
    MissingInput,

    #[error("PDF is too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid base64 content: {0}")]
    InvalidContent(#[from] base64::DecodeError),

    #[error("could not fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("refusing to fetch {0}: host resolves to a non-public address")]
    ForbiddenHost(String),

    #[error("{0}")]
    Pdf(String),
}

impl ExtractError {
    /// Errors caused by the request itself rather than by the document.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput
                | Self::TooLarge { .. }
                | Self::InvalidContent(_)
                | Self::ForbiddenHost(_)
        )
    }
}

/// Body of an extraction request. At least one field must be non-blank;
/// `pdf_url` wins when both are given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub pdf_url: Option<String>,
    /// Base64-encoded PDF bytes.
    #[serde(default)]
    pub pdf_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Url(String),
    /// Still base64-encoded.
    Inline(String),
}

impl ExtractRequest {
    pub fn source(&self, max_bytes: usize) -> Result<DocumentSource, ExtractError> {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(url) = non_blank(&self.pdf_url) {
            return Ok(DocumentSource::Url(url));
        }

        let content = non_blank(&self.pdf_content).ok_or(ExtractError::MissingInput)?;
        let encoded_len = content.bytes().filter(|b| !b.is_ascii_whitespace()).count();
        let decoded_size = encoded_len / 4 * 3;
        if decoded_size > max_bytes {
            return Err(ExtractError::TooLarge {
                size: decoded_size,
                limit: max_bytes,
            });
        }
        Ok(DocumentSource::Inline(content))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub pages: u32,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, source: DocumentSource) -> Result<ExtractedDocument, ExtractError>;
}

/// Fixed result for offline use and tests. The source is not read.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDocumentExtractor;

#[async_trait]
impl DocumentExtractor for StaticDocumentExtractor {
    async fn extract(&self, _source: DocumentSource) -> Result<ExtractedDocument, ExtractError> {
        Ok(ExtractedDocument {
            text: "Sample extracted text from PDF".to_string(),
            metadata: DocumentMetadata {
                pages: 1,
                title: Some("Sample Document".to_string()),
            },
        })
    }
}

pub struct PdfDocumentExtractor {
    client: Client,
    max_bytes: usize,
    allow_private_hosts: bool,
}

impl PdfDocumentExtractor {
    /// Unless `allow_private_hosts` is set, URLs (and redirects) that lead
    /// to loopback, private or link-local addresses are refused.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        max_bytes: usize,
        fetch_timeout: Duration,
        allow_private_hosts: bool,
    ) -> anyhow::Result<Self> {
        let redirects = if allow_private_hosts {
            redirect::Policy::limited(10)
        } else {
            redirect::Policy::custom(|attempt| {
                if attempt.previous().len() >= 10 {
                    attempt.error("too many redirects")
                } else if is_private_literal(attempt.url()) {
                    attempt.error("redirect to a private address")
                } else {
                    attempt.follow()
                }
            })
        };

        let client = Client::builder()
            .timeout(fetch_timeout)
            .redirect(redirects)
            .user_agent(concat!("casedesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            max_bytes,
            allow_private_hosts,
        })
    }

    /// Resolves the host and rejects it when any address is not public.
    async fn check_host(&self, url: &Url) -> Result<(), ExtractError> {
        if self.allow_private_hosts {
            return Ok(());
        }

        let forbidden = || ExtractError::ForbiddenHost(url.to_string());
        let host = url.host_str().ok_or_else(forbidden)?;
        let port = url.port_or_known_default().unwrap_or(80);

        let addrs = tokio::net::lookup_host(format!("{host}:{port}"))
            .await
            .map_err(|e| ExtractError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        for addr in addrs {
            if !is_public_ip(addr.ip()) {
                return Err(forbidden());
            }
        }
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        let fetch_error = |message: String| ExtractError::Fetch {
            url: url.to_string(),
            message,
        };

        let parsed = Url::parse(url).map_err(|e| fetch_error(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(fetch_error(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        self.check_host(&parsed).await?;

        debug!(url = %parsed, "Fetching PDF");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| fetch_error(e.to_string()))?;

        if let Some(length) = response.content_length()
            && length > self.max_bytes as u64
        {
            return Err(ExtractError::TooLarge {
                size: usize::try_from(length).unwrap_or(usize::MAX),
                limit: self.max_bytes,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        self.check_size(bytes.len())?;
        Ok(bytes.to_vec())
    }

    const fn check_size(&self, size: usize) -> Result<(), ExtractError> {
        if size > self.max_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentExtractor for PdfDocumentExtractor {
    async fn extract(&self, source: DocumentSource) -> Result<ExtractedDocument, ExtractError> {
        let bytes = match source {
            DocumentSource::Url(url) => self.fetch(&url).await?,
            DocumentSource::Inline(content) => {
                let bytes = decode_base64(&content)?;
                self.check_size(bytes.len())?;
                bytes
            }
        };

        // Parsing is CPU-bound and the parser may panic on malformed input.
        tokio::task::spawn_blocking(move || parse_pdf(&bytes))
            .await
            .map_err(|e| ExtractError::Pdf(format!("parser aborted: {e}")))?
    }
}

/// Accepts MIME-style base64 with line breaks.
fn decode_base64(content: &str) -> Result<Vec<u8>, ExtractError> {
    let compact: Vec<u8> = content
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

/// Redirect targets are checked without DNS, so only literal addresses
/// and `localhost` are caught here.
fn is_private_literal(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => !is_public_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => !is_public_ip(IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        None => true,
    }
}

fn parse_pdf(bytes: &[u8]) -> Result<ExtractedDocument, ExtractError> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages = u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX);
    let title = document_title(&document);

    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(ExtractedDocument {
        text: text.trim().to_string(),
        metadata: DocumentMetadata { pages, title },
    })
}

/// Reads `/Title` from the trailer's info dictionary, if any.
fn document_title(document: &lopdf::Document) -> Option<String> {
    let info = document.trailer.get(b"Info").ok()?;
    let (_, info) = document.dereference(info).ok()?;
    let raw = info.as_dict().ok()?.get(b"Title").ok()?.as_str().ok()?;
    let title = decode_pdf_string(raw);
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// PDF text strings are UTF-16BE with a byte-order mark, or a single-byte
/// encoding otherwise.
fn decode_pdf_string(raw: &[u8]) -> String {
    match raw {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => raw.iter().map(|&b| char::from(b)).collect(),
    }
}
