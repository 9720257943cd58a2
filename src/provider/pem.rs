//! # PEM Blocks
//!
//! Minimal PEM reader for the structural key checks of the providers.
//! Key material is never parsed beyond its outer DER shape.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Tag of a DER SEQUENCE, the outer shape of every supported key encoding
pub(super) const DER_SEQUENCE: u8 = 0x30;

/// First PEM block of a document
#[derive(Debug)]
pub(super) struct PemBlock<'a> {
    pub label: &'a str,
    /// Base64 body with whitespace removed
    pub body: String,
    pub has_headers: bool,
    /// Everything after the END line
    pub rest: &'a str,
}

impl<'a> PemBlock<'a> {
    pub fn parse(input: &'a str) -> Option<Self> {
        let (begin, after_begin) = input.split_once('\n')?;
        let label = begin
            .trim_end_matches('\r')
            .strip_prefix("-----BEGIN ")?
            .strip_suffix("-----")?;

        let end_line = format!("-----END {label}-----");
        let end_at = after_begin.find(&end_line)?;
        let inner = &after_begin[..end_at];
        let rest = &after_begin[end_at + end_line.len()..];

        let has_headers = inner.lines().any(|line| line.contains(':'));
        let body: String = inner.chars().filter(|c| !c.is_whitespace()).collect();

        Some(Self {
            label,
            body,
            has_headers,
            rest,
        })
    }

    /// Whether nothing but whitespace follows the END line
    pub fn is_only_block(&self) -> bool {
        self.rest.trim().is_empty()
    }

    /// Decoded body
    pub fn der(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.body)
    }
}
