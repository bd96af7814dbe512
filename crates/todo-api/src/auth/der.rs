//! Minimal DER walk that locates the RSA SubjectPublicKeyInfo in an X.509
//! certificate.
//!
//! This is not a general ASN.1 parser. It skips the outer
//! certificate header, bounds the scan to the to-be-signed certificate, and
//! looks for the first SEQUENCE whose first element is an AlgorithmIdentifier
//! naming `rsaEncryption` (1.2.840.113549.1.1.1).
//!
//! Every read goes through [`Cursor`], a copyable `(buffer, offset)` value.
//! Reading functions return the value together with the advanced cursor and
//! yield `None` instead of reading out of bounds, so untrusted input can
//! never cause a panic.

use base64::{engine::general_purpose::STANDARD, Engine};
use common::jwt::TokenError;
use std::fmt;
use std::ops::Range;

/// DER encoding of the `rsaEncryption` object identifier.
pub const RSA_ENCRYPTION_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

/// PEM banner that opens a certificate.
pub const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";

/// PEM banner that closes a certificate.
pub const PEM_CERTIFICATE_END: &str = "-----END CERTIFICATE-----";

const TAG_SEQUENCE: u8 = 0x30;
const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
const TAG_BIT_STRING: u8 = 0x03;

/// Long-form lengths with more length bytes than this are treated as garbage.
const MAX_LENGTH_BYTES: usize = 4;

/// The scan stops this many bytes before the end of the TBS certificate.
const SCAN_TAIL_MARGIN: usize = 10;

const INVALID_CERTIFICATE_FORMAT: &str = "invalid certificate format";
const SPKI_NOT_FOUND: &str = "SubjectPublicKeyInfo not found";

/// A decoded DER length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Length {
    /// Content length in bytes.
    pub value: usize,

    /// Number of bytes the length field itself occupies.
    pub encoded_len: usize,
}

/// Read position within a DER buffer.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current offset into the buffer.
    pub fn offset(self) -> usize {
        self.offset
    }

    /// Same buffer, different offset.
    pub fn at(self, offset: usize) -> Self {
        Self {
            buf: self.buf,
            offset,
        }
    }

    /// The byte at the current offset, if any.
    pub fn peek(self) -> Option<u8> {
        self.buf.get(self.offset).copied()
    }

    /// Move forward `n` bytes without reading them.
    pub fn advance(self, n: usize) -> Option<Self> {
        self.offset.checked_add(n).map(|offset| self.at(offset))
    }

    /// Read one byte.
    pub fn read_byte(self) -> Option<(u8, Self)> {
        let byte = self.peek()?;
        Some((byte, self.advance(1)?))
    }

    /// Read one byte and require it to equal `expected`.
    pub fn expect_byte(self, expected: u8) -> Option<Self> {
        match self.read_byte()? {
            (byte, next) if byte == expected => Some(next),
            _ => None,
        }
    }

    /// Read `n` bytes as a slice.
    pub fn take(self, n: usize) -> Option<(&'a [u8], Self)> {
        let end = self.offset.checked_add(n)?;
        let bytes = self.buf.get(self.offset..end)?;
        Some((bytes, self.at(end)))
    }

    /// Read a DER length field.
    ///
    /// Short form: the high bit is clear and the byte is the length.
    /// Long form: the low seven bits count the big-endian length bytes that
    /// follow.
    pub fn read_length(self) -> Option<(Length, Self)> {
        let (first, mut cursor) = self.read_byte()?;

        if first & 0x80 == 0 {
            let length = Length {
                value: usize::from(first),
                encoded_len: 1,
            };
            return Some((length, cursor));
        }

        let count = usize::from(first & 0x7f);
        if count > MAX_LENGTH_BYTES {
            return None;
        }

        let mut value = 0usize;
        for _ in 0..count {
            let (byte, next) = cursor.read_byte()?;
            value = (value << 8) | usize::from(byte);
            cursor = next;
        }

        let length = Length {
            value,
            encoded_len: 1 + count,
        };
        Some((length, cursor))
    }
}

/// DER-encoded SubjectPublicKeyInfo taken from a certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct SubjectPublicKeyInfo(Vec<u8>);

impl SubjectPublicKeyInfo {
    /// The full SPKI encoding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The PKCS#1 `RSAPublicKey` carried in the SPKI's BIT STRING.
    ///
    /// Returns `None` if the SPKI does not have the expected
    /// `SEQUENCE { AlgorithmIdentifier, BIT STRING }` shape.
    pub fn rsa_public_key(&self) -> Option<&[u8]> {
        let cursor = Cursor::new(&self.0).expect_byte(TAG_SEQUENCE)?;
        let (_, cursor) = cursor.read_length()?;

        let cursor = cursor.expect_byte(TAG_SEQUENCE)?;
        let (algorithm, cursor) = cursor.read_length()?;
        let cursor = cursor.advance(algorithm.value)?;

        let cursor = cursor.expect_byte(TAG_BIT_STRING)?;
        let (bits, cursor) = cursor.read_length()?;
        // No unused bits in a key bit string
        let cursor = cursor.expect_byte(0x00)?;
        let (key, _) = cursor.take(bits.value.checked_sub(1)?)?;

        Some(key)
    }
}

impl fmt::Debug for SubjectPublicKeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubjectPublicKeyInfo")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Extract the RSA SubjectPublicKeyInfo from a PEM certificate.
///
/// # Errors
///
/// Returns `TokenError::KeyExtractionError` if the PEM body is not base64,
/// the outer structure is not two nested SEQUENCEs, or no RSA SPKI is found
/// inside the to-be-signed certificate.
pub fn extract_spki(pem: &str) -> Result<SubjectPublicKeyInfo, TokenError> {
    let der = decode_pem_certificate(pem)?;
    let (cursor, end) = tbs_contents(&der)?;

    let range =
        scan_for_rsa_spki(cursor, end).ok_or(TokenError::KeyExtractionError(SPKI_NOT_FOUND))?;
    let spki = der
        .get(range)
        .ok_or(TokenError::KeyExtractionError(SPKI_NOT_FOUND))?;

    Ok(SubjectPublicKeyInfo(spki.to_vec()))
}

/// Strip the PEM banners and whitespace, then base64-decode the body.
fn decode_pem_certificate(pem: &str) -> Result<Vec<u8>, TokenError> {
    let body: String = pem
        .replacen(PEM_CERTIFICATE_BEGIN, "", 1)
        .replacen(PEM_CERTIFICATE_END, "", 1)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    STANDARD
        .decode(body)
        .map_err(|_| TokenError::KeyExtractionError(INVALID_CERTIFICATE_FORMAT))
}

/// Skip the certificate and TBS headers.
///
/// Returns a cursor at the first byte of the TBS contents and the scan
/// boundary, clamped to the buffer.
fn tbs_contents(der: &[u8]) -> Result<(Cursor<'_>, usize), TokenError> {
    let invalid = TokenError::KeyExtractionError(INVALID_CERTIFICATE_FORMAT);

    let cursor = Cursor::new(der)
        .expect_byte(TAG_SEQUENCE)
        .ok_or_else(|| invalid.clone())?;
    let (_, cursor) = cursor.read_length().ok_or_else(|| invalid.clone())?;

    let cursor = cursor
        .expect_byte(TAG_SEQUENCE)
        .ok_or_else(|| invalid.clone())?;
    let (tbs, cursor) = cursor.read_length().ok_or(invalid)?;

    let end = cursor.offset().saturating_add(tbs.value).min(der.len());

    Ok((cursor, end))
}

/// Scan `[cursor, end - SCAN_TAIL_MARGIN)` byte by byte for the RSA SPKI.
fn scan_for_rsa_spki(mut cursor: Cursor<'_>, end: usize) -> Option<Range<usize>> {
    while cursor.offset().saturating_add(SCAN_TAIL_MARGIN) < end {
        if cursor.peek() == Some(TAG_SEQUENCE) {
            if let Some(range) = match_rsa_spki(cursor) {
                return Some(range);
            }
        }
        cursor = cursor.advance(1)?;
    }

    None
}

/// Try to read an RSA SPKI record starting at `record`.
///
/// Shape: `30 len 30 len 06 09 <rsaEncryption> ...`. Any mismatch or
/// truncation is a non-match so the caller resumes at the next byte.
fn match_rsa_spki(record: Cursor<'_>) -> Option<Range<usize>> {
    let start = record.offset();

    let cursor = record.expect_byte(TAG_SEQUENCE)?;
    let (spki, cursor) = cursor.read_length()?;

    let cursor = cursor.expect_byte(TAG_SEQUENCE)?;
    let (_, cursor) = cursor.read_length()?;

    let cursor = cursor.expect_byte(TAG_OBJECT_IDENTIFIER)?;
    let cursor = cursor.expect_byte(0x09)?;
    let (oid, _) = cursor.take(RSA_ENCRYPTION_OID.len())?;
    if oid != RSA_ENCRYPTION_OID {
        return None;
    }

    let len = 1usize
        .checked_add(spki.encoded_len)?
        .checked_add(spki.value)?;
    let end = start.checked_add(len)?;

    // The whole record must be present
    record.take(len)?;

    Some(start..end)
}
