//! TSIG for zone transfers (RFC 8945)
//!
//! Signing and MAC checks are done by hickory's `TSigner`. This module maps
//! configuration onto it and chains the MACs across the envelopes of one
//! transfer, so every envelope must carry a valid signature.

use std::fmt;

use base64::Engine;
use hickory_proto::op::Message;
use hickory_proto::rr::Name;
use hickory_proto::rr::dnssec::rdata::tsig::TsigAlgorithm;
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::serialize::binary::BinEncodable;

use crate::error::DnsError;

/// Allowed clock skew in seconds
pub const DEFAULT_FUDGE: u16 = 300;

/// Map a user-supplied algorithm name to a TSIG algorithm
///
/// Recognizes the five HMAC-SHA names, case-insensitively and with or without
/// a trailing dot. Anything else falls back to `hmac-sha256`.
#[must_use]
pub fn normalize_algorithm(name: &str) -> TsigAlgorithm {
    match name.trim().trim_end_matches('.').to_ascii_lowercase().as_str() {
        "hmac-sha1" => TsigAlgorithm::HmacSha1,
        "hmac-sha224" => TsigAlgorithm::HmacSha224,
        "hmac-sha384" => TsigAlgorithm::HmacSha384,
        "hmac-sha512" => TsigAlgorithm::HmacSha512,
        _ => TsigAlgorithm::HmacSha256,
    }
}

/// Algorithms the signer can both sign and verify with
fn is_verifiable(algorithm: &TsigAlgorithm) -> bool {
    matches!(
        algorithm,
        TsigAlgorithm::HmacSha256 | TsigAlgorithm::HmacSha384 | TsigAlgorithm::HmacSha512
    )
}

fn tsig_error(e: impl fmt::Display) -> DnsError {
    DnsError::Tsig(e.to_string())
}

/// Shared TSIG key used to sign transfer requests and check their answers
#[derive(Clone)]
pub struct TsigKey {
    signer: TSigner,
}

impl fmt::Debug for TsigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsigKey")
            .field("name", self.signer.signer_name())
            .field("algorithm", self.signer.algorithm())
            .finish_non_exhaustive()
    }
}

impl TsigKey {
    /// Create a key
    ///
    /// # Arguments
    /// * `key_name` - TSIG key name
    /// * `algorithm` - user-supplied algorithm name, normalized
    /// * `secret` - base64-encoded shared secret
    ///
    /// # Errors
    /// Returns `DnsError::Tsig` if the key name is not a valid domain name,
    /// the secret is not valid base64, or the algorithm is `hmac-sha1` or
    /// `hmac-sha224`, whose answers cannot be verified.
    pub fn new(key_name: &str, algorithm: &str, secret: &str) -> Result<Self, DnsError> {
        let secret = base64::engine::general_purpose::STANDARD
            .decode(secret.trim())
            .map_err(|e| DnsError::Tsig(format!("invalid secret: {e}")))?;
        let name = Name::from_ascii(key_name)
            .map_err(|e| DnsError::Tsig(format!("invalid key name {key_name:?}: {e}")))?;

        let algorithm = normalize_algorithm(algorithm);
        if !is_verifiable(&algorithm) {
            return Err(DnsError::Tsig(format!("unsupported algorithm: {algorithm:?}")));
        }

        let signer = TSigner::new(secret, algorithm, name, DEFAULT_FUDGE).map_err(tsig_error)?;

        Ok(Self { signer })
    }

    /// Algorithm used for signing
    #[must_use]
    pub fn algorithm(&self) -> &TsigAlgorithm {
        self.signer.algorithm()
    }

    /// Sign `request` and encode it
    ///
    /// Returns the wire form of the signed request together with the
    /// sequence that checks the answers to it. `time_signed` is seconds since
    /// the Unix epoch.
    ///
    /// # Errors
    /// Returns `DnsError::Tsig` if signing fails.
    pub fn sign(
        &self,
        request: &mut Message,
        time_signed: u32,
    ) -> Result<(Vec<u8>, TsigSequence), DnsError> {
        request.finalize(&self.signer, time_signed).map_err(tsig_error)?;
        let wire = request.to_vec()?;

        // The first answer is chained on the request MAC.
        let (request_mac, _, _) = self
            .signer
            .verify_message_byte(None, &wire, true)
            .map_err(tsig_error)?;

        let sequence = TsigSequence {
            signer: self.signer.clone(),
            previous_mac: request_mac,
            first: true,
        };

        Ok((wire, sequence))
    }
}

/// MAC chain of one signed exchange
pub struct TsigSequence {
    signer: TSigner,
    /// MAC of the request or of the last verified envelope
    previous_mac: Vec<u8>,
    /// No envelope verified yet
    first: bool,
}

impl fmt::Debug for TsigSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsigSequence")
            .field("first", &self.first)
            .finish_non_exhaustive()
    }
}

impl TsigSequence {
    /// Verify the TSIG record of the next answer envelope
    ///
    /// # Errors
    /// Returns `DnsError::Tsig` if the envelope is unsigned, signed with
    /// another key, or its MAC does not chain on the previous one.
    pub fn verify(&mut self, envelope: &[u8]) -> Result<(), DnsError> {
        let (mac, _, _) = self
            .signer
            .verify_message_byte(Some(self.previous_mac.as_slice()), envelope, self.first)
            .map_err(tsig_error)?;

        self.previous_mac = mac;
        self.first = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hickory_proto::op::{MessageType, OpCode, Query};
    use hickory_proto::rr::RecordType;

    use super::*;

    // "c2VjcmV0Cg==" is "secret\n"
    const SECRET: &str = "c2VjcmV0Cg==";

    fn axfr_request() -> Message {
        let mut msg = Message::new();
        msg.set_id(0xBEEF)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .add_query(Query::query(
                Name::from_ascii("example.com.").unwrap(),
                RecordType::AXFR,
            ));
        msg
    }

    #[test]
    fn test_normalize_algorithm() {
        assert_eq!(normalize_algorithm("hmac-sha1"), TsigAlgorithm::HmacSha1);
        assert_eq!(normalize_algorithm("HMAC-SHA512."), TsigAlgorithm::HmacSha512);
        assert_eq!(normalize_algorithm("hmac-sha224"), TsigAlgorithm::HmacSha224);
        assert_eq!(normalize_algorithm(" hmac-sha384 "), TsigAlgorithm::HmacSha384);
        assert_eq!(normalize_algorithm("hmac-md5"), TsigAlgorithm::HmacSha256);
        assert_eq!(normalize_algorithm(""), TsigAlgorithm::HmacSha256);
    }

    #[test]
    fn test_unverifiable_algorithms_rejected() {
        assert!(matches!(TsigKey::new("axfr.", "hmac-sha1", SECRET), Err(DnsError::Tsig(_))));
        assert!(matches!(TsigKey::new("axfr.", "hmac-sha224", SECRET), Err(DnsError::Tsig(_))));
        assert!(TsigKey::new("axfr.", "bogus", SECRET).is_ok());
    }

    #[test]
    fn test_invalid_secret() {
        let result = TsigKey::new("axfr.", "hmac-sha256", "not base64!");

        assert!(matches!(result, Err(DnsError::Tsig(_))));
    }

    #[test]
    fn test_sign_appends_tsig_record() {
        let key = TsigKey::new("axfr.", "hmac-sha256", SECRET).unwrap();
        let unsigned = axfr_request().to_vec().unwrap();

        let (signed, _) = key.sign(&mut axfr_request(), 1_700_000_000).unwrap();

        // ARCOUNT bumped, question untouched
        assert_eq!(signed[10..12], [0u8, 1]);
        assert_eq!(signed[..10], unsigned[..10]);
        assert_eq!(signed[12..unsigned.len()], unsigned[12..]);

        let algorithm = b"\x0bhmac-sha256\x00";
        assert!(signed.windows(algorithm.len()).any(|w| w == algorithm));
    }

    #[test]
    fn test_unsigned_answer_rejected() {
        let key = TsigKey::new("axfr.", "hmac-sha256", SECRET).unwrap();
        let (_, mut sequence) = key.sign(&mut axfr_request(), 1_700_000_000).unwrap();

        let mut answer = axfr_request();
        answer.set_message_type(MessageType::Response);

        assert!(matches!(
            sequence.verify(&answer.to_vec().unwrap()),
            Err(DnsError::Tsig(_))
        ));
    }

    #[test]
    fn test_unchained_answer_rejected() {
        let key = TsigKey::new("axfr.", "hmac-sha256", SECRET).unwrap();
        let (_, mut sequence) = key.sign(&mut axfr_request(), 1_700_000_000).unwrap();

        // Signed with the right key but not over the request MAC
        let mut answer = axfr_request();
        answer.set_message_type(MessageType::Response);
        let (forged, _) = key.sign(&mut answer, 1_700_000_000).unwrap();

        assert!(matches!(sequence.verify(&forged), Err(DnsError::Tsig(_))));
    }
}
