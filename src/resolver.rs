//! Typed-payload resolver.
//!
//! Once a fountain decode completes, the recovered envelope is mapped to
//! a final user-facing payload by dispatching on its declared type tag,
//! delegating to the injected record parsers. An unrecognized tag is not
//! an error: the instance stays completed and the raw bytes are retained
//! so the caller can still surface them.

use tracing::{debug, warn};

use crate::codec::{PsbtRecord, RecordParsers};
use crate::envelope::{Envelope, TypeTag};
use crate::error::Result;
use crate::types::Reassembled;

/// Resolve a completed envelope into its final payload.
pub fn resolve(envelope: &Envelope, parsers: &dyn RecordParsers) -> Result<Reassembled> {
    match &envelope.type_tag {
        TypeTag::CryptoAccount => {
            let descriptor = parsers.account_descriptor(&envelope.data)?;
            debug!("resolved crypto-account to descriptor");
            Ok(Reassembled::Text(descriptor))
        }
        TypeTag::CryptoPsbt => match parsers.psbt(&envelope.data)? {
            PsbtRecord::Text(text) => Ok(Reassembled::Text(text)),
            PsbtRecord::Raw(raw) => {
                // Raw transaction bytes need the binary format parser too.
                let text = parsers.psbt_from_raw(&raw)?;
                Ok(Reassembled::Text(text))
            }
        },
        TypeTag::CryptoOutput => {
            let descriptor = parsers.output_descriptor(&envelope.data)?;
            Ok(Reassembled::Text(descriptor))
        }
        TypeTag::Bytes => match String::from_utf8(envelope.data.clone()) {
            Ok(text) => Ok(Reassembled::Text(text)),
            Err(err) => Ok(Reassembled::Binary(err.into_bytes())),
        },
        TypeTag::Unknown(tag) => {
            warn!(%tag, "envelope type not implemented, retaining raw bytes");
            Ok(Reassembled::Unresolved { type_tag: tag.clone(), raw: envelope.data.clone() })
        }
    }
}
