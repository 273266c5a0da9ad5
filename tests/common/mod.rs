//! Shared mock collaborators for the integration tests.
//!
//! The fountain mock's recovery threshold is "every distinct part",
//! which is a legal (if unlucky) instance of the fountain contract.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Once};

use qrweave::codec::{
    Codecs, ContainerCodec, ContainerFragment, FountainCodec, FountainDecoder, FountainEncoder,
    PsbtRecord, RecordParsers,
};
use qrweave::{Envelope, QrError, Result};

/// Install the test subscriber once per binary; `RUST_LOG` controls the
/// filter.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn codecs() -> Codecs {
    Codecs::new(Arc::new(Fountain), Arc::new(Container), Arc::new(Parsers))
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(text: &str) -> Result<Vec<u8>> {
    if text.len() % 2 != 0 {
        return Err(QrError::parse("hex", "odd length"));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .map_err(|e| QrError::parse("hex", e.to_string()))
        })
        .collect()
}

fn b36(n: usize) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    String::from_utf8(vec![DIGITS[(n / 36) % 36], DIGITS[n % 36]]).unwrap()
}

pub struct Fountain;

impl FountainCodec for Fountain {
    fn encoder(&self, envelope: Envelope, max_part_size: usize) -> Result<Box<dyn FountainEncoder>> {
        let payload = hex(&envelope.to_cbor()?);
        let chunk = max_part_size.max(4);
        let chunks: Vec<String> = payload
            .as_bytes()
            .chunks(chunk)
            .map(|c| String::from_utf8(c.to_vec()).unwrap())
            .collect();
        let total = chunks.len();
        let parts = chunks
            .into_iter()
            .enumerate()
            .map(|(i, data)| format!("ur:test/{}-{}/{}", i + 1, total, data))
            .collect();
        Ok(Box::new(Encoder { parts, emitted: 0 }))
    }

    fn decoder(&self) -> Box<dyn FountainDecoder> {
        Box::new(Decoder::default())
    }
}

struct Encoder {
    parts: Vec<String>,
    emitted: usize,
}

impl FountainEncoder for Encoder {
    fn sequence_length(&self) -> usize {
        self.parts.len()
    }

    fn sequence_number(&self) -> usize {
        self.emitted
    }

    fn next_part(&mut self) -> String {
        let part = self.parts[self.emitted % self.parts.len()].clone();
        self.emitted += 1;
        part
    }
}

#[derive(Default)]
struct Decoder {
    parts: BTreeMap<usize, String>,
    total: Option<usize>,
    failure: Option<String>,
}

impl FountainDecoder for Decoder {
    fn receive_part(&mut self, part: &str) -> Result<()> {
        let lowered = part.to_lowercase();
        let rest = lowered
            .strip_prefix("ur:test/")
            .ok_or_else(|| QrError::parse("ur part", "bad prefix"))?;
        let (position, data) =
            rest.split_once('/').ok_or_else(|| QrError::parse("ur part", "bad layout"))?;
        let (index, total) =
            position.split_once('-').ok_or_else(|| QrError::parse("ur part", "bad position"))?;
        let index: usize = index.parse().map_err(|_| QrError::parse("ur part", "bad index"))?;
        let total: usize = total.parse().map_err(|_| QrError::parse("ur part", "bad total"))?;

        self.total.get_or_insert(total);
        match self.parts.get(&index) {
            Some(existing) if existing != data => {
                self.failure = Some(format!("inconsistent content for part {index}"));
            }
            _ => {
                self.parts.insert(index, data.to_string());
            }
        }
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.failure.is_some() || self.total.is_some_and(|t| self.parts.len() == t)
    }

    fn is_success(&self) -> bool {
        self.failure.is_none() && self.is_complete()
    }

    fn expected_part_count(&self) -> Option<usize> {
        self.total
    }

    fn received_part_count(&self) -> usize {
        self.parts.len()
    }

    fn result_envelope(&self) -> Result<Envelope> {
        if !self.is_success() {
            return Err(QrError::decode_failure("not complete"));
        }
        let payload: String = self.parts.values().cloned().collect();
        Envelope::from_cbor(&unhex(&payload)?)
    }

    fn result_error(&self) -> String {
        self.failure.clone().unwrap_or_default()
    }
}

pub struct Container;

impl ContainerCodec for Container {
    fn encode(
        &self,
        payload: &[u8],
        max_size: usize,
    ) -> Result<Box<dyn Iterator<Item = ContainerFragment> + Send>> {
        let data = hex(payload);
        let chunk = max_size.max(1);
        let chunks: Vec<String> = data
            .as_bytes()
            .chunks(chunk)
            .map(|c| String::from_utf8(c.to_vec()).unwrap())
            .collect();
        let total = chunks.len().max(1);
        let fragments: Vec<ContainerFragment> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, body)| ContainerFragment {
                text: format!("B$HU{}{}{}", b36(total), b36(index), body),
                index,
                total,
            })
            .collect();
        Ok(Box::new(fragments.into_iter()))
    }

    fn decode(&self, parts: &[String], encoding: char, file_type: char) -> Result<Vec<u8>> {
        if encoding != 'H' || file_type != 'U' {
            return Err(QrError::codec("container decode", "unsupported tags".into()));
        }
        unhex(&parts.concat())
    }
}

pub struct Parsers;

impl RecordParsers for Parsers {
    fn account_descriptor(&self, record: &[u8]) -> Result<String> {
        Ok(format!("desc({})", String::from_utf8_lossy(record)))
    }

    fn output_descriptor(&self, record: &[u8]) -> Result<String> {
        Ok(format!("desc({})", String::from_utf8_lossy(record)))
    }

    fn psbt(&self, record: &[u8]) -> Result<PsbtRecord> {
        Ok(PsbtRecord::Raw(record.to_vec()))
    }

    fn psbt_from_raw(&self, raw: &[u8]) -> Result<String> {
        Ok(format!("psbt:{}", hex(raw)))
    }

    fn psbt_to_bytes(&self, text: &str) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}
