//! Mock codec collaborators for tests.
//!
//! The mock fountain codec is not a real erasure code: its recovery
//! threshold is simply "all distinct parts", which is a legal instance
//! of the contract and enough to exercise the engines.

use std::collections::BTreeMap;

use std::sync::Arc;

use crate::codec::{
    Codecs, ContainerCodec, ContainerFragment, FountainCodec, FountainDecoder, FountainEncoder,
    PsbtRecord, RecordParsers,
};
use crate::envelope::Envelope;
use crate::error::{QrError, Result};

/// Codecs bundle backed entirely by mocks.
pub(crate) fn mock_codecs() -> Codecs {
    Codecs::new(
        Arc::new(MockFountainCodec::default()),
        Arc::new(MockContainerCodec),
        Arc::new(MockParsers),
    )
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn hex_decode(text: &str) -> Result<Vec<u8>> {
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

fn base36_pair(n: usize) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    assert!(n < 36 * 36, "mock container limited to {} fragments", 36 * 36);
    String::from_utf8(vec![DIGITS[n / 36], DIGITS[n % 36]]).expect("ascii digits")
}

/// Mock fountain codec: parts are `ur:mock/<i>-<n>/<hex>` and recovery
/// requires all `n` distinct parts.
#[derive(Debug, Default)]
pub(crate) struct MockFountainCodec;

impl FountainCodec for MockFountainCodec {
    fn encoder(&self, envelope: Envelope, max_part_size: usize) -> Result<Box<dyn FountainEncoder>> {
        let hex = hex_encode(&envelope.to_cbor()?);
        let chunk = max_part_size.max(4);
        let chunks: Vec<&str> = hex
            .as_bytes()
            .chunks(chunk)
            .map(|c| std::str::from_utf8(c).expect("hex is ascii"))
            .collect();
        let total = chunks.len();
        let parts = chunks
            .iter()
            .enumerate()
            .map(|(i, data)| format!("ur:mock/{}-{}/{}", i + 1, total, data))
            .collect();
        Ok(Box::new(MockEncoder { parts, emitted: 0 }))
    }

    fn decoder(&self) -> Box<dyn FountainDecoder> {
        Box::new(MockDecoder::default())
    }
}

struct MockEncoder {
    parts: Vec<String>,
    emitted: usize,
}

impl FountainEncoder for MockEncoder {
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
struct MockDecoder {
    parts: BTreeMap<usize, String>,
    total: Option<usize>,
    failure: Option<String>,
}

impl FountainDecoder for MockDecoder {
    fn receive_part(&mut self, part: &str) -> Result<()> {
        let lowered = part.to_lowercase();
        let rest = lowered
            .strip_prefix("ur:mock/")
            .ok_or_else(|| QrError::parse("mock ur part", "missing ur:mock prefix"))?;
        let (position, hex) = rest
            .split_once('/')
            .ok_or_else(|| QrError::parse("mock ur part", "missing payload separator"))?;
        let (index, total) = position
            .split_once('-')
            .ok_or_else(|| QrError::parse("mock ur part", "missing index separator"))?;
        let index: usize =
            index.parse().map_err(|_| QrError::parse("mock ur part", "bad index"))?;
        let total: usize =
            total.parse().map_err(|_| QrError::parse("mock ur part", "bad total"))?;

        self.total.get_or_insert(total);
        match self.parts.get(&index) {
            Some(existing) if existing != hex => {
                self.failure = Some(format!("inconsistent content for part {index}"));
            }
            _ => {
                self.parts.insert(index, hex.to_string());
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
            return Err(QrError::decode_failure("mock decode not complete"));
        }
        let hex: String = self.parts.values().cloned().collect();
        Envelope::from_cbor(&hex_decode(&hex)?)
    }

    fn result_error(&self) -> String {
        self.failure.clone().unwrap_or_default()
    }
}

/// Mock container codec: hex payload chunks behind real BBQr headers
/// (`H` encoding, `U` file type), assembly by concatenation.
#[derive(Debug)]
pub(crate) struct MockContainerCodec;

impl ContainerCodec for MockContainerCodec {
    fn encode(
        &self,
        payload: &[u8],
        max_size: usize,
    ) -> Result<Box<dyn Iterator<Item = ContainerFragment> + Send>> {
        let hex = hex_encode(payload);
        let chunk = max_size.max(1);
        let chunks: Vec<String> = hex
            .as_bytes()
            .chunks(chunk)
            .map(|c| String::from_utf8(c.to_vec()).expect("hex is ascii"))
            .collect();
        let total = chunks.len().max(1);
        if total >= 36 * 36 {
            return Err(QrError::codec("container encode", "payload too large for mock".into()));
        }
        let fragments: Vec<ContainerFragment> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, data)| ContainerFragment {
                text: format!("B$HU{}{}{}", base36_pair(total), base36_pair(index), data),
                index,
                total,
            })
            .collect();
        Ok(Box::new(fragments.into_iter()))
    }

    fn decode(&self, parts: &[String], encoding: char, file_type: char) -> Result<Vec<u8>> {
        if encoding != 'H' || file_type != 'U' {
            return Err(QrError::codec(
                "container decode",
                format!("mock cannot decode {encoding}/{file_type}").into(),
            ));
        }
        let hex: String = parts.concat();
        hex_decode(&hex)
    }
}

/// Mock record parsers with trivially checkable canonical forms.
#[derive(Debug)]
pub(crate) struct MockParsers;

impl RecordParsers for MockParsers {
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
        Ok(format!("psbt:{}", hex_encode(raw)))
    }

    fn psbt_to_bytes(&self, text: &str) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}
