//! The decode/encode engine: converts between a named byte encoding and the
//! internal Unicode representation, governed by an [`ErrorPolicy`].
//!
//! Legacy codecs are driven through `encoding_rs`'s `*_without_replacement`
//! APIs so that the policy layer here, not the codec, decides how invalid
//! input is handled: under `Stop` the first invalid unit aborts the whole
//! conversion with its offset, under `Skip` the engine loops the codec,
//! dropping the invalid unit and accumulating the maximal valid output.

use encoding_rs::{DecoderResult, EncoderResult};

use super::{
    registry::{CodecHandle, CodecImpl},
    utf::CodeUnit,
    ConvError,
};

/// The error-handling policy for conversion content errors.
///
/// Structural errors (an unknown encoding name) are fatal under both
/// policies. The default is `Skip`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The first invalid unit aborts the conversion with
    /// [`ConvError::InvalidSequence`].
    Stop,
    /// Invalid units are dropped and conversion continues, producing a
    /// partial but maximal valid output.
    #[default]
    Skip,
}

/// Decodes bytes in the handle's encoding into a string.
///
/// The `Stop` offset is the byte offset of the first invalid unit. Under
/// `Skip`, exactly the minimal invalid unit is dropped before decoding
/// resumes: one byte for the built-in UTF-8 codec, or the malformed sequence
/// identified by the codec for `encoding_rs`-backed encodings.
pub(crate) fn decode_bytes(
    handle: CodecHandle,
    bytes: &[u8],
    policy: ErrorPolicy,
) -> Result<String, ConvError> {
    match handle.imp() {
        CodecImpl::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
        CodecImpl::Utf8 => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => {
                let mut out = String::with_capacity(bytes.len());
                let mut pos = 0;
                while pos < bytes.len() {
                    let (consumed, result) = u8::decode_step(&bytes[pos..]);
                    match result {
                        Ok(c) => out.push(c),
                        Err(()) => match policy {
                            ErrorPolicy::Stop => return Err(ConvError::invalid_sequence(pos)),
                            ErrorPolicy::Skip => {}
                        },
                    }
                    pos += consumed;
                }
                Ok(out)
            }
        },
        CodecImpl::External(encoding) => {
            let mut decoder = encoding.new_decoder_without_bom_handling();
            let mut out = String::with_capacity(
                decoder
                    .max_utf8_buffer_length_without_replacement(bytes.len())
                    .unwrap(),
            );
            let mut pos = 0;
            loop {
                let (result, consumed) =
                    decoder.decode_to_string_without_replacement(&bytes[pos..], &mut out, true);
                pos += consumed;
                match result {
                    DecoderResult::InputEmpty => return Ok(out),
                    DecoderResult::OutputFull => {
                        out.reserve(
                            decoder
                                .max_utf8_buffer_length_without_replacement(bytes.len() - pos)
                                .unwrap()
                                .max(4),
                        );
                    }
                    DecoderResult::Malformed(seq_len, extra) => {
                        if policy == ErrorPolicy::Stop {
                            let offset = pos - extra as usize - seq_len as usize;
                            return Err(ConvError::invalid_sequence(offset));
                        }
                    }
                }
            }
        }
    }
}

/// Encodes a string into bytes of the handle's encoding.
///
/// The `Stop` offset is the code-point index of the first unrepresentable
/// character. Stateful encoders (ISO-2022-JP) are finalized so trailing shift
/// sequences are part of the output.
pub(crate) fn encode_str(
    handle: CodecHandle,
    s: &str,
    policy: ErrorPolicy,
) -> Result<Vec<u8>, ConvError> {
    match handle.imp() {
        CodecImpl::Utf8 => Ok(s.as_bytes().to_vec()),
        CodecImpl::Latin1 => {
            let mut out = Vec::with_capacity(s.len());
            for (i, c) in s.chars().enumerate() {
                match u8::try_from(u32::from(c)) {
                    Ok(b) => out.push(b),
                    Err(_) => match policy {
                        ErrorPolicy::Stop => return Err(ConvError::invalid_sequence(i)),
                        ErrorPolicy::Skip => {}
                    },
                }
            }
            Ok(out)
        }
        CodecImpl::External(encoding) => {
            let mut encoder = encoding.new_encoder();
            let mut out = Vec::new();
            let mut pos = 0;
            loop {
                let (result, consumed) =
                    encoder.encode_from_utf8_to_vec_without_replacement(&s[pos..], &mut out, true);
                pos += consumed;
                match result {
                    EncoderResult::InputEmpty => return Ok(out),
                    EncoderResult::OutputFull => {
                        out.reserve(
                            encoder
                                .max_buffer_length_from_utf8_without_replacement(s.len() - pos)
                                .unwrap()
                                .max(16),
                        );
                    }
                    EncoderResult::Unmappable(_) => {
                        if policy == ErrorPolicy::Stop {
                            // `consumed` includes the unmappable character
                            let index = s[..pos].chars().count() - 1;
                            return Err(ConvError::invalid_sequence(index));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_bytes, encode_str, ConvError, ErrorPolicy};
    use crate::registry::lookup;

    #[test]
    fn shift_jis_round_trip() {
        let sjis = lookup("Shift_JIS").unwrap();
        assert_eq!(
            decode_bytes(sjis, b"\x93\xfa\x96\x7b", ErrorPolicy::Stop).unwrap(),
            "日本"
        );
        assert_eq!(
            encode_str(sjis, "日本", ErrorPolicy::Stop).unwrap(),
            b"\x93\xfa\x96\x7b"
        );
    }

    #[test]
    fn iso_2022_jp_escape_sequences() {
        let jp = lookup("iso-2022-jp").unwrap();
        assert_eq!(
            decode_bytes(jp, b"\x1b$BE_5(\x1b(B", ErrorPolicy::Stop).unwrap(),
            "冬季"
        );
        // the trailing shift back to ASCII is emitted by the finalized encoder
        assert_eq!(
            encode_str(jp, "冬季", ErrorPolicy::Stop).unwrap(),
            b"\x1b$BE_5(\x1b(B"
        );
        // input ending on a dangling lead byte is malformed
        assert!(matches!(
            decode_bytes(jp, b"\x1b$BE", ErrorPolicy::Stop),
            Err(ConvError::InvalidSequence { .. })
        ));
    }

    #[test]
    fn stop_reports_byte_offset_of_first_invalid_unit() {
        let sjis = lookup("cp932").unwrap();
        match decode_bytes(sjis, b"test\xE0\xA0 \x83\xF8", ErrorPolicy::Stop) {
            Err(ConvError::InvalidSequence { offset }) => assert_eq!(offset, 7),
            ret => panic!("assertion failed: {:?}", ret),
        }

        let utf8 = lookup("UTF-8").unwrap();
        match decode_bytes(utf8, b"abc\xFF\xFF", ErrorPolicy::Stop) {
            Err(ConvError::InvalidSequence { offset }) => assert_eq!(offset, 3),
            ret => panic!("assertion failed: {:?}", ret),
        }
    }

    #[test]
    fn stop_reports_char_index_of_first_unmappable() {
        let latin1 = lookup("Latin1").unwrap();
        match encode_str(latin1, "hello שלום", ErrorPolicy::Stop) {
            Err(ConvError::InvalidSequence { offset }) => assert_eq!(offset, 6),
            ret => panic!("assertion failed: {:?}", ret),
        }

        let sjis = lookup("sjis").unwrap();
        match encode_str(sjis, "Oh🥺", ErrorPolicy::Stop) {
            Err(ConvError::InvalidSequence { offset }) => assert_eq!(offset, 2),
            ret => panic!("assertion failed: {:?}", ret),
        }
    }

    #[test]
    fn skip_drops_unrepresentable_characters() {
        let latin1 = lookup("Latin1").unwrap();
        assert_eq!(
            encode_str(latin1, "hello שלום", ErrorPolicy::Skip).unwrap(),
            b"hello "
        );
    }

    #[test]
    fn latin1_decode_never_fails() {
        let latin1 = lookup("ISO8859-1").unwrap();
        let all: Vec<u8> = (0u8..=255).collect();
        let decoded = decode_bytes(latin1, &all, ErrorPolicy::Stop).unwrap();
        assert_eq!(decoded.chars().count(), 256);
        assert_eq!(
            encode_str(latin1, &decoded, ErrorPolicy::Stop).unwrap(),
            all
        );
    }
}
