use std::{fmt, io, str};

use encoding_rs::{Encoder, EncoderResult};

use super::{
    error::stream_failed,
    registry::{Charset, CodecImpl},
    util::MiniBuffer,
    ConvError,
};

/// A writer wrapper that encodes a character stream into the byte encoding
/// bound at construction.
///
/// Each character is encoded and written through to the underlying writer
/// immediately. A character that cannot be represented in the encoding fails
/// the write that carries it with [`ConvError::InvalidSequence`] (wrapped in
/// an [`std::io::Error`], carrying the code-point index of the failing
/// character); bytes already written for prior characters remain in the
/// output, and the stream latches a failed state in which every further
/// operation fails.
///
/// The [`std::io::Write`] implementation accepts UTF-8 input, so `write!` and
/// friends work directly; a character fragment split across `write` calls is
/// carried over in a small internal buffer. For stateful encodings
/// (ISO-2022-JP), call [`finish`] at the end of output to emit the trailing
/// shift sequence.
///
/// A `ConvWriter` owns exclusive failure state and must be driven by a single
/// logical sequence of calls.
///
/// [`finish`]: Self::finish
///
/// # Examples
///
/// ```rust
/// use std::io::Write as _;
///
/// use charset_conv::ConvWriter;
///
/// let mut writer = ConvWriter::new(Vec::new(), "Shift_JIS")?;
/// write!(writer, "日本")?;
/// let (bytes, result) = writer.finish();
/// result?;
/// assert_eq!(bytes, b"\x93\xfa\x96\x7b");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct ConvWriter<W: io::Write> {
    inner: W,
    encoder: StreamEncoder,
    /// Carries an incomplete UTF-8 character fragment between write calls.
    partial: MiniBuffer,
    /// Code points successfully encoded so far; the failure offset.
    chars_written: usize,
    failed: bool,
}

impl<W: io::Write> ConvWriter<W> {
    /// Creates a new converting writer bound to an encoding name or locale.
    pub fn new<'a>(writer: W, charset: impl Into<Charset<'a>>) -> Result<Self, ConvError> {
        let handle = charset.into().resolve()?;
        Ok(Self {
            inner: writer,
            encoder: StreamEncoder::new(handle.imp()),
            partial: MiniBuffer::default(),
            chars_written: 0,
            failed: false,
        })
    }

    /// Returns a reference to the underlying writer.
    pub fn writer_ref(&self) -> &W {
        &self.inner
    }

    /// Returns `true` once a conversion failure has occurred on this stream.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns the number of characters successfully encoded so far.
    pub fn chars_written(&self) -> usize {
        self.chars_written
    }

    /// Encodes one character and writes its bytes to the underlying writer.
    pub fn write_char(&mut self, c: char) -> io::Result<()> {
        if self.failed {
            return Err(stream_failed());
        }
        match &mut self.encoder {
            StreamEncoder::Latin1 => match u8::try_from(u32::from(c)) {
                Ok(b) => self.inner.write_all(&[b])?,
                Err(_) => {
                    self.failed = true;
                    return Err(ConvError::invalid_sequence(self.chars_written).wrap());
                }
            },
            StreamEncoder::External(encoder) => {
                let mut utf8 = [0u8; 4];
                let src = c.encode_utf8(&mut utf8);
                let mut out = Vec::with_capacity(
                    encoder
                        .max_buffer_length_from_utf8_without_replacement(src.len())
                        .unwrap(),
                );
                let (result, _) =
                    encoder.encode_from_utf8_to_vec_without_replacement(src, &mut out, false);
                match result {
                    EncoderResult::InputEmpty => self.inner.write_all(&out)?,
                    EncoderResult::Unmappable(_) => {
                        self.failed = true;
                        return Err(ConvError::invalid_sequence(self.chars_written).wrap());
                    }
                    EncoderResult::OutputFull => {
                        debug_assert!(false, "unreachable");
                        return Err(io::Error::new(
                            io::ErrorKind::Other,
                            "failed to encode character unexpectedly",
                        ));
                    }
                }
            }
        }
        self.chars_written += 1;
        Ok(())
    }

    /// Encodes a string slice character by character.
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        for c in s.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    /// Finalizes the encoder, writing any trailing shift sequence, and
    /// returns the underlying writer together with the finalization result.
    ///
    /// A non-empty character fragment left over from a partial write is
    /// reported as [`ConvError::InvalidSequence`].
    pub fn finish(mut self) -> (W, io::Result<()>) {
        let result = if self.failed {
            Err(stream_failed())
        } else if !self.partial.is_empty() {
            Err(ConvError::invalid_sequence(self.chars_written).wrap())
        } else {
            match &mut self.encoder {
                StreamEncoder::Latin1 => Ok(()),
                StreamEncoder::External(encoder) => {
                    let mut out = Vec::with_capacity(
                        encoder
                            .max_buffer_length_from_utf8_without_replacement(0)
                            .unwrap(),
                    );
                    let (result, _) =
                        encoder.encode_from_utf8_to_vec_without_replacement("", &mut out, true);
                    match result {
                        EncoderResult::InputEmpty => self.inner.write_all(&out),
                        _ => {
                            debug_assert!(false, "unreachable");
                            Err(io::Error::new(
                                io::ErrorKind::Other,
                                "failed to finish encoder unexpectedly",
                            ))
                        }
                    }
                }
            }
        };
        (self.inner, result)
    }
}

impl<W: io::Write> io::Write for ConvWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed {
            return Err(stream_failed());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.partial.is_empty() {
            // complete the pending fragment one byte at a time
            let mut taken = 0;
            while taken < buf.len() {
                taken += self.partial.fill_from_slice(&buf[taken..taken + 1]);
                match str::from_utf8(self.partial.as_ref()) {
                    Ok(s) => {
                        if let Some(c) = s.chars().next() {
                            self.write_char(c)?;
                        }
                        self.partial.clear();
                        return Ok(taken);
                    }
                    Err(e) if e.error_len().is_some() || self.partial.len() >= 4 => {
                        self.failed = true;
                        return Err(ConvError::invalid_sequence(self.chars_written).wrap());
                    }
                    Err(_) => {} // still incomplete
                }
            }
            return Ok(taken);
        }
        match str::from_utf8(buf) {
            Ok(s) => {
                self.write_str(s)?;
                Ok(buf.len())
            }
            Err(e) => {
                let valid = e.valid_up_to();
                // SAFETY: `valid_up_to` delimits a valid UTF-8 prefix
                let s = unsafe { str::from_utf8_unchecked(&buf[..valid]) };
                self.write_str(s)?;
                match e.error_len() {
                    // an incomplete trailing fragment is carried over to the
                    // next call (or reported by `finish`)
                    None => Ok(valid + self.partial.fill_from_slice(&buf[valid..])),
                    Some(_) if valid > 0 => Ok(valid),
                    Some(_) => {
                        self.failed = true;
                        Err(ConvError::invalid_sequence(self.chars_written).wrap())
                    }
                }
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.failed {
            return Err(stream_failed());
        }
        self.inner.flush()
    }
}

impl<W: io::Write + fmt::Debug> fmt::Debug for ConvWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvWriter")
            .field("inner", &self.inner)
            .field("chars_written", &self.chars_written)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

/// Incremental encoder state for one stream.
enum StreamEncoder {
    Latin1,
    External(Encoder),
}

impl StreamEncoder {
    fn new(imp: CodecImpl) -> Self {
        match imp {
            CodecImpl::Latin1 => Self::Latin1,
            CodecImpl::Utf8 => Self::External(encoding_rs::UTF_8.new_encoder()),
            CodecImpl::External(encoding) => Self::External(encoding.new_encoder()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{ConvError, ConvWriter};

    /// The write side must permit exactly K successful character writes when
    /// the K+1st character is unrepresentable, and prior bytes must remain in
    /// the output.
    #[test]
    fn fails_at_first_unrepresentable_character() {
        let mut writer = ConvWriter::new(Vec::new(), "Latin1").unwrap();
        let chars: Vec<char> = "grüßen שלום".chars().collect();
        for &c in &chars[..7] {
            writer.write_char(c).unwrap();
        }
        assert!(!writer.is_failed());

        let e = writer.write_char(chars[7]).unwrap_err();
        assert_eq!(
            ConvError::wrapped_in(&e).and_then(ConvError::offset),
            Some(7)
        );
        assert!(writer.is_failed());
        assert!(writer.write_char('a').is_err());
        assert!(writer.flush().is_err());

        // no rollback of previously written bytes
        assert_eq!(writer.writer_ref(), b"gr\xfc\xdf\x65\x6e " as &[u8]);
    }

    /// UTF-8 character fragments split across write calls are reassembled.
    #[test]
    fn reassembles_split_character_fragments() {
        let mut writer = ConvWriter::new(Vec::new(), "Latin1").unwrap();
        let src = "über".as_bytes();
        let mut pos = 0;
        while pos < src.len() {
            pos += writer.write(&src[pos..pos + 1]).unwrap();
        }
        let (bytes, result) = writer.finish();
        result.unwrap();
        assert_eq!(bytes, b"\xfcber");
    }

    #[test]
    fn invalid_utf8_input_fails_and_latches() {
        let mut writer = ConvWriter::new(Vec::new(), "Latin1").unwrap();
        assert_eq!(writer.write(b"AB").unwrap(), 2);
        let e = writer.write(&[0xFF, b'C']).unwrap_err();
        assert!(ConvError::wrapped_in(&e).is_some());
        assert!(writer.write(b"C").is_err());
    }

    /// A valid prefix followed by an incomplete fragment is consumed whole;
    /// the fragment completes on the next call.
    #[test]
    fn fragment_after_valid_prefix_is_carried_over() {
        let mut writer = ConvWriter::new(Vec::new(), "Latin1").unwrap();
        assert_eq!(writer.write(b"gr\xc3").unwrap(), 3);
        assert_eq!(writer.write(b"\xbc\xc3\x9fen").unwrap(), 1);
        assert_eq!(writer.write(b"\xc3\x9fen").unwrap(), 4);
        let (bytes, result) = writer.finish();
        result.unwrap();
        assert_eq!(bytes, b"gr\xfc\xdfen");
    }

    #[test]
    fn trailing_fragment_is_reported_by_finish() {
        let mut writer = ConvWriter::new(Vec::new(), "Latin1").unwrap();
        assert_eq!(writer.write(&[b'A', 0xC3]).unwrap(), 2);
        let (bytes, result) = writer.finish();
        assert!(ConvError::wrapped_in(&result.unwrap_err()).is_some());
        assert_eq!(bytes, b"A");
    }

    #[test]
    fn iso_2022_jp_trailing_escape_on_finish() {
        let mut writer = ConvWriter::new(Vec::new(), "iso-2022-jp").unwrap();
        writer.write_str("冬季").unwrap();
        assert_eq!(writer.writer_ref(), b"\x1b$BE_5(" as &[u8]);
        let (bytes, result) = writer.finish();
        result.unwrap();
        assert_eq!(bytes, b"\x1b$BE_5(\x1b(B");
    }
}
