use std::{collections::VecDeque, fmt, io};

use encoding_rs::{Decoder, DecoderResult};

use super::{
    error::stream_failed,
    registry::{Charset, CodecImpl},
    ConvError,
};

/// Number of decoded bytes requested from the codec per refill.
const READ_CHUNK: usize = 1024;

/// A reader wrapper that presents a byte stream as a character stream in the
/// encoding bound at construction.
///
/// This wrapper buffers raw bytes from the underlying reader and decodes them
/// incrementally. Errors are detected going forward: an input that is valid
/// for the first K characters permits exactly K successful [`read_char`]
/// calls; the next call reports [`ConvError::InvalidSequence`] (wrapped in an
/// [`std::io::Error`], carrying the byte offset of the first invalid unit),
/// and the stream latches a failed state in which every further read fails.
/// There is no resynchronization.
///
/// A `ConvReader` owns exclusive cursor and failure state and must be driven
/// by a single logical sequence of calls.
///
/// [`read_char`]: Self::read_char
///
/// # Examples
///
/// ```rust
/// use charset_conv::ConvReader;
///
/// let src: &[u8] = b"hello \xf9\xec\xe5\xed";
/// let mut reader = ConvReader::new(src, "ISO8859-8")?;
/// assert_eq!(reader.read_all()?, "hello שלום");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct ConvReader<R> {
    reader: R,
    decoder: StreamDecoder,
    /// Characters decoded ahead of the caller's cursor.
    pending: VecDeque<char>,
    /// Total bytes consumed from the underlying reader.
    consumed: usize,
    /// A decode error waiting to be delivered once `pending` drains.
    pending_error: Option<ConvError>,
    failed: bool,
    eof: bool,
}

impl<R: io::BufRead> ConvReader<R> {
    /// Creates a new converting reader bound to an encoding name or locale.
    pub fn new<'a>(reader: R, charset: impl Into<Charset<'a>>) -> Result<Self, ConvError> {
        let handle = charset.into().resolve()?;
        Ok(Self {
            reader,
            decoder: StreamDecoder::new(handle.imp()),
            pending: VecDeque::new(),
            consumed: 0,
            pending_error: None,
            failed: false,
            eof: false,
        })
    }

    /// Returns a reference to the underlying reader.
    pub fn reader_ref(&self) -> &R {
        &self.reader
    }

    /// Returns `true` once a conversion failure has occurred on this stream.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns the number of bytes consumed from the underlying reader so far.
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    /// Reads the next character, or `Ok(None)` at end of input.
    ///
    /// The first invalid unit is reported after all characters decoded before
    /// it have been read; from then on every call fails.
    pub fn read_char(&mut self) -> io::Result<Option<char>> {
        loop {
            if let Some(c) = self.pending.pop_front() {
                return Ok(Some(c));
            }
            if self.failed {
                return Err(stream_failed());
            }
            if let Some(e) = self.pending_error.take() {
                self.failed = true;
                return Err(e.wrap());
            }
            if self.eof {
                return Ok(None);
            }
            self.fill_pending()?;
        }
    }

    /// Reads all remaining characters into a string.
    pub fn read_all(&mut self) -> io::Result<String> {
        let mut out = String::new();
        while let Some(c) = self.read_char()? {
            out.push(c);
        }
        Ok(out)
    }

    /// Decodes one more chunk from the underlying reader into `pending`.
    fn fill_pending(&mut self) -> io::Result<()> {
        match &mut self.decoder {
            StreamDecoder::Latin1 => {
                let src = self.reader.fill_buf()?;
                if src.is_empty() {
                    self.eof = true;
                    return Ok(());
                }
                let n = src.len();
                self.pending.extend(src.iter().copied().map(char::from));
                self.reader.consume(n);
                self.consumed += n;
            }
            StreamDecoder::External(decoder) => {
                let src = self.reader.fill_buf()?;
                let last = src.is_empty();
                let mut out = String::with_capacity(READ_CHUNK);
                let (result, consumed) =
                    decoder.decode_to_string_without_replacement(src, &mut out, last);
                self.reader.consume(consumed);
                self.consumed += consumed;
                self.pending.extend(out.chars());
                match result {
                    DecoderResult::InputEmpty => {
                        if last {
                            self.eof = true;
                        }
                    }
                    DecoderResult::OutputFull => {}
                    DecoderResult::Malformed(seq_len, extra) => {
                        let offset = self.consumed - extra as usize - seq_len as usize;
                        self.pending_error = Some(ConvError::invalid_sequence(offset));
                    }
                }
            }
        }
        Ok(())
    }
}

impl<R: fmt::Debug> fmt::Debug for ConvReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvReader")
            .field("reader", &self.reader)
            .field("decoder", &self.decoder)
            .field("consumed", &self.consumed)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

/// Incremental decoder state for one stream.
enum StreamDecoder {
    Latin1,
    External(Decoder),
}

impl StreamDecoder {
    fn new(imp: CodecImpl) -> Self {
        match imp {
            CodecImpl::Latin1 => Self::Latin1,
            CodecImpl::Utf8 => {
                Self::External(encoding_rs::UTF_8.new_decoder_without_bom_handling())
            }
            CodecImpl::External(encoding) => {
                Self::External(encoding.new_decoder_without_bom_handling())
            }
        }
    }
}

impl fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latin1 => f.write_str("Latin1"),
            Self::External(decoder) => f
                .debug_tuple("External")
                .field(&decoder.encoding())
                .finish(),
        }
    }
}
