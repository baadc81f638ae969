// Streaming Scanner
//
// Reads fixed-size chunks from any `Read`, decodes them as UTF-8 and walks
// the text one character at a time, driving a `Materializer`.
//
// Key design:
// - Column and row delimiters are found by `Watcher`s fed with absolute
//   byte offsets, so a delimiter split across two reads still resolves
// - Only the unfinished tail of the current column is carried between
//   reads (the overflow buffer); memory stays bounded by the longest field
// - Pull mode (`Iterator`) stops right after each surfaced row
// - Push mode (`parse_with`) dispatches rows until end of stream or cancel
// - `into_parts` hands the stream and unscanned bytes to a follow-up
//   scanner, which is how header rows get their own options

use crate::core::{is_blank, strip_quotes, Watcher};
use crate::error::{ConversionError, CsvError, Result};
use crate::materialize::Materializer;
use crate::options::ParseOptions;
use std::io::{ErrorKind, Read};
use tracing::{debug, trace, warn};

pub use tokio_util::sync::CancellationToken;

const BOM: char = '\u{feff}';

/// Outcome of a push-mode scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Rows handed to the handler.
    pub rows: usize,
    /// Bytes consumed from the stream so far, a leading BOM included.
    pub bytes: usize,
    pub cancelled: bool,
}

/// A stream plus the scan position, for continuing with other options.
#[derive(Debug)]
pub struct ScanParts<R> {
    pub reader: R,
    /// Index of the next row in the stream.
    pub row: usize,
    /// Absolute byte offset of `buffered[0]`.
    pub offset: usize,
    /// Bytes already read from `reader` but not yet scanned.
    pub buffered: Vec<u8>,
}

impl<R> ScanParts<R> {
    /// Parts for a stream nothing has been read from.
    pub fn new(reader: R) -> Self {
        ScanParts {
            reader,
            row: 0,
            offset: 0,
            buffered: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct ScanState {
    in_quotes: bool,
    /// Quote seen inside quotes; the next char decides close vs escape.
    pending_quote: bool,
    column_doubled: bool,
    /// Some column of the current row had non-blank raw text.
    row_non_blank: bool,
    row: usize,
    /// Absolute offset where the current column starts.
    column_start: usize,
    /// Text of the current column from `column_start` up to the chunk base.
    overflow: String,
    expected_columns: Option<usize>,
    row_error: Option<(usize, ConversionError)>,
}

enum Step<T> {
    Row(T),
    Done,
    Cancelled,
}

/// Single-pass scanner over a character stream.
pub struct Scanner<R, M: Materializer> {
    reader: R,
    materializer: M,
    options: ParseOptions,
    column_watcher: Watcher,
    row_watcher: Watcher,
    state: ScanState,
    read_buf: Vec<u8>,
    /// Raw bytes not yet decoded (an incomplete code point, or resumed input).
    carry: Vec<u8>,
    /// Decoded current chunk.
    text: String,
    /// Scan position within `text`.
    pos: usize,
    /// Absolute stream offset of `text[0]`.
    base: usize,
    at_stream_start: bool,
    eof: bool,
    failed: bool,
    emitted: usize,
}

impl<R: Read, M: Materializer> Scanner<R, M> {
    /// Scanner over a fresh stream. Options are validated before any read.
    pub fn new(reader: R, options: ParseOptions, materializer: M) -> Result<Self> {
        Self::resume(ScanParts::new(reader), options, materializer)
    }

    /// Continue scanning where another scanner stopped.
    pub fn resume(parts: ScanParts<R>, options: ParseOptions, materializer: M) -> Result<Self> {
        options.validate()?;
        debug!(
            column_delimiter = ?options.column_delimiter,
            row_delimiter = ?options.row_delimiter,
            quote = ?options.quote,
            start_row = options.start_row,
            chunk_size = options.chunk_size,
            resume_row = parts.row,
            "scanner created"
        );
        Ok(Scanner {
            reader: parts.reader,
            materializer,
            column_watcher: Watcher::new(&options.column_delimiter),
            row_watcher: Watcher::new(&options.row_delimiter),
            read_buf: vec![0; options.chunk_size],
            options,
            state: ScanState {
                row: parts.row,
                column_start: parts.offset,
                ..ScanState::default()
            },
            carry: parts.buffered,
            text: String::new(),
            pos: 0,
            base: parts.offset,
            at_stream_start: parts.offset == 0 && parts.row == 0,
            eof: false,
            failed: false,
            emitted: 0,
        })
    }

    /// Column count every row is checked against (normally the header width).
    pub fn with_expected_columns(mut self, columns: usize) -> Self {
        self.state.expected_columns = Some(columns);
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn materializer(&self) -> &M {
        &self.materializer
    }

    /// Index of the next row to be scanned.
    pub fn row(&self) -> usize {
        self.state.row
    }

    /// Release the stream and everything read from it but not yet scanned.
    /// Meant to be called between rows.
    pub fn into_parts(self) -> ScanParts<R> {
        let mut buffered = self.text.as_bytes()[self.pos..].to_vec();
        buffered.extend_from_slice(&self.carry);
        ScanParts {
            reader: self.reader,
            row: self.state.row,
            offset: self.base + self.pos,
            buffered,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Push mode: hand every row to `handler` until the stream ends, an
    /// error occurs or `token` is cancelled.
    pub fn parse_with<F>(&mut self, mut handler: F, token: &CancellationToken) -> Result<ScanSummary>
    where
        F: FnMut(M::Output),
    {
        let start = self.emitted;
        loop {
            let step = if token.is_cancelled() {
                Ok(Step::Cancelled)
            } else {
                self.advance(Some(token))
            };
            match step {
                Ok(Step::Row(row)) => handler(row),
                Ok(Step::Done) => return Ok(self.summary(start, false)),
                Ok(Step::Cancelled) => {
                    warn!(row = self.state.row, "scan cancelled");
                    return Ok(self.summary(start, true));
                }
                Err(e) => {
                    self.failed = true;
                    return Err(e);
                }
            }
        }
    }

    fn summary(&self, start: usize, cancelled: bool) -> ScanSummary {
        ScanSummary {
            rows: self.emitted - start,
            bytes: self.base + self.pos,
            cancelled,
        }
    }

    fn advance(&mut self, token: Option<&CancellationToken>) -> Result<Step<M::Output>> {
        loop {
            if self.eof || self.failed {
                return Ok(Step::Done);
            }
            if let Some(row) = self.scan_chunk()? {
                self.emitted += 1;
                return Ok(Step::Row(row));
            }
            if token.is_some_and(CancellationToken::is_cancelled) {
                return Ok(Step::Cancelled);
            }
            self.stash_tail();
            if !self.fill()? {
                let last = self.finish()?;
                debug!(rows = self.state.row, bytes = self.base, "scan complete");
                return Ok(match last {
                    Some(row) => {
                        self.emitted += 1;
                        Step::Row(row)
                    }
                    None => Step::Done,
                });
            }
        }
    }

    /// Scan the current chunk from `pos`. Returns as soon as a row surfaces.
    fn scan_chunk(&mut self) -> Result<Option<M::Output>> {
        let Scanner {
            materializer,
            options,
            column_watcher,
            row_watcher,
            state,
            text,
            pos,
            base,
            ..
        } = self;
        let text: &str = text;
        let quote = options.quote;
        let start = *pos;

        for (offset, c) in text[start..].char_indices() {
            let local = start + offset;
            let index = *base + local;
            let next = local + c.len_utf8();
            let column_hit = column_watcher.find(c, index);
            let row_hit = row_watcher.find(c, index);

            if let Some(q) = quote {
                if state.pending_quote {
                    state.pending_quote = false;
                    if c == q {
                        state.column_doubled = true;
                        continue;
                    }
                    state.in_quotes = false;
                } else if state.in_quotes {
                    state.pending_quote = c == q;
                    continue;
                } else if c == q {
                    state.in_quotes = true;
                    continue;
                }
            }

            let active = state.row >= options.start_row;
            if let (Some(at), true) = (column_hit, active) {
                column_watcher.reset();
                row_watcher.reset();
                end_column(materializer, state, text, *base, at, quote);
                state.column_start = *base + next;
            } else if let Some(at) = row_hit {
                column_watcher.reset();
                row_watcher.reset();
                let outcome = if active {
                    end_row(materializer, state, options, text, *base, at)
                } else {
                    state.overflow.clear();
                    Ok(None)
                };
                state.row += 1;
                state.column_start = *base + next;
                if let Ok(None) = outcome {
                    continue;
                }
                *pos = next;
                return outcome;
            }
        }

        *pos = text.len();
        Ok(None)
    }

    /// Move the unscanned tail of the current column into the overflow buffer.
    fn stash_tail(&mut self) {
        if self.state.row >= self.options.start_row {
            let from = self.state.column_start.saturating_sub(self.base);
            if from < self.text.len() {
                self.state.overflow.push_str(&self.text[from..]);
            }
        }
        self.base += self.text.len();
        self.text.clear();
        self.pos = 0;
    }

    /// Decode the next chunk into `text`. Returns `false` at end of stream.
    fn fill(&mut self) -> Result<bool> {
        loop {
            if self.decode_carry()? {
                trace!(offset = self.base, len = self.text.len(), "chunk decoded");
                return Ok(true);
            }
            let n = match self.reader.read(&mut self.read_buf) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                if !self.carry.is_empty() {
                    return Err(CsvError::malformed(
                        self.state.row + 1,
                        "stream ends inside a UTF-8 sequence",
                    ));
                }
                return Ok(false);
            }
            self.carry.extend_from_slice(&self.read_buf[..n]);
        }
    }

    /// Decode the complete code points at the front of `carry`.
    fn decode_carry(&mut self) -> Result<bool> {
        // an invalid sequence is reported once every row before it is scanned
        let valid = match std::str::from_utf8(&self.carry) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() || e.valid_up_to() > 0 => e.valid_up_to(),
            Err(_) => {
                return Err(CsvError::malformed(
                    self.state.row + 1,
                    format!("invalid UTF-8 at byte {}", self.base),
                ))
            }
        };
        if valid == 0 {
            return Ok(false);
        }
        self.text
            .push_str(&String::from_utf8_lossy(&self.carry[..valid]));
        self.carry.drain(..valid);

        if self.at_stream_start {
            self.at_stream_start = false;
            if self.text.starts_with(BOM) {
                self.text.drain(..BOM.len_utf8());
                self.base += BOM.len_utf8();
                self.state.column_start = self.base;
            }
        }
        Ok(true)
    }

    /// End of stream acts as a final row terminator.
    fn finish(&mut self) -> Result<Option<M::Output>> {
        self.eof = true;
        if self.state.in_quotes && !self.state.pending_quote {
            return Err(CsvError::malformed(
                self.state.row + 1,
                "stream ends inside a quoted field",
            ));
        }
        self.state.in_quotes = false;
        self.state.pending_quote = false;

        let active = self.state.row >= self.options.start_row;
        if !active || (self.state.overflow.is_empty() && !self.materializer.is_column_set()) {
            return Ok(None);
        }
        let Scanner {
            materializer,
            options,
            state,
            text,
            base,
            ..
        } = self;
        let outcome = end_row(materializer, state, options, text.as_str(), *base, *base);
        state.row += 1;
        outcome
    }
}

impl<R: Read, M: Materializer> Iterator for Scanner<R, M> {
    type Item = Result<M::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance(None) {
            Ok(Step::Row(row)) => Some(Ok(row)),
            Ok(Step::Done) | Ok(Step::Cancelled) => None,
            Err(e) => {
                // a bad field only loses its row; anything else ends the scan
                if !matches!(e, CsvError::Conversion { .. }) {
                    self.failed = true;
                }
                Some(Err(e))
            }
        }
    }
}

/// Hand the column ending at absolute offset `end` to the materializer.
fn end_column<M: Materializer>(
    materializer: &mut M,
    state: &mut ScanState,
    text: &str,
    base: usize,
    end: usize,
    quote: Option<char>,
) {
    let span: &str = if state.column_start >= base {
        &text[state.column_start - base..end - base]
    } else if end <= base {
        // delimiter started in an earlier chunk
        &state.overflow[..end - state.column_start]
    } else {
        state.overflow.push_str(&text[..end - base]);
        &state.overflow
    };

    let (inner, quoted) = strip_quotes(span, quote);
    if !is_blank(inner) {
        state.row_non_blank = true;
    }
    if state.row_error.is_none() {
        let column = materializer.column_count();
        if let Err(e) = materializer.add_column(inner, quoted, state.column_doubled) {
            state.row_error = Some((column, e));
        }
    }
    state.overflow.clear();
    state.column_doubled = false;
}

/// Finish the current row and decide whether it surfaces.
fn end_row<M: Materializer>(
    materializer: &mut M,
    state: &mut ScanState,
    options: &ParseOptions,
    text: &str,
    base: usize,
    end: usize,
) -> Result<Option<M::Output>> {
    end_column(materializer, state, text, base, end, options.quote);
    let line = state.row + 1;
    let blank = !std::mem::take(&mut state.row_non_blank);

    if let Some((column, source)) = state.row_error.take() {
        materializer.reset();
        return Err(CsvError::Conversion {
            line,
            column,
            source,
        });
    }

    let checked = !options.column_delimiter.is_empty();
    let columns = materializer.column_count();
    if let (true, Some(expected)) = (checked, state.expected_columns) {
        // applies to rows the emission policy drops too
        if expected > 1 && columns == 1 && !blank {
            return Err(CsvError::malformed(line, "row is missing the column delimiter"));
        }
    }

    let surfaced = (materializer.is_column_set() && !options.skip_empty_rows)
        || !materializer.is_empty();
    if !surfaced {
        materializer.reset();
        return Ok(None);
    }

    if checked {
        match state.expected_columns {
            Some(expected) => {
                if options.strict_column_count && columns != expected {
                    return Err(CsvError::malformed(
                        line,
                        format!("row has {columns} columns, expected {expected}"),
                    ));
                }
            }
            None if !blank => state.expected_columns = Some(columns),
            None => {}
        }
    }

    Ok(Some(materializer.take()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::RowMaterializer;

    fn opts() -> ParseOptions {
        ParseOptions::default().with_row_delimiter("\n")
    }

    fn scan(input: &str, options: ParseOptions) -> Result<Vec<Vec<String>>> {
        let quote = options.quote;
        Scanner::new(input.as_bytes(), options, RowMaterializer::new(quote))?.collect()
    }

    fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_simple_rows() {
        let out = scan("a,b\nc,d\n", opts()).unwrap();
        assert_eq!(out, rows(&[&["a", "b"], &["c", "d"]]));
    }

    #[test]
    fn test_no_trailing_terminator() {
        let out = scan("a,b\nc,d", opts()).unwrap();
        assert_eq!(out, rows(&[&["a", "b"], &["c", "d"]]));
        let out = scan("a,", opts()).unwrap();
        assert_eq!(out, rows(&[&["a", ""]]));
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let input = "a,b\r\nc,d\r\n";
        for chunk in 1..=12 {
            let options = ParseOptions::default()
                .with_row_delimiter("\r\n")
                .with_chunk_size(chunk);
            let out = scan(input, options).unwrap();
            assert_eq!(out, rows(&[&["a", "b"], &["c", "d"]]), "chunk size {chunk}");
        }
    }

    #[test]
    fn test_bare_cr_is_data_with_crlf_terminator() {
        let options = ParseOptions::default().with_row_delimiter("\r\n");
        let out = scan("a\rb,c\r\n", options).unwrap();
        assert_eq!(out, rows(&[&["a\rb", "c"]]));
    }

    #[test]
    fn test_quoted_delimiters_are_data() {
        let out = scan("\"a,b\",\"x\ny\"\n", opts()).unwrap();
        assert_eq!(out, rows(&[&["a,b", "x\ny"]]));
    }

    #[test]
    fn test_doubled_quote_across_chunks() {
        let input = "\"x\"\"y\",z\n";
        for chunk in 1..=10 {
            let out = scan(input, opts().with_chunk_size(chunk)).unwrap();
            assert_eq!(out, rows(&[&["x\"y", "z"]]), "chunk size {chunk}");
        }
    }

    #[test]
    fn test_multibyte_across_chunks() {
        let input = "é,ü§\n漢字,x\n";
        for chunk in 1..=6 {
            let out = scan(input, opts().with_chunk_size(chunk)).unwrap();
            assert_eq!(out, rows(&[&["é", "ü§"], &["漢字", "x"]]));
        }
    }

    #[test]
    fn test_multichar_delimiters() {
        let options = opts()
            .with_column_delimiter("::")
            .with_row_delimiter("|||");
        for chunk in 1..=8 {
            let out = scan("a::b|||c::d|||", options.clone().with_chunk_size(chunk)).unwrap();
            assert_eq!(out, rows(&[&["a", "b"], &["c", "d"]]));
        }
    }

    #[test]
    fn test_empty_rows() {
        let out = scan("a\n\nb\n", opts()).unwrap();
        assert_eq!(out, rows(&[&["a"], &[""], &["b"]]));

        let out = scan("a,b\n\n , \nc,d\n", opts().with_skip_empty_rows(true)).unwrap();
        assert_eq!(out, rows(&[&["a", "b"], &["c", "d"]]));
    }

    #[test]
    fn test_start_row_skips_preamble() {
        let out = scan("junk \"with quote\"\nmore,junk\na,b\n", opts().with_start_row(2)).unwrap();
        assert_eq!(out, rows(&[&["a", "b"]]));
    }

    #[test]
    fn test_bom_is_stripped() {
        let out = scan("\u{feff}a,b\n", opts().with_chunk_size(1)).unwrap();
        assert_eq!(out, rows(&[&["a", "b"]]));
    }

    #[test]
    fn test_bom_counts_toward_stream_offsets() {
        let input = "\u{feff}a,b\n";
        for chunk in [1, 2, 4096] {
            let mut scanner =
                Scanner::new(input.as_bytes(), opts().with_chunk_size(chunk), RowMaterializer::new(None))
                    .unwrap();
            let summary = scanner.parse_with(|_| {}, &CancellationToken::new()).unwrap();
            assert_eq!(summary.bytes, input.len(), "chunk size {chunk}");
        }

        let bytes: &[u8] = b"\xef\xbb\xbfa\xff";
        let result: Result<Vec<_>> = Scanner::new(bytes, opts(), RowMaterializer::new(None))
            .unwrap()
            .collect();
        match result {
            Err(CsvError::Malformed { reason, .. }) => assert_eq!(reason, "invalid UTF-8 at byte 4"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_column_delimiter() {
        let out = scan("a,b\nc\n", opts().with_column_delimiter("")).unwrap();
        assert_eq!(out, rows(&[&["a,b"], &["c"]]));
    }

    #[test]
    fn test_no_quote_char() {
        let out = scan("\"a\",b\n", opts().with_quote(None)).unwrap();
        assert_eq!(out, rows(&[&["\"a\"", "b"]]));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = scan("A,\"unterminated", opts()).unwrap_err();
        assert!(matches!(err, CsvError::Malformed { line: 1, .. }));
        // closing quote as the very last char is fine
        assert_eq!(scan("A,\"ok\"", opts()).unwrap(), rows(&[&["A", "ok"]]));
    }

    #[test]
    fn test_missing_column_delimiter() {
        let err = scan("name,type\nA", opts()).unwrap_err();
        match err {
            CsvError::Malformed { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("missing the column delimiter"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_strict_column_count() {
        let err = scan("a,b\nc,d,e\n", opts().with_strict_column_count(true)).unwrap_err();
        assert!(matches!(err, CsvError::Malformed { line: 2, .. }));
        // lenient by default
        assert_eq!(scan("a,b\nc,d,e\n", opts()).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes: &[u8] = b"a,\xff\n";
        let mut scanner = Scanner::new(bytes, opts(), RowMaterializer::new(Some('"'))).unwrap();
        assert!(matches!(scanner.next(), Some(Err(CsvError::Malformed { .. }))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_rows_before_invalid_utf8_are_yielded() {
        let bytes: &[u8] = b"a,b\nc,d\ne,\xff\n";
        let mut scanner = Scanner::new(bytes, opts(), RowMaterializer::new(Some('"'))).unwrap();
        assert_eq!(scanner.next().unwrap().unwrap(), vec!["a", "b"]);
        assert_eq!(scanner.next().unwrap().unwrap(), vec!["c", "d"]);
        match scanner.next() {
            Some(Err(CsvError::Malformed { line, reason })) => {
                assert_eq!(line, 3);
                assert_eq!(reason, "invalid UTF-8 at byte 10");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_truncated_utf8_at_end() {
        let bytes: &[u8] = b"a,\xc3";
        let result: Result<Vec<_>> = Scanner::new(bytes, opts(), RowMaterializer::new(None))
            .unwrap()
            .collect();
        assert!(matches!(result, Err(CsvError::Malformed { .. })));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_io_error_passes_through() {
        let mut scanner = Scanner::new(FailingReader, opts(), RowMaterializer::new(None)).unwrap();
        assert!(matches!(scanner.next(), Some(Err(CsvError::Io(_)))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_invalid_options_rejected_before_reading() {
        let bad = opts().with_column_delimiter("\"");
        assert!(matches!(
            Scanner::new(FailingReader, bad, RowMaterializer::new(None)),
            Err(CsvError::Configuration(_))
        ));
    }

    #[test]
    fn test_push_mode_and_cancel() {
        let input = "a\nb\nc\nd\n";
        let token = CancellationToken::new();
        let mut seen = Vec::new();
        let mut scanner = Scanner::new(input.as_bytes(), opts(), RowMaterializer::new(None)).unwrap();
        let summary = scanner
            .parse_with(
                |row| {
                    seen.push(row);
                    if seen.len() == 2 {
                        token.cancel();
                    }
                },
                &token,
            )
            .unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.rows, 2);
        assert_eq!(seen, rows(&[&["a"], &["b"]]));
    }

    #[test]
    fn test_push_mode_to_end() {
        let token = CancellationToken::new();
        let mut count = 0;
        let mut scanner =
            Scanner::new("a,b\nc,d\n".as_bytes(), opts(), RowMaterializer::new(None)).unwrap();
        let summary = scanner.parse_with(|_| count += 1, &token).unwrap();
        assert_eq!(count, 2);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.bytes, 8);
        assert!(!summary.cancelled);
    }

    /// Cancels the token once `after` reads have been served.
    struct CancellingReader<'a> {
        data: &'a [u8],
        reads: usize,
        after: usize,
        token: CancellationToken,
    }

    impl Read for CancellingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            if self.reads == self.after {
                self.token.cancel();
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_cancel_checked_before_each_read() {
        // one long row over many chunks, so no row boundary is ever reached
        let long = format!("{},end\n", "x".repeat(100));
        let token = CancellationToken::new();
        let reader = CancellingReader {
            data: long.as_bytes(),
            reads: 0,
            after: 3,
            token: token.clone(),
        };
        let mut scanner =
            Scanner::new(reader, opts().with_chunk_size(8), RowMaterializer::new(None)).unwrap();
        let mut seen = 0;
        let summary = scanner.parse_with(|_| seen += 1, &token).unwrap();
        assert!(summary.cancelled);
        assert_eq!(seen, 0);
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.bytes, 24);
        assert_eq!(scanner.into_inner().reads, 3);
    }

    #[test]
    fn test_into_parts_switches_options() {
        let input = "h1;h2\na|b\nc|d\n";
        let mut header = Scanner::new(
            input.as_bytes(),
            opts().with_column_delimiter(";").with_chunk_size(4),
            RowMaterializer::new(None),
        )
        .unwrap();
        assert_eq!(header.next().unwrap().unwrap(), vec!["h1", "h2"]);
        let parts = header.into_parts();
        assert_eq!(parts.row, 1);
        assert_eq!(parts.offset, 6);

        let data = Scanner::resume(parts, opts().with_column_delimiter("|"), RowMaterializer::new(None))
            .unwrap()
            .with_expected_columns(2);
        let out: Vec<Vec<String>> = data.collect::<Result<_>>().unwrap();
        assert_eq!(out, rows(&[&["a", "b"], &["c", "d"]]));
    }
}
