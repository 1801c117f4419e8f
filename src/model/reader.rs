//! Streaming reader for persisted comment files
//!
//! A comment file is one JSON array. It is read one top-level element at a time
//! so memory stays proportional to a single comment, not the whole video.

use super::{Message, wire};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const BYTE_ORDER_MARK: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Splits a JSON array into the raw bytes of its elements
///
/// Only the array structure is checked here (brackets, separators, string
/// escapes); each element is handed to serde as-is.
pub struct JsonArrayReader<R> {
    reader: R,
    source: PathBuf,
    offset: u64,
    state: ArrayState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArrayState {
    BeforeOpen,
    FirstElement,
    AfterElement,
    Done,
}

impl<R: BufRead> JsonArrayReader<R> {
    /// Wrap a reader; `source` names it in error messages
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source: source.into(),
            offset: 0,
            state: ArrayState::BeforeOpen,
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.reader.fill_buf()?.first().copied())
    }

    fn bump(&mut self) {
        self.reader.consume(1);
        self.offset += 1;
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedFile {
            path: self.source.clone(),
            offset: self.offset,
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.peek()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.bump();
        }
        Ok(())
    }

    fn skip_byte_order_mark(&mut self) -> Result<()> {
        if self.peek()? != Some(BYTE_ORDER_MARK[0]) {
            return Ok(());
        }
        for expected in BYTE_ORDER_MARK {
            if self.peek()? != Some(expected) {
                return Err(self.malformed("invalid byte order mark"));
            }
            self.bump();
        }
        Ok(())
    }

    /// Consume everything up to and including `[`
    fn open(&mut self) -> Result<()> {
        self.skip_byte_order_mark()?;
        self.skip_whitespace()?;
        match self.peek()? {
            Some(b'[') => {
                self.bump();
                Ok(())
            }
            Some(_) => Err(self.malformed("expected '['")),
            None => Err(self.malformed("empty file")),
        }
    }

    /// After `]`, only whitespace may follow
    fn close(&mut self) -> Result<()> {
        self.bump();
        self.skip_whitespace()?;
        match self.peek()? {
            None => Ok(()),
            Some(_) => Err(self.malformed("trailing characters after ']'")),
        }
    }

    /// Read one element, stopping before the `,` or `]` that ends it
    fn read_element(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        loop {
            let Some(b) = self.peek()? else {
                return Err(self.malformed("unexpected end of file inside array"));
            };

            if in_string {
                buf.push(b);
                self.bump();
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                    if depth == 0 {
                        return Ok(buf);
                    }
                }
                continue;
            }

            match b {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' if depth == 0 => return Ok(buf),
                b'}' | b']' => {
                    depth -= 1;
                    buf.push(b);
                    self.bump();
                    if depth == 0 {
                        return Ok(buf);
                    }
                    continue;
                }
                b',' if depth == 0 => return Ok(buf),
                _ => {}
            }
            buf.push(b);
            self.bump();
        }
    }

    fn advance(&mut self) -> Result<Option<(u64, Vec<u8>)>> {
        match self.state {
            ArrayState::Done => return Ok(None),
            ArrayState::BeforeOpen => {
                self.open()?;
                self.state = ArrayState::FirstElement;
                self.skip_whitespace()?;
                if self.peek()? == Some(b']') {
                    self.state = ArrayState::Done;
                    self.close()?;
                    return Ok(None);
                }
            }
            ArrayState::FirstElement => {}
            ArrayState::AfterElement => {
                self.skip_whitespace()?;
                match self.peek()? {
                    Some(b',') => self.bump(),
                    Some(b']') => {
                        self.state = ArrayState::Done;
                        self.close()?;
                        return Ok(None);
                    }
                    Some(_) => return Err(self.malformed("expected ',' or ']'")),
                    None => return Err(self.malformed("unexpected end of file inside array")),
                }
            }
        }

        self.skip_whitespace()?;
        let start = self.offset;
        let element = self.read_element()?;
        if element.iter().all(u8::is_ascii_whitespace) {
            return Err(self.malformed("expected a value"));
        }
        self.state = ArrayState::AfterElement;
        Ok(Some((start, element)))
    }

    fn next_element(&mut self) -> Option<Result<(u64, Vec<u8>)>> {
        match self.advance() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => None,
            Err(e) => {
                self.state = ArrayState::Done;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> Iterator for JsonArrayReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element()
            .map(|result| result.map(|(_, element)| element))
    }
}

/// Lazy sequence of messages read from a comment file
///
/// Finite and single-pass: restarting means opening the file again.
pub struct MessageReader<R> {
    elements: JsonArrayReader<R>,
}

impl<R: BufRead> MessageReader<R> {
    /// Read messages from any buffered reader
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            elements: JsonArrayReader::new(reader, source),
        }
    }
}

impl<R: BufRead> Iterator for MessageReader<R> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, element) = match self.elements.next_element()? {
            Ok(element) => element,
            Err(e) => return Some(Err(e)),
        };
        let parsed = serde_json::from_slice::<wire::Comment>(&element)
            .map(Message::from)
            .map_err(|e| Error::MalformedFile {
                path: self.elements.source.clone(),
                offset: start,
                reason: e.to_string(),
            });
        if parsed.is_err() {
            self.elements.state = ArrayState::Done;
        }
        Some(parsed)
    }
}

/// Open a comment file and stream its messages
pub fn parse_messages(path: &Path) -> Result<MessageReader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(MessageReader::new(BufReader::new(file), path))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn elements(input: &str) -> Vec<Result<String>> {
        JsonArrayReader::new(Cursor::new(input.as_bytes().to_vec()), "test.json")
            .map(|r| r.map(|bytes| String::from_utf8(bytes).unwrap()))
            .collect()
    }

    fn ok_elements(input: &str) -> Vec<String> {
        elements(input).into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn empty_array_yields_nothing() {
        assert!(ok_elements("[]").is_empty());
        assert!(ok_elements("  [ \n ]  \n").is_empty());
    }

    #[test]
    fn splits_objects_and_scalars() {
        let items = ok_elements(r#"[{"a":1},{"b":[1,2,{"c":"]"}]}, 3 ,"x"]"#);
        assert_eq!(items, vec![r#"{"a":1}"#, r#"{"b":[1,2,{"c":"]"}]}"#, "3 ", r#""x""#]);
    }

    #[test]
    fn strings_with_escapes_do_not_confuse_nesting() {
        let items = ok_elements(r#"[{"t":"a \"}\" , ]\\"},{"t":"{"}]"#);
        assert_eq!(items, vec![r#"{"t":"a \"}\" , ]\\"}"#, r#"{"t":"{"}"#]);
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let mut bytes = BYTE_ORDER_MARK.to_vec();
        bytes.extend_from_slice(br#"[{"a":1}]"#);
        let items: Vec<_> = JsonArrayReader::new(Cursor::new(bytes), "bom.json")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(items, vec![br#"{"a":1}"#.to_vec()]);
    }

    #[test]
    fn truncated_array_is_an_error() {
        let results = elements(r#"[{"a":1},{"b":"#);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(Error::MalformedFile { reason, .. }) => {
                assert!(reason.contains("unexpected end of file"), "{reason}");
            }
            other => panic!("expected malformed file, got {other:?}"),
        }
    }

    #[test]
    fn missing_close_bracket_is_an_error() {
        let results = elements(r#"[{"a":1}"#);
        assert_eq!(results.len(), 2);
        assert!(results[1].is_err());
    }

    #[test]
    fn non_array_is_rejected_with_offset() {
        let results = elements(r#"  {"a":1}"#);
        match &results[..] {
            [Err(Error::MalformedFile { offset, reason, .. })] => {
                assert_eq!(*offset, 2);
                assert_eq!(reason, "expected '['");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn trailing_comma_and_trailing_garbage_are_rejected() {
        assert!(elements(r#"[{"a":1},]"#).iter().any(Result::is_err));
        assert!(elements(r#"[{"a":1}] x"#).iter().any(Result::is_err));
        assert!(elements(r#"[{"a":1} {"b":2}]"#).iter().any(Result::is_err));
    }

    #[test]
    fn iteration_stops_after_an_error() {
        let mut reader = JsonArrayReader::new(Cursor::new(b"[1} 2]".to_vec()), "x.json");
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn message_reader_parses_each_comment() {
        let json = r#"[
            {"createdAt":"2021-06-01T18:00:00Z","contentOffsetSeconds":1,"commenter":{"login":"a","displayName":"A"},"message":{"fragments":[{"text":"one"}]}},
            {"createdAt":"2021-06-01T18:00:01Z","contentOffsetSeconds":2,"commenter":null,"message":{"fragments":[{"text":"two"}]}}
        ]"#;
        let messages: Vec<Message> = MessageReader::new(Cursor::new(json.as_bytes()), "m.json")
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body, "one");
        assert_eq!(messages[1].body, "two");
        assert!(messages[1].commenter.is_none());
    }

    #[test]
    fn message_without_body_fails_at_its_offset() {
        let json = r#"[{"createdAt":"2021-06-01T18:00:00Z","contentOffsetSeconds":1}]"#;
        let results: Vec<_> = MessageReader::new(Cursor::new(json.as_bytes()), "m.json").collect();

        match &results[..] {
            [Err(Error::MalformedFile { offset, reason, .. })] => {
                assert_eq!(*offset, 1);
                assert!(reason.contains("message"), "{reason}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
