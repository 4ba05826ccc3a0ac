//! Wire framing for record streams.
//!
//! Two encodings move records between processes:
//! - binary: each record is bincode behind a little-endian `u32` length
//!   prefix (the indexer's default output, the stream tool's default
//!   input);
//! - JSON: one record object per line, byte values base64-encoded.
//!
//! Readers are iterators so consumers stream rather than materialize.

use crate::store::StoreError;
use std::io::{BufRead, Read, Write};
use xylem_core::Record;

/// Writes length-delimited binary records.
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, record: &Record) -> Result<(), StoreError> {
        let body = bincode::serialize(record)?;
        let len = u32::try_from(body.len()).map_err(|_| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "record exceeds 4 GiB frame limit",
            ))
        })?;
        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(&body)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Reads length-delimited binary records until clean end of stream.
pub struct RecordReader<R: Read> {
    inner: R,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the 4-byte frame header, distinguishing clean EOF (no bytes)
    /// from a truncated frame.
    fn read_len(&mut self) -> Result<Option<u32>, StoreError> {
        let mut header = [0u8; 4];
        let mut filled = 0;
        while filled < header.len() {
            let n = self.inner.read(&mut header[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "truncated record frame header",
                )));
            }
            filled += n;
        }
        Ok(Some(u32::from_le_bytes(header)))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = match self.read_len() {
            Ok(Some(len)) => len as usize,
            Ok(None) => return None,
            Err(err) => return Some(Err(err)),
        };
        let mut body = vec![0u8; len];
        if let Err(err) = self.inner.read_exact(&mut body) {
            return Some(Err(StoreError::Io(err)));
        }
        Some(bincode::deserialize(&body).map_err(StoreError::from))
    }
}

/// Writes one JSON record per line.
pub struct JsonRecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> JsonRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, record: &Record) -> Result<(), StoreError> {
        serde_json::to_writer(&mut self.inner, record)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Reads one JSON record per line, skipping blank lines.
pub struct JsonRecordReader<R: BufRead> {
    lines: std::io::Lines<R>,
}

impl<R: BufRead> JsonRecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: inner.lines(),
        }
    }
}

impl<R: BufRead> Iterator for JsonRecordReader<R> {
    type Item = Result<Record, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(StoreError::Io(err))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(StoreError::from));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xylem_core::{schema, EntityName};

    fn sample() -> Vec<Record> {
        let file = EntityName {
            corpus: "c".into(),
            path: "f".into(),
            ..Default::default()
        };
        let dir = EntityName {
            corpus: "c".into(),
            path: ".".into(),
            ..Default::default()
        };
        vec![
            Record::fact(file.clone(), schema::NODE_KIND_FACT, b"file".to_vec()),
            Record::fact(file.clone(), schema::FILE_TEXT_FACT, vec![0, 159, 146, 150]),
            Record::edge(file, schema::CHILD_OF_EDGE, dir),
        ]
    }

    #[test]
    fn test_binary_stream() {
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        for record in sample() {
            writer.write(&record).unwrap();
        }
        writer.flush().unwrap();

        let read: Vec<_> = RecordReader::new(buf.as_slice())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(read, sample());
    }

    #[test]
    fn test_truncated_binary_stream_errors() {
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        writer.write(&sample()[0]).unwrap();
        buf.truncate(buf.len() - 1);

        let results: Vec<_> = RecordReader::new(buf.as_slice()).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_json_stream_carries_binary_values() {
        let mut buf = Vec::new();
        let mut writer = JsonRecordWriter::new(&mut buf);
        for record in sample() {
            writer.write(&record).unwrap();
        }

        let read: Vec<_> = JsonRecordReader::new(buf.as_slice())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(read, sample());
    }
}
