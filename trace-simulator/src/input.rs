//! Streaming CSV trace reader.
//!
//! Grounded on `cache-simulator/src/input.rs`'s `LogReader`/`RequestIterator`:
//! files are opened lazily, one at a time, through a single reused line
//! buffer and a 1 MiB `BufReader`, so memory use stays proportional to one
//! line rather than the whole trace.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use cache_policy_core::{Request, TraceError};

/// Discovers and streams every trace file (`.csv`, `.log`, `.txt`) under a
/// directory, in sorted order, as one continuous `Request` stream.
#[derive(Debug)]
pub struct LogReader {
    input_dir: PathBuf,
}

impl LogReader {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }

    fn log_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.input_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("csv") | Some("log") | Some("txt")
                )
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Opens a streaming iterator over every request in every trace file.
    pub fn stream_requests(&self) -> std::io::Result<RequestIterator> {
        Ok(RequestIterator {
            files: self.log_files()?,
            current_file_index: 0,
            current_reader: None,
            current_line_no: 0,
            line_buffer: String::new(),
        })
    }
}

/// Parses one `time,app_id,type,key_size,val_size,kid` line (spec §6).
///
/// Returns `None` for blank lines, `#`-comments, and the CSV header row
/// (detected by a non-numeric `time` field), matching the teacher's
/// `parse_line` skip rules.
fn parse_line(line: &str, line_no: usize) -> Option<Result<Request, TraceError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 6 {
        return Some(Err(TraceError::MalformedLine {
            line_no,
            reason: format!("expected 6 fields, found {}", fields.len()).into(),
        }));
    }

    let Ok(time) = fields[0].trim().parse::<f64>() else {
        return None; // header row or non-numeric leading field
    };

    let parsed = (|| -> Result<Request, core::num::ParseIntError> {
        let app_id = fields[1].trim().parse::<u64>()?;
        let kind = fields[2].trim().parse::<u8>()?;
        let key_size = fields[3].trim().parse::<u32>()?;
        let val_size = fields[4].trim().parse::<u32>()?;
        let kid = fields[5].trim().parse::<u32>()?;
        Ok(Request::new(time, app_id, kind, key_size, val_size, kid))
    })();

    match parsed {
        Ok(req) if req.size() > 0 => Some(Ok(req)),
        Ok(req) => Some(Err(TraceError::MalformedLine {
            line_no,
            reason: format!("zero-size request for kid={}", req.kid).into(),
        })),
        Err(e) => Some(Err(TraceError::MalformedLine {
            line_no,
            reason: e.to_string().into(),
        })),
    }
}

/// Lazily-opened, file-spanning iterator of `Request`s.
#[derive(Debug)]
pub struct RequestIterator {
    files: Vec<PathBuf>,
    current_file_index: usize,
    current_reader: Option<BufReader<File>>,
    current_line_no: usize,
    line_buffer: String,
}

impl RequestIterator {
    fn open_next_file(&mut self) -> std::io::Result<bool> {
        if self.current_file_index >= self.files.len() {
            return Ok(false);
        }
        let path: &Path = &self.files[self.current_file_index];
        let file = File::open(path)?;
        self.current_reader = Some(BufReader::with_capacity(1024 * 1024, file));
        self.current_file_index += 1;
        self.current_line_no = 0;
        Ok(true)
    }
}

impl Iterator for RequestIterator {
    type Item = Result<Request, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_reader.is_none() && !self.open_next_file().ok()? {
                return None;
            }

            let reader = self.current_reader.as_mut().expect("just opened");
            self.line_buffer.clear();
            match reader.read_line(&mut self.line_buffer) {
                Ok(0) => {
                    self.current_reader = None;
                    continue;
                }
                Ok(_) => {
                    self.current_line_no += 1;
                    if let Some(result) = parse_line(&self.line_buffer, self.current_line_no) {
                        return Some(result);
                    }
                }
                Err(_) => {
                    self.current_reader = None;
                    continue;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let req = parse_line("1.5,7,0,10,20,42", 1).unwrap().unwrap();
        assert_eq!(req.kid, 42);
        assert_eq!(req.size(), 30);
    }

    #[test]
    fn header_line_is_skipped() {
        assert!(parse_line("time,app_id,type,key_size,val_size,kid", 1).is_none());
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(parse_line("", 1).is_none());
        assert!(parse_line("# a comment", 2).is_none());
    }

    #[test]
    fn zero_size_request_is_malformed() {
        let err = parse_line("1.0,1,0,0,0,5", 3).unwrap().unwrap_err();
        assert!(matches!(err, TraceError::MalformedLine { .. }));
    }

    #[test]
    fn short_line_is_malformed() {
        let err = parse_line("1.0,1,0", 4).unwrap().unwrap_err();
        assert!(matches!(err, TraceError::MalformedLine { .. }));
    }
}
