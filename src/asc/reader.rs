//! ASC file loader.
//!
//! Loads an EyeLink ASC export from a file path, any buffered reader, or a
//! string. The loader only splits lines; interpreting them is the job of the
//! extractors.
//!
//! # Format
//!
//! ```text
//! ** CONVERTED FROM D:\rec.edf using edfapi 4.2.1 Aug 19 2020   <- header comment
//! MSG	7018000 DISPLAY_COORDS 0 0 1919 1079                       <- message
//! SAMPLES	GAZE	LEFT	RATE	 500.00	TRACKING	CR	FILTER	2     <- sample schema
//! 7018002	  512.3	  384.1	 1234.0	...                          <- sample row
//! ```
//!
//! # Error Handling
//!
//! Only I/O failures are errors. Bytes that are not valid UTF-8 are replaced
//! rather than rejected, since device exports occasionally carry stray
//! Latin-1 characters in free-text messages.
//!
//! # Example
//!
//! ```no_run
//! use ascbids::AscLog;
//!
//! let log = AscLog::parse("recording.asc")?;
//!
//! let log = AscLog::parse_str("MSG\t1000 TRIALID 1\n1002\t512.0\t384.0\t1000.0");
//! assert_eq!(log.len(), 2);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use super::AscLog;

impl AscLog {
    /// Load an ASC file from a filesystem path.
    ///
    /// Opens the file and delegates to [`parse_reader`](Self::parse_reader).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            fs::File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
        let reader = BufReader::new(file);

        Self::parse_reader(reader).with_context(|| format!("Failed to read ASC file: {:?}", path))
    }

    /// Load an ASC log from any buffered reader.
    ///
    /// Trailing `\n` and `\r\n` are stripped from every line. Empty lines are
    /// kept so that line positions match the source file.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the underlying source fails.
    pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        let mut line_num = 0usize;

        loop {
            buf.clear();
            line_num += 1;
            let read = reader
                .read_until(b'\n', &mut buf)
                .with_context(|| format!("Failed to read line {}", line_num))?;
            if read == 0 {
                break;
            }

            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }

            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }

        Ok(AscLog { lines })
    }

    /// Load an ASC log from a string. Splits lines the same way
    /// [`parse_reader`](Self::parse_reader) does.
    pub fn parse_str(content: &str) -> Self {
        AscLog {
            lines: content.lines().map(str::to_string).collect(),
        }
    }
}
