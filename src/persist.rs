use std::fmt::Display;
use std::io::{BufRead, Read, Write};
use std::str::FromStr;
use log::warn;
use crate::account::AccountRecord;
use crate::error::Error;




/**
 * Iterator over the records of a line-oriented text stream. Blank lines are
 * ignored, malformed lines are logged and skipped so that one bad row does
 * not make the rest of the file unavailable, and an I/O error is yielded once
 * before the iterator fuses.
 */
pub struct Records<R, T> {
    lines: std::io::Lines<R>,
    line_number: usize,
    failed: bool,
    record: std::marker::PhantomData<T>,
}

impl<R: BufRead, T: FromStr<Err = Error>> Iterator for Records<R, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None
        }
        for line in &mut self.lines {
            self.line_number += 1;

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()))
                }
            };
            if line.trim().is_empty() {
                continue
            }
            match line.parse() {
                Ok(record) => return Some(Ok(record)),
                Err(e) => warn!("skipping {}", e.at_line(self.line_number)),
            }
        }
        None
    }
}




/**
 * Return an iterator over the records parsed from a reader, one per line.
 */
pub fn read_records<R: BufRead, T: FromStr<Err = Error>>(reader: R) -> Records<R, T> {
    Records {
        lines: reader.lines(),
        line_number: 0,
        failed: false,
        record: std::marker::PhantomData,
    }
}




/**
 * Write each record on its own line, in the order given.
 */
pub fn write_records<W, T, I>(mut writer: W, records: I) -> Result<(), Error>
where
    W: Write,
    T: Display,
    I: IntoIterator<Item = T>,
{
    for record in records {
        writeln!(writer, "{}", record)?;
    }
    writer.flush()?;
    Ok(())
}




/**
 * Encode an ascending sequence of account records as a CBOR array.
 */
pub fn write_snapshot<W, I>(mut writer: W, records: I) -> Result<(), Error>
where
    W: Write,
    I: IntoIterator<Item = AccountRecord>,
{
    let records: Vec<_> = records.into_iter().collect();
    ciborium::ser::into_writer(&records, &mut writer).map_err(|e| Error::Snapshot(e.to_string()))?;
    writer.flush()?;
    Ok(())
}




/**
 * Decode a CBOR array of account records written by `write_snapshot`.
 */
pub fn read_snapshot<R: Read>(reader: R) -> Result<Vec<AccountRecord>, Error> {
    ciborium::de::from_reader(reader).map_err(|e| Error::Snapshot(e.to_string()))
}




/**
 * Parse a decimal amount field. Only finite values are accepted: `NaN`,
 * `inf` and out-of-range literals such as `1e400` are rejected.
 */
pub fn parse_decimal(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|amount| amount.is_finite())
}




/**
 * Return true if the string can be stored as one field of a whitespace
 * separated record: non-empty and free of whitespace.
 */
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}




/**
 * Return a fresh path in the system temporary directory, unique to this
 * process and the given name. Any file left at that path is removed. For
 * testing purposes.
 */
#[cfg(test)]
pub(crate) fn scratch_path(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("ledgertree-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_dir(&path);
    path
}
