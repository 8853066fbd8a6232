//! ZIP container for gallery downloads.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// One archive member.
#[derive(Debug, Clone, Copy)]
pub struct ZipEntry<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
    pub modified: DateTime<Utc>,
}

/// MS-DOS timestamp for `at`. Dates outside 1980..=2107 fall back to the
/// format's epoch.
fn dos_time(at: DateTime<Utc>) -> zip::DateTime {
    let year = u16::try_from(at.year()).unwrap_or(0);
    zip::DateTime::from_date_and_time(
        year,
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second() as u8,
    )
    .unwrap_or_default()
}

/// Pack entries in order. PNG data is already compressed, so entries are
/// stored rather than deflated.
pub fn build_zip<'a, I>(entries: I) -> Result<Vec<u8>, zip::result::ZipError>
where
    I: IntoIterator<Item = ZipEntry<'a>>,
{
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        writer.start_file(entry.name, options.last_modified_time(dos_time(entry.modified)))?;
        writer.write_all(entry.bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}
