//! CSV output of recovered credentials.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dictattack_core::CredentialStore;

use crate::error::Error;

pub const CSV_HEADER: &str = "user_name,hashed_password,plain_password";

/// Quotes a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn write_rows(path: &Path, store: &CredentialStore) -> std::io::Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", CSV_HEADER)?;

    let mut rows = 0;
    for (record, plain) in store.resolved() {
        writeln!(
            writer,
            "{},{},{}",
            csv_field(record.username()),
            csv_field(record.hashed_password()),
            csv_field(plain)
        )?;
        rows += 1;
    }

    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(rows)
}

/// Writes every resolved record of `store` to `path` and returns the row
/// count. The file is written to a temporary sibling first and renamed into
/// place, so a failed write never leaves a partial CSV behind.
pub fn write_results(path: &Path, store: &CredentialStore) -> Result<usize, Error> {
    let output_err = |source| Error::Output { path: path.to_path_buf(), source };

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(format!(".tmp.{}", std::process::id()));
    let temp_path = PathBuf::from(temp_name);

    let rows = match write_rows(&temp_path, store) {
        Ok(rows) => rows,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(output_err(e));
        }
    };

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(output_err(e));
    }

    Ok(rows)
}
