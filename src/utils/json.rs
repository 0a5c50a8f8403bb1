use crate::utils::date::{format_date, parse_dump_date, DateFormat};
use crate::utils::error::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const INDENT: &[u8] = b"    ";

/// Recursively rebuild every object with its keys in sorted order.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn to_pretty_bytes<T: Serialize + ?Sized>(data: &T, sort: bool) -> Result<Vec<u8>> {
    let mut value = serde_json::to_value(data)?;
    if sort {
        value = sort_keys(value);
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// 以四格縮排寫出 JSON 檔案
pub fn make_json<T: Serialize + ?Sized>(outfile: &Path, data: &T, sort: bool) -> Result<()> {
    if let Some(parent) = outfile.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = to_pretty_bytes(data, sort)?;
    fs::write(outfile, bytes)?;
    Ok(())
}

pub fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let bytes = to_pretty_bytes(data, true)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Load a previously dumped JSON file together with its generation date
/// (`MM/DD/YYYY`).
///
/// The date comes from the `MMDDYY` stamp in the file name when there is
/// one, otherwise from the file's modification time.
pub fn load_dumped_json(path: &Path) -> Result<(String, Value)> {
    let stamped = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(parse_dump_date);

    let formatted_date = match stamped {
        Some(date) => format_date(date, DateFormat::Long),
        None => {
            let modified: DateTime<Local> = fs::metadata(path)?.modified()?.into();
            format_date(modified.date_naive(), DateFormat::Long)
        }
    };

    Ok((formatted_date, read_json(path)?))
}
