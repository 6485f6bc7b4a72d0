use super::Delimiter;
use crate::scoring::record::field_key;
use crate::scoring::{RawRecord, RawValue};
use std::io::Read;

pub(crate) fn parse_records<R: Read>(
    mut reader: R,
    delimiter: Delimiter,
) -> Result<Vec<RawRecord>, super::IngestError> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.resolve(&buffer))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(buffer.as_slice());

    let headers: Vec<String> = csv_reader
        .byte_headers()?
        .iter()
        .map(|header| field_key(&String::from_utf8_lossy(header)))
        .collect();

    let mut records = Vec::new();
    for row in csv_reader.byte_records() {
        let row = row?;
        let mut record = RawRecord::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            record.insert(header, cell_value(cell));
        }
        records.push(record);
    }

    Ok(records)
}

fn cell_value(cell: &[u8]) -> RawValue {
    if cell.is_empty() {
        RawValue::Missing
    } else {
        RawValue::Text(String::from_utf8_lossy(cell).into_owned())
    }
}

/// Tab when the header line contains one, comma otherwise.
pub(crate) fn sniff_delimiter(buffer: &[u8]) -> u8 {
    let header = buffer
        .split(|byte| *byte == b'\n')
        .next()
        .unwrap_or_default();
    if header.contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}
