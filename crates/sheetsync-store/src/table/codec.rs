//! Comma-separated table-file encoding
//!
//! Standard quoting applies to cells containing commas, quotes or line
//! breaks. Rows may differ in length; no header handling happens here.

pub fn encode(rows: &[Vec<String>]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    reader
        .records()
        .map(|record| record.map(|r| r.iter().map(String::from).collect()))
        .collect()
}
