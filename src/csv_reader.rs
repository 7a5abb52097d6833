// Delimited text reader for CSV and TSV inputs

use crate::error::{ChartError, Result};
use std::io::{self, Read};

/// Raw delimited data: header row plus string cells
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read CSV from stdin
pub fn read_csv_from_stdin() -> Result<CsvData> {
    read_delimited(io::stdin().lock(), b',')
}

pub fn read_csv<R: Read>(reader: R) -> Result<CsvData> {
    read_delimited(reader, b',')
}

pub fn read_tsv<R: Read>(reader: R) -> Result<CsvData> {
    read_delimited(reader, b'\t')
}

/// Read delimited text with a header row. Short rows are padded with empty
/// cells so every row lines up with the headers.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<CsvData> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| ChartError::InvalidData(format!("Failed to read header row: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ChartError::InvalidData(
            "Input must have a header row".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| {
            ChartError::InvalidData(format!("Failed to read row {}: {}", line + 1, e))
        })?;
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ChartError::InvalidData(
            "Input must contain at least one data row".to_string(),
        ));
    }

    Ok(CsvData { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv() {
        let data = read_csv("cat,val\na,10\nb,30\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["cat", "val"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[1], vec!["b", "30"]);
    }

    #[test]
    fn test_read_tsv() {
        let data = read_tsv("cat\tval\na\t1\n".as_bytes()).unwrap();
        assert_eq!(data.headers, vec!["cat", "val"]);
        assert_eq!(data.rows[0], vec!["a", "1"]);
    }

    #[test]
    fn test_short_rows_padded() {
        let data = read_csv("a,b,c\n1\n".as_bytes()).unwrap();
        assert_eq!(data.rows[0], vec!["1", "", ""]);
    }

    #[test]
    fn test_empty_body() {
        let res = read_csv("x,y\n".as_bytes());
        let err = res.unwrap_err().to_string();
        assert!(err.contains("at least one data row"));
    }
}
