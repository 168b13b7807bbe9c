//! Table loader with encoding and delimiter detection.
//!
//! Reads a delimited text file into a [`Table`], keeping column order, record
//! order and enough of the on-disk layout ([`TableFormat`]) for
//! [`crate::writer`] to reproduce the file byte-for-byte.

use std::path::Path;

use crate::error::{FormatError, TableResult};
use crate::models::{LineEnding, Record, Table, TableFormat};

pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decoded text plus what was learned while decoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: String,
    pub bom: bool,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        // GB18030 is a superset of both; spreadsheet exports of Chinese rosters
        "gb2312" | "gbk" | "gb18030" => "gb18030".to_string(),
        "big5" => "big5".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode file bytes to text.
///
/// UTF-8 (with or without BOM) is taken as is; anything else goes through
/// charset detection, with GB18030 as the fallback.
pub fn decode_content(bytes: &[u8]) -> Result<Decoded, FormatError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        let text = std::str::from_utf8(rest)
            .map_err(|e| FormatError::Encoding(format!("invalid UTF-8 after BOM: {}", e)))?;
        return Ok(Decoded {
            text: text.to_string(),
            encoding: "utf-8".to_string(),
            bom: true,
        });
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Decoded {
            text: text.to_string(),
            encoding: "utf-8".to_string(),
            bom: false,
        });
    }

    let charset = detect_encoding(bytes);
    let detected = encoding_rs::Encoding::for_label(charset.as_bytes());

    // Detection is unreliable on short files; retry as GB18030 before giving up
    for encoding in detected.into_iter().chain(Some(encoding_rs::GB18030)) {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Ok(Decoded {
                text: text.into_owned(),
                encoding: encoding.name().to_lowercase(),
                bom: false,
            });
        }
    }

    Err(FormatError::Encoding(format!(
        "content is neither UTF-8 nor valid {} or GB18030",
        charset
    )))
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to a comma when the header has a single column.
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [b',', b';', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep as char).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Line ending of the first line.
pub fn detect_line_ending(content: &str) -> LineEnding {
    match content.find('\n') {
        Some(i) if i > 0 && content.as_bytes()[i - 1] == b'\r' => LineEnding::CrLf,
        _ => LineEnding::Lf,
    }
}

/// Load a table from `path`.
///
/// # Example
/// ```ignore
/// let table = roster::load_table("2025member.csv")?;
/// println!("{} players, {} columns", table.len(), table.headers().len());
/// ```
pub fn load_table<P: AsRef<Path>>(path: P) -> TableResult<Table> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(parse_bytes(&bytes)?)
}

/// Parse raw file bytes into a table.
pub fn parse_bytes(bytes: &[u8]) -> Result<Table, FormatError> {
    let decoded = decode_content(bytes)?;
    let format = TableFormat {
        delimiter: detect_delimiter(&decoded.text),
        line_ending: detect_line_ending(&decoded.text),
        bom: decoded.bom,
        encoding: decoded.encoding,
    };
    parse_with_format(&decoded.text, format)
}

/// Parse UTF-8 text into a table, detecting delimiter and line ending.
pub fn parse_str(content: &str) -> Result<Table, FormatError> {
    parse_bytes(content.as_bytes())
}

/// Parse text with an explicit format.
pub fn parse_with_format(content: &str, format: TableFormat) -> Result<Table, FormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(format.delimiter)
        .from_reader(content.as_bytes());

    let mut rows = reader.records();

    let header = rows
        .next()
        .ok_or(FormatError::MissingHeader)?
        .map_err(|e| FormatError::Malformed(e.to_string()))?;
    let headers: Vec<String> = header.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(FormatError::MissingHeader);
    }

    let mut records = Vec::new();
    for row in rows {
        let row = row.map_err(|e| FormatError::Malformed(e.to_string()))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        if row.len() != headers.len() {
            return Err(FormatError::FieldCount {
                line,
                expected: headers.len(),
                found: row.len(),
            });
        }
        records.push(Record::new(row.iter().map(str::to_string).collect(), line as usize));
    }

    Table::from_records(headers, records, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;

    #[test]
    fn test_simple_table() {
        let table = parse_str("姓名,水平,综合能力\n孟夜,职业,95\n杨林,极高,90\n").unwrap();

        assert_eq!(table.headers(), &["姓名", "水平", "综合能力"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "姓名"), Some("孟夜"));
        assert_eq!(table.value(1, "综合能力"), Some("90"));
        assert_eq!(table.format().line_ending, LineEnding::Lf);
    }

    #[test]
    fn test_emoji_and_empty_cells() {
        let table = parse_str("姓名,标签1,标签2,标签3\n庞博,🛡️防守专家,,\n").unwrap();
        assert_eq!(table.value(0, "标签1"), Some("🛡️防守专家"));
        assert_eq!(table.value(0, "标签3"), Some(""));
    }

    #[test]
    fn test_quoted_field_keeps_delimiter() {
        let table = parse_str("name,note\nAlice,\"fast, strong\"\n").unwrap();
        assert_eq!(table.value(0, "note"), Some("fast, strong"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = parse_str("a,b\n1,2\n\n3,4\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].line(), 4);
    }

    #[test]
    fn test_empty_input_is_missing_header() {
        assert_eq!(parse_str("").unwrap_err(), FormatError::MissingHeader);
    }

    #[test]
    fn test_short_row_rejected_with_line() {
        let err = parse_str("a,b,c\n1,2,3\n4,5\n").unwrap_err();
        assert_eq!(err, FormatError::FieldCount { line: 3, expected: 3, found: 2 });
    }

    #[test]
    fn test_long_row_rejected() {
        let err = parse_str("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, FormatError::FieldCount { found: 3, .. }));
    }

    #[test]
    fn test_crlf_detected() {
        let table = parse_str("a,b\r\n1,2\r\n").unwrap();
        assert_eq!(table.format().line_ending, LineEnding::CrLf);
        assert_eq!(table.value(0, "b"), Some("2"));
    }

    #[test]
    fn test_bom_stripped_and_remembered() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("姓名,水平\n孟夜,职业\n".as_bytes());
        let table = parse_bytes(&bytes).unwrap();
        assert!(table.format().bom);
        assert_eq!(table.headers()[0], "姓名");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
        assert_eq!(detect_delimiter("single"), b',');
    }

    #[test]
    fn test_semicolon_table() {
        let table = parse_str("a;b\n1;2\n").unwrap();
        assert_eq!(table.format().delimiter, b';');
        assert_eq!(table.value(0, "b"), Some("2"));
    }

    #[test]
    fn test_gb18030_roster_decoded() {
        let content = "\
姓名,水平,综合能力,主要位置,组别
孟夜,职业,97,中场,竞技组
杨林,极高,93,前锋,竞技组
荀洋,极高,92,前腰,竞技组
迟骋,高,86,边锋,休闲组
吕洋,高,84,后腰,竞技组
李长彬,中,78,中后卫,休闲组
黄朝阳,中,77,右前卫,休闲组
庞博,低,72,守门员,休闲组
王磊,低,74,右后卫,休闲组
";
        let (bytes, _, _) = encoding_rs::GB18030.encode(content);
        assert!(std::str::from_utf8(&bytes).is_err());

        let table = parse_bytes(&bytes).unwrap();
        assert_eq!(table.format().encoding, "gb18030");
        assert_eq!(table.headers()[0], "姓名");
        assert_eq!(table.value(0, "姓名"), Some("孟夜"));
        assert_eq!(table.value(7, "主要位置"), Some("守门员"));
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, TableError::Io(_)));
    }
}
