use super::SheetTable;

/// Reads delimited text into a table. The delimiter is sniffed from the header
/// line so `;`-separated exports with comma decimals are read correctly.
pub(crate) fn parse_delimited(text: &str) -> Result<SheetTable, csv::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(SheetTable::new(headers, rows))
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let count = |needle: char| header.matches(needle).count();

    [b'\t', b';', b',']
        .into_iter()
        .max_by_key(|delimiter| (count(*delimiter as char), *delimiter == b','))
        .filter(|delimiter| count(*delimiter as char) > 0)
        .unwrap_or(b',')
}
