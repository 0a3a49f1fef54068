//! CSV encoding of series tables.

use chrono::NaiveDate;
use csv_async::{AsyncReaderBuilder, AsyncWriter, StringRecord};
use futures::StreamExt;
use quiver_types::{Schema, SeriesRow, TimeSeries};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::TableError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Writes `series` as CSV with a header row.
///
/// Floats use their shortest round-trip representation, so reading the
/// table back yields identical values.
///
/// # Errors
///
/// Returns an error if writing fails.
pub async fn write_table<W>(series: &TimeSeries, writer: W) -> Result<(), TableError>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut out = AsyncWriter::from_writer(writer);
    out.write_record(series.schema().header()).await?;

    let has_volume = series.schema().has_volume;
    for row in series.rows() {
        let mut record = vec![
            row.date.format(DATE_FORMAT).to_string(),
            row.open.to_string(),
            row.high.to_string(),
            row.low.to_string(),
            row.close.to_string(),
        ];
        if has_volume {
            record.push(row.volume.map(|v| v.to_string()).unwrap_or_default());
        }
        record.extend(
            row.extra
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        out.write_record(&record).await?;
    }
    out.flush().await?;
    Ok(())
}

struct Columns {
    ohlc: [usize; 4],
    volume: Option<usize>,
    extra: Vec<usize>,
}

fn columns(header: &StringRecord) -> Result<(Schema, Columns), TableError> {
    let find = |name: &'static str| header.iter().position(|h| h == name);
    if find("date") != Some(0) {
        return Err(TableError::MissingColumn("date"));
    }
    let required = |name| find(name).ok_or(TableError::MissingColumn(name));
    let ohlc = [
        required("open")?,
        required("high")?,
        required("low")?,
        required("close")?,
    ];
    let volume = find("volume");
    let (extra, names): (Vec<usize>, Vec<String>) = header
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(i, _)| !ohlc.contains(i) && Some(*i) != volume)
        .map(|(i, name)| (i, name.to_string()))
        .unzip();
    let schema = Schema {
        has_volume: volume.is_some(),
        extra: names,
    };
    Ok((schema, Columns { ohlc, volume, extra }))
}

fn cell(
    record: &StringRecord,
    header: &StringRecord,
    line: u64,
    idx: usize,
) -> Result<Option<f64>, TableError> {
    let value = record.get(idx).unwrap_or("").trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| TableError::InvalidNumber {
            line,
            column: header.get(idx).unwrap_or("").to_string(),
            value: value.to_string(),
        })
}

/// Reads a CSV series table.
///
/// OHLC cells are coerced to floats and volume to an integer. Rows come
/// back sorted by date with duplicates collapsed.
///
/// # Errors
///
/// Returns an error if the header lacks a required column or a cell
/// cannot be parsed.
pub async fn read_table<R>(reader: R) -> Result<TimeSeries, TableError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut input = AsyncReaderBuilder::new().create_reader(reader);
    let header = input.headers().await?.clone();
    let (schema, cols) = columns(&header)?;

    let mut rows = Vec::new();
    let mut records = input.records();
    let mut line = 1;
    while let Some(record) = records.next().await {
        let record = record?;
        line += 1;
        let raw_date = record.get(0).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(raw_date.get(..10).unwrap_or(raw_date), DATE_FORMAT)
            .map_err(|_| TableError::InvalidDate {
                line,
                value: raw_date.to_string(),
            })?;

        let mut prices = [0.0; 4];
        for (slot, idx) in prices.iter_mut().zip(cols.ohlc) {
            *slot = cell(&record, &header, line, idx)?.ok_or_else(|| {
                TableError::InvalidNumber {
                    line,
                    column: header.get(idx).unwrap_or("").to_string(),
                    value: String::new(),
                }
            })?;
        }
        let [open, high, low, close] = prices;
        let mut row = SeriesRow::new(date, open, high, low, close);
        if let Some(idx) = cols.volume {
            row.volume = cell(&record, &header, line, idx)?.map(|v| v.max(0.0).round() as u64);
        }
        row.extra = cols
            .extra
            .iter()
            .map(|&idx| cell(&record, &header, line, idx))
            .collect::<Result<_, _>>()?;
        rows.push(row);
    }
    Ok(TimeSeries::from_rows(schema, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read_preserves_values() {
        let schema = Schema {
            has_volume: true,
            extra: vec!["adjusted close".into()],
        };
        let series = TimeSeries::from_rows(
            schema,
            vec![
                SeriesRow::new(d(2), 0.1 + 0.2, 1.0 / 3.0, 0.299_999, 0.3)
                    .with_volume(1_000_000)
                    .with_extra(vec![Some(0.31)]),
                SeriesRow::new(d(3), 1.5, 1.6, 1.4, 1.55).with_extra(vec![None]),
            ],
        );

        let mut buffer = Vec::new();
        write_table(&series, &mut buffer).await.unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("date,open,high,low,close,volume,adjusted close\n"));

        let back = read_table(buffer.as_slice()).await.unwrap();
        assert_eq!(back, series);
    }

    #[tokio::test]
    async fn test_read_coerces_volume_and_sorts() {
        let csv = "date,open,high,low,close,volume\n\
                   2024-01-03,2,2,2,2,150.0\n\
                   2024-01-02,1,1,1,1,100\n";
        let series = read_table(csv.as_bytes()).await.unwrap();
        assert_eq!(series.first_date(), Some(d(2)));
        assert_eq!(series.rows()[1].volume, Some(150));
    }

    #[tokio::test]
    async fn test_read_rejects_missing_column() {
        let csv = "date,open,high,close\n2024-01-02,1,1,1\n";
        assert!(matches!(
            read_table(csv.as_bytes()).await,
            Err(TableError::MissingColumn("low"))
        ));
    }

    #[tokio::test]
    async fn test_read_rejects_bad_number() {
        let csv = "date,open,high,low,close\n2024-01-02,1,x,1,1\n";
        assert!(matches!(
            read_table(csv.as_bytes()).await,
            Err(TableError::InvalidNumber { line: 2, .. })
        ));
    }
}
