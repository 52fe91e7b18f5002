use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::AsArray;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::model::{CapillaryCurve, CurvePoint};

// ---------------------------------------------------------------------------
// Column and row selection
// ---------------------------------------------------------------------------

/// How a curve field is located in the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Header name, matched case-insensitively after trimming.
    Name(String),
    /// Zero-based position, usually given as a spreadsheet letter ("A" = 0).
    Index(usize),
}

impl ColumnRef {
    /// Spreadsheet column letters to a zero-based index: "A" → 0, "AB" → 27.
    pub fn from_letters(letters: &str) -> Option<Self> {
        if letters.is_empty()
            || letters.len() > 3
            || !letters.bytes().all(|b| b.is_ascii_uppercase())
        {
            return None;
        }
        let n = letters
            .bytes()
            .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
        Some(ColumnRef::Index(n - 1))
    }

    /// Resolve against a header row.
    pub fn resolve(&self, headers: &[String]) -> Result<usize> {
        match self {
            ColumnRef::Name(name) => headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
                .with_context(|| format!("missing '{name}' column")),
            ColumnRef::Index(i) if *i < headers.len() => Ok(*i),
            ColumnRef::Index(_) => bail!(
                "column {} is out of range: table has {} column(s)",
                self,
                headers.len()
            ),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = std::convert::Infallible;

    /// Upper-case letters ("B", "AC") select by position, anything else by name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Ok(ColumnRef::from_letters(s).unwrap_or_else(|| ColumnRef::Name(s.to_string())))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => write!(f, "'{name}'"),
            ColumnRef::Index(i) => {
                let mut letters = Vec::new();
                let mut n = i + 1;
                while n > 0 {
                    let rem = (n - 1) % 26;
                    letters.push(b'A' + rem as u8);
                    n = (n - 1) / 26;
                }
                letters.reverse();
                write!(f, "{}", String::from_utf8_lossy(&letters))
            }
        }
    }
}

/// Which source columns hold the four curve fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub pressure: ColumnRef,
    pub pore_radius: ColumnRef,
    pub incremental_volume: ColumnRef,
    pub cumulative_volume: ColumnRef,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            pressure: ColumnRef::Name("pressure".into()),
            pore_radius: ColumnRef::Name("pore_radius".into()),
            incremental_volume: ColumnRef::Name("incremental_volume".into()),
            cumulative_volume: ColumnRef::Name("cumulative_volume".into()),
        }
    }
}

impl ColumnMap {
    fn resolve(&self, headers: &[String]) -> Result<[usize; 4]> {
        Ok([
            self.pressure.resolve(headers).context("pressure")?,
            self.pore_radius.resolve(headers).context("pore radius")?,
            self.incremental_volume
                .resolve(headers)
                .context("incremental volume")?,
            self.cumulative_volume
                .resolve(headers)
                .context("cumulative volume")?,
        ])
    }
}

/// 1-based inclusive window over data rows (the header is not counted).
///
/// Applied before the curve is built, so the last row of the window is the
/// row the total intruded volume is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowWindow {
    pub first: Option<usize>,
    pub last: Option<usize>,
}

impl RowWindow {
    pub fn apply<T>(&self, mut rows: Vec<T>) -> Result<Vec<T>> {
        let first = self.first.unwrap_or(1);
        if first == 0 {
            bail!("row numbers start at 1");
        }
        let mut last = match self.last {
            Some(last) if last < first => bail!("last row {last} is before first row {first}"),
            Some(last) => last,
            None => rows.len(),
        };
        if last > rows.len() {
            warn!("last row {last} is past the end of the data ({} rows)", rows.len());
            last = rows.len();
        }
        if first > last {
            return Ok(Vec::new());
        }
        rows.truncate(last);
        Ok(rows.split_off(first - 1))
    }
}

/// Everything the loader needs besides the path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub columns: ColumnMap,
    pub rows: RowWindow,
}

/// A loaded curve plus any sample metadata the file carried.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCurve {
    pub curve: CapillaryCurve,
    pub sample: Option<String>,
    pub porosity_percent: Option<f64>,
}

impl LoadedCurve {
    fn from_rows(rows: Vec<CurvePoint>, options: &LoadOptions) -> Result<Self> {
        Ok(Self {
            curve: CapillaryCurve::new(options.rows.apply(rows)?),
            sample: None,
            porosity_percent: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw MICP curve from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one measurement per row
/// * `.json`    – `[{ "pressure": .., ... }, ...]` or `{ "sample": .., "porosity": .., "points": [...] }`
/// * `.parquet` – one numeric column per field
///
/// Empty or non-numeric cells load as NaN; cleaning drops those rows later.
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<LoadedCurve> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "csv" => load_csv(path, options),
        "json" => load_json(path, options),
        "parquet" | "pq" => load_parquet(path, options),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!("loaded {} curve row(s) from {}", loaded.curve.len(), path.display());
    Ok(loaded)
}

fn parse_cell(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, options: &LoadOptions) -> Result<LoadedCurve> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    read_csv(reader, options)
}

/// Parse CSV from any reader; split out so tests can feed in-memory text.
pub fn read_csv<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    options: &LoadOptions,
) -> Result<LoadedCurve> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let [p, r, i, c] = options.columns.resolve(&headers)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).map(parse_cell).unwrap_or(f64::NAN);
        rows.push(CurvePoint::new(cell(p), cell(r), cell(i), cell(c)));
    }

    LoadedCurve::from_rows(rows, options)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Accepted shapes:
///
/// ```json
/// [ { "pressure": 10.0, "pore_radius": 20.0, "incremental_volume": 0.5, "cumulative_volume": 0.5 }, ... ]
/// ```
///
/// or the same record array under `"points"`, with optional `"sample"` and
/// `"porosity"` (percent) alongside.
fn load_json(path: &Path, options: &LoadOptions) -> Result<LoadedCurve> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text, options)
}

pub fn parse_json(text: &str, options: &LoadOptions) -> Result<LoadedCurve> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let (records, sample, porosity_percent) = match &root {
        JsonValue::Array(records) => (records, None, None),
        JsonValue::Object(obj) => {
            let records = obj
                .get("points")
                .and_then(|v| v.as_array())
                .context("Expected a 'points' array")?;
            let sample = obj.get("sample").and_then(|v| v.as_str()).map(str::to_string);
            let porosity = match obj.get("porosity") {
                None | Some(JsonValue::Null) => None,
                Some(v) => Some(v.as_f64().context("'porosity' is not a number")?),
            };
            (records, sample, porosity)
        }
        _ => bail!("Expected a JSON array or object at top level"),
    };

    let columns = &options.columns;
    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        rows.push(CurvePoint::new(
            json_field(obj, &columns.pressure, i)?,
            json_field(obj, &columns.pore_radius, i)?,
            json_field(obj, &columns.incremental_volume, i)?,
            json_field(obj, &columns.cumulative_volume, i)?,
        ));
    }

    let mut loaded = LoadedCurve::from_rows(rows, options)?;
    loaded.sample = sample;
    loaded.porosity_percent = porosity_percent;
    Ok(loaded)
}

fn json_field(obj: &Map<String, JsonValue>, column: &ColumnRef, row: usize) -> Result<f64> {
    let ColumnRef::Name(name) = column else {
        bail!("JSON records have no column order; select {column} by name");
    };
    let value = obj
        .iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(name.trim()))
        .map(|(_, v)| v)
        .with_context(|| format!("Row {row}: missing '{name}' field"))?;
    Ok(match value {
        JsonValue::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        JsonValue::String(s) => parse_cell(s),
        _ => f64::NAN,
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per curve field.
///
/// Any column castable to Float64 works (floats, ints, numeric strings).
/// Nulls load as NaN.
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<LoadedCurve> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let indices = options.columns.resolve(&headers)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let mut columns = Vec::with_capacity(indices.len());
        for &idx in &indices {
            let as_f64 = cast(batch.column(idx), &DataType::Float64)
                .with_context(|| format!("column '{}' is not numeric", headers[idx]))?;
            let values: Vec<f64> = as_f64
                .as_primitive_opt::<Float64Type>()
                .ok_or_else(|| anyhow!("column '{}' did not cast to Float64", headers[idx]))?
                .iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            columns.push(values);
        }
        for row in 0..batch.num_rows() {
            rows.push(CurvePoint::new(
                columns[0][row],
                columns[1][row],
                columns[2][row],
                columns[3][row],
            ));
        }
    }

    LoadedCurve::from_rows(rows, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_columns(columns: ColumnMap) -> LoadOptions {
        LoadOptions {
            columns,
            rows: RowWindow::default(),
        }
    }

    fn read(text: &str, options: &LoadOptions) -> Result<LoadedCurve> {
        read_csv(csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes()), options)
    }

    #[test]
    fn letters_map_to_indices() {
        assert_eq!(ColumnRef::from_letters("A"), Some(ColumnRef::Index(0)));
        assert_eq!(ColumnRef::from_letters("Z"), Some(ColumnRef::Index(25)));
        assert_eq!(ColumnRef::from_letters("AA"), Some(ColumnRef::Index(26)));
        assert_eq!(ColumnRef::from_letters("AB"), Some(ColumnRef::Index(27)));
        assert_eq!(ColumnRef::from_letters("ab"), None);
        assert_eq!(ColumnRef::Index(27).to_string(), "AB");
    }

    #[test]
    fn parse_prefers_letters_for_uppercase() {
        assert_eq!("C".parse::<ColumnRef>(), Ok(ColumnRef::Index(2)));
        assert_eq!(
            "Pressure (psia)".parse::<ColumnRef>(),
            Ok(ColumnRef::Name("Pressure (psia)".into()))
        );
    }

    #[test]
    fn csv_by_name_is_case_insensitive() {
        let text = "Pressure,Pore_Radius,Incremental_Volume,Cumulative_Volume\n\
                    10,20,0.5,0.5\n50,5,1.0,1.5\n";
        let loaded = read(text, &LoadOptions::default()).expect("load");
        assert_eq!(loaded.curve.len(), 2);
        assert_eq!(loaded.curve.points[1], CurvePoint::new(50.0, 5.0, 1.0, 1.5));
    }

    #[test]
    fn csv_by_letter_and_blank_cells() {
        let text = "id,p,r,inc,cum\nx,10,20,,0.5\ny,50,5,1.0,n/a\n";
        let columns = ColumnMap {
            pressure: ColumnRef::Index(1),
            pore_radius: ColumnRef::Index(2),
            incremental_volume: ColumnRef::Index(3),
            cumulative_volume: ColumnRef::Index(4),
        };
        let loaded = read(text, &with_columns(columns)).expect("load");
        assert!(loaded.curve.points[0].incremental_volume.is_nan());
        assert!(loaded.curve.points[1].cumulative_volume.is_nan());
        assert_eq!(loaded.curve.points[1].pressure, 50.0);
    }

    #[test]
    fn csv_missing_column_errors() {
        let text = "pressure,pore_radius,incremental_volume\n10,20,0.5\n";
        let err = read(text, &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("cumulative_volume"));
    }

    #[test]
    fn row_window_is_one_based_inclusive() {
        let rows: Vec<u32> = (1..=6).collect();
        let window = RowWindow {
            first: Some(2),
            last: Some(4),
        };
        assert_eq!(window.apply(rows.clone()).unwrap(), vec![2, 3, 4]);
        assert_eq!(RowWindow::default().apply(rows.clone()).unwrap(), rows);
        let past_end = RowWindow {
            first: Some(5),
            last: Some(99),
        };
        assert_eq!(past_end.apply(rows.clone()).unwrap(), vec![5, 6]);
        assert!(RowWindow { first: Some(0), last: None }.apply(rows.clone()).is_err());
        assert!(RowWindow { first: Some(4), last: Some(2) }.apply(rows).is_err());
    }

    #[test]
    fn open_ended_window_past_end_is_empty() {
        let rows: Vec<u32> = (1..=3).collect();
        let window = RowWindow {
            first: Some(7),
            last: None,
        };
        assert!(window.apply(rows).unwrap().is_empty());
        assert!(RowWindow::default().apply(Vec::<u32>::new()).unwrap().is_empty());
    }

    #[test]
    fn header_only_csv_loads_empty_curve() {
        let text = "pressure,pore_radius,incremental_volume,cumulative_volume\n";
        let loaded = read(text, &LoadOptions::default()).expect("load");
        assert!(loaded.curve.is_empty());
    }

    #[test]
    fn json_object_carries_sample_and_porosity() {
        let text = r#"{
            "sample": "Well-3 1204m",
            "porosity": 18.5,
            "points": [
                {"pressure": 10, "pore_radius": 20, "incremental_volume": 0.5, "cumulative_volume": 0.5},
                {"pressure": 50, "pore_radius": 5, "incremental_volume": null, "cumulative_volume": "1.5"}
            ]
        }"#;
        let loaded = parse_json(text, &LoadOptions::default()).expect("load");
        assert_eq!(loaded.sample.as_deref(), Some("Well-3 1204m"));
        assert_eq!(loaded.porosity_percent, Some(18.5));
        assert!(loaded.curve.points[1].incremental_volume.is_nan());
        assert_eq!(loaded.curve.points[1].cumulative_volume, 1.5);
    }

    #[test]
    fn json_rejects_letter_columns() {
        let text = r#"[{"pressure": 1, "pore_radius": 1, "incremental_volume": 1, "cumulative_volume": 1}]"#;
        let columns = ColumnMap {
            pressure: ColumnRef::Index(0),
            ..ColumnMap::default()
        };
        assert!(parse_json(text, &with_columns(columns)).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("curve.xlsx"), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
