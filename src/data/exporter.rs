use anyhow::{anyhow, Result};
use chrono::Local;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::data::columns::ColumnSpec;
use crate::data::record::Record;

/// Writes record collections out as CSV or JSON files. Export always works
/// on raw field values, so badge renderers never leak into exported data,
/// and exporting a filtered view exports exactly the rows it shows.
pub struct Exporter;

impl Exporter {
    /// Export records to a timestamped CSV file next to the working
    /// directory, returning the created path.
    pub fn to_csv_file(records: &[&Record], columns: &[ColumnSpec], stem: &str) -> Result<PathBuf> {
        if records.is_empty() {
            return Err(anyhow!("No data to export"));
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = PathBuf::from(format!("{}_{}.csv", stem, timestamp));
        Self::write_csv(records, columns, &path)?;
        Ok(path)
    }

    pub fn write_csv(records: &[&Record], columns: &[ColumnSpec], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(columns.iter().map(|c| c.key.as_str()))?;
        for record in records {
            writer.write_record(columns.iter().map(|c| record.coerce(&c.key)))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export records to a timestamped pretty-printed JSON file, one object
    /// per record restricted to the view's columns.
    pub fn to_json_file(
        records: &[&Record],
        columns: &[ColumnSpec],
        stem: &str,
    ) -> Result<PathBuf> {
        if records.is_empty() {
            return Err(anyhow!("No data to export"));
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = PathBuf::from(format!("{}_{}.json", stem, timestamp));
        Self::write_json(records, columns, &path)?;
        Ok(path)
    }

    pub fn write_json(records: &[&Record], columns: &[ColumnSpec], path: &Path) -> Result<()> {
        let rows: Vec<JsonValue> = records
            .iter()
            .map(|record| {
                let mut obj = serde_json::Map::new();
                for col in columns {
                    obj.insert(col.key.clone(), record.get(&col.key).to_json());
                }
                JsonValue::Object(obj)
            })
            .collect();

        let mut file = File::create(path)?;
        serde_json::to_writer_pretty(&mut file, &rows)?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::FieldValue;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("u_id", "ID"),
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("note", "Note"),
        ]
    }

    #[test]
    fn test_csv_escapes_special_characters() {
        let record = Record::new()
            .with_field("u_id", "S_001")
            .with_field("name", "Rao, Asha")
            .with_field("note", "said \"hello\"\nthen left");
        let records = vec![&record];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        Exporter::write_csv(&records, &columns(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "Rao, Asha");
        assert_eq!(&row[2], "said \"hello\"\nthen left");
    }

    #[test]
    fn test_json_round_trips_raw_values() {
        let record = Record::new()
            .with_field("u_id", "S_001")
            .with_field("name", "Asha");
        let records = vec![&record];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        Exporter::write_json(&records, &columns(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["u_id"], "S_001");
        // missing column exports as null, mirroring the absent-field rule
        assert!(rows[0]["note"].is_null());

        let back = Record::from_json(&rows[0]).unwrap();
        assert_eq!(back.get("name"), &FieldValue::Str("Asha".into()));
    }

    #[test]
    fn test_empty_export_is_an_error() {
        let records: Vec<&Record> = Vec::new();
        assert!(Exporter::to_csv_file(&records, &columns(), "report").is_err());
    }
}
