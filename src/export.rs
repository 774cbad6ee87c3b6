use crate::error::{ExportError, Result};
pub use crate::log_info;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub fn join_field(values: &[String], sep: &str) -> String {
    values.join(sep)
}

pub fn split_field(field: &str, sep: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field.split(sep).map(str::to_string).collect()
}

// Checkpoint files sit next to the terminal output file.
pub fn checkpoint_path(output: &Path, page: usize) -> PathBuf {
    let name = format!("progress_page_{}.csv", page);
    match output.parent() {
        Some(parent) if parent != Path::new("") => parent.join(name),
        _ => PathBuf::from(name),
    }
}

pub fn write_csv<P, I>(path: P, headers: &[&str], rows: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Vec<String>>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if parent != Path::new("") {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    writer.write_record(headers).map_err(ExportError::Csv)?;

    let mut count = 0;
    for row in rows {
        writer.write_record(&row).map_err(ExportError::Csv)?;
        count += 1;
    }

    writer.flush().map_err(|e| ExportError::Csv(e.into()))?;
    log_info!("[export] Wrote {} records to {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_and_split_round_trip() {
        let values = vec![
            "Professor".to_string(),
            "Department Head".to_string(),
            "Graduate Chair".to_string(),
        ];
        for sep in ["; ", " | "] {
            let joined = join_field(&values, sep);
            assert_eq!(split_field(&joined, sep), values);
        }
        assert_eq!(split_field("", "; "), Vec::<String>::new());
    }

    #[test]
    fn csv_round_trips_list_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let interests = vec!["graph theory".to_string(), "optimization".to_string()];
        let rows = vec![vec![
            "Jane Doe".to_string(),
            join_field(&interests, "; "),
        ]];

        let written = write_csv(&path, &["name", "research_interests"], rows).unwrap();
        assert_eq!(written, 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["name", "research_interests"])
        );
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "Jane Doe");
        assert_eq!(split_field(&record[1], "; "), interests);
    }

    #[test]
    fn header_only_file_for_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        let written = write_csv(&path, &["Name", "Designation"], Vec::new()).unwrap();
        assert_eq!(written, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "Name,Designation");
    }

    #[test]
    fn checkpoint_paths_follow_output_location() {
        assert_eq!(
            checkpoint_path(Path::new("final_results.csv"), 5),
            PathBuf::from("progress_page_5.csv")
        );
        assert_eq!(
            checkpoint_path(Path::new("out/final_results.csv"), 10),
            PathBuf::from("out/progress_page_10.csv")
        );
    }
}
