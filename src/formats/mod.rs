use crate::model::election::District;
use std::fs::read_dir;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod cl_servel;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Input directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("No Excel workbooks found in {0}")]
    NoWorkbooks(PathBuf),
    #[error("Workbook has no worksheets: {0}")]
    EmptyWorkbook(PathBuf),
    #[error("Could not determine the number of seats in {0}")]
    MissingSeats(String),
    #[error("No 'Lista/Pacto' header row in {0}")]
    MissingHeader(String),
    #[error("Malformed value in {context}: {reason}")]
    Malformed { context: String, reason: String },
}

pub type Result<T> = std::result::Result<T, FormatError>;

/// Districts read from a directory, plus the workbooks that failed.
#[derive(Debug, Default)]
pub struct LoadedDistricts {
    pub districts: Vec<District>,
    pub failures: Vec<(PathBuf, FormatError)>,
}

/// Reads every `.xlsx` result workbook in `dir`, in file name order.
///
/// A workbook that cannot be parsed is recorded in `failures` and the rest
/// are still loaded.
pub fn load_districts(dir: &Path) -> Result<LoadedDistricts> {
    if !dir.exists() {
        return Err(FormatError::MissingDirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in read_dir(dir)? {
        let path = entry?.path();
        if is_workbook(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(FormatError::NoWorkbooks(dir.to_path_buf()));
    }

    let mut loaded = LoadedDistricts::default();
    for path in paths {
        info!(path = %path.display(), "reading workbook");
        match cl_servel::read_workbook(&path) {
            Ok(district) => loaded.districts.push(district),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping workbook");
                loaded.failures.push((path, e));
            }
        }
    }

    Ok(loaded)
}

fn is_workbook(path: &Path) -> bool {
    let lock_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with("~$"));

    !lock_file
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("xlsx"))
}
