//! Reader for the electoral service's per-district result workbooks.
//!
//! Each workbook holds one district: a preamble whose first column states
//! how many seats are at stake, then a table headed by a `Lista/Pacto`
//! column. A row with a label opens a pact; the rows under it carry that
//! pact's candidacies until the next label or a summary row.

use crate::formats::{FormatError, Result};
use crate::model::election::{Candidacy, District, Pact, SourceFile, Votes};
use crate::normalizers::group_into_lists;
use crate::util::hash_file;
use calamine::{open_workbook_auto, DataType, Range, Reader};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

const SUMMARY_PREFIXES: [&str; 5] = [
    "válidamente",
    "votos nulos",
    "votos en blanco",
    "total votación",
    "resultados preliminares",
];

lazy_static! {
    static ref SEATS_RX: Regex =
        Regex::new(r"(\d+)\s+(senadores|diputados)\s+a\s+elegir").unwrap();
    static ref NUMBER_RX: Regex = Regex::new(r"(\d+)").unwrap();
    static ref SENATE_RX: Regex =
        Regex::new(r"CIRCUNSCRIPCI[ÓO]N SENATORIAL\s*(\d+)").unwrap();
    static ref DISTRICT_RX: Regex = Regex::new(r"DISTRITO\s*(\d+)").unwrap();
    static ref CANDIDACY_RX: Regex = Regex::new(r"^(\d+)\s+(.*)$").unwrap();
}

/// Column positions in the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Columns {
    label: usize,
    candidacy: usize,
    party: Option<usize>,
    votes: usize,
    elected: Option<usize>,
}

/// A pact while its rows are still being read.
struct PactRows {
    code: String,
    name: String,
    declared_votes: Votes,
    declared_seats: Option<u32>,
    candidacies: Vec<Candidacy>,
}

impl PactRows {
    fn into_pact(self) -> Pact {
        let lists = group_into_lists(&self.code, self.candidacies);
        let mut pact = Pact::new(&self.code, &self.name, lists);
        pact.declared_votes = Some(self.declared_votes);
        pact.declared_seats = self.declared_seats;
        pact
    }
}

pub fn read_workbook(path: &Path) -> Result<District> {
    let mut workbook = open_workbook_auto(path)?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| FormatError::EmptyWorkbook(path.to_path_buf()))?;
    let sheet = workbook
        .worksheet_range(&first_sheet)
        .ok_or_else(|| FormatError::EmptyWorkbook(path.to_path_buf()))??;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut district = parse_sheet(&sheet, &file_name)?;
    district.source = Some(SourceFile {
        path: path.to_path_buf(),
        sha1: hash_file(path)?,
    });
    Ok(district)
}

/// Builds a district out of the first worksheet of a result workbook.
pub fn parse_sheet(sheet: &Range<DataType>, file_name: &str) -> Result<District> {
    let seats = extract_seats(sheet).ok_or_else(|| FormatError::MissingSeats(file_name.to_string()))?;
    let (id, label) = district_metadata(file_name);

    let mut rows = sheet.rows().enumerate();
    let columns = loop {
        match rows.next() {
            Some((_, row)) => {
                if let Some(columns) = header_columns(row) {
                    break columns;
                }
            }
            None => return Err(FormatError::MissingHeader(file_name.to_string())),
        }
    };

    let mut pacts: Vec<PactRows> = Vec::new();
    for (row_idx, row) in rows {
        let context = || format!("{} row {}", file_name, row_idx + 1);

        if let Some(label) = text(row.get(columns.label)) {
            if is_summary_row(label) {
                break;
            }
            let (code, name) = split_pact_label(label);
            pacts.push(PactRows {
                code,
                name,
                declared_votes: parse_count(row.get(columns.votes), &context)?,
                declared_seats: columns
                    .elected
                    .map(|col| parse_count(row.get(col), &context))
                    .transpose()?
                    .map(|seats| seats as u32),
                candidacies: Vec::new(),
            });
            continue;
        }

        let current = match pacts.last_mut() {
            Some(current) => current,
            // Still above the first pact.
            None => continue,
        };

        if let Some(raw) = text(row.get(columns.candidacy)) {
            let (number, name) = split_candidacy(raw);
            let mut candidacy = Candidacy::new(
                number,
                &name,
                columns.party.and_then(|col| text(row.get(col))),
                parse_count(row.get(columns.votes), &context)?,
            );
            candidacy.officially_elected = columns
                .elected
                .and_then(|col| text(row.get(col)))
                .map_or(false, |mark| mark.contains('✓'));
            current.candidacies.push(candidacy);
        }
    }

    Ok(District {
        id,
        label,
        seats,
        pacts: pacts.into_iter().map(PactRows::into_pact).collect(),
        source: None,
    })
}

fn text(cell: Option<&DataType>) -> Option<&str> {
    cell.and_then(|c| c.get_string())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn header_columns(row: &[DataType]) -> Option<Columns> {
    let find = |name: &str| {
        row.iter()
            .position(|cell| text(Some(cell)).map_or(false, |t| t.eq_ignore_ascii_case(name)))
    };

    let label = find("Lista/Pacto")?;
    Some(Columns {
        label,
        candidacy: label + 1,
        party: find("Partido"),
        votes: find("Votos")?,
        elected: find("Electos"),
    })
}

/// Seats at stake, from the preamble's first column.
///
/// An explicit "N senadores a elegir" line wins over any other number found
/// next to the words senadores or diputados.
fn extract_seats(sheet: &Range<DataType>) -> Option<u32> {
    let lines: Vec<String> = sheet
        .rows()
        .filter_map(|row| text(row.get(0)))
        .map(str::to_lowercase)
        .collect();

    lines
        .iter()
        .find_map(|line| SEATS_RX.captures(line).and_then(|caps| caps[1].parse().ok()))
        .or_else(|| {
            lines
                .iter()
                .filter(|line| line.contains("senadores") || line.contains("diputados"))
                .find_map(|line| NUMBER_RX.captures(line).and_then(|caps| caps[1].parse().ok()))
        })
}

/// District id and label from the workbook's file name.
pub fn district_metadata(file_name: &str) -> (String, String) {
    let upper = file_name.to_uppercase();
    if let Some(caps) = SENATE_RX.captures(&upper) {
        let id = caps[1].to_string();
        let label = format!("Circunscripción Senatorial {}", id);
        return (id, label);
    }
    if let Some(caps) = DISTRICT_RX.captures(&upper) {
        let id = caps[1].to_string();
        let label = format!("Distrito {}", id);
        return (id, label);
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    (stem.clone(), stem)
}

fn is_summary_row(label: &str) -> bool {
    let lower = label.trim().to_lowercase();
    SUMMARY_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// `"C - Unidad Por Chile"` → `("C", "Unidad Por Chile")`.
pub fn split_pact_label(label: &str) -> (String, String) {
    match label.split_once(" - ") {
        Some((code, name)) => (code.trim().to_string(), name.trim().to_string()),
        None => (label.trim().to_string(), label.trim().to_string()),
    }
}

/// `"12 Jane Doe"` → `(12, "Jane Doe")`; no number gives 0.
pub fn split_candidacy(raw: &str) -> (u32, String) {
    let raw = raw.trim();
    match CANDIDACY_RX.captures(raw) {
        Some(caps) => match caps[1].parse() {
            Ok(number) => (number, caps[2].trim().to_string()),
            Err(_) => (0, raw.to_string()),
        },
        None => (0, raw.to_string()),
    }
}

/// Vote or seat count from a numeric cell or digit text such as `"12.345"`.
fn parse_count<F: Fn() -> String>(cell: Option<&DataType>, context: &F) -> Result<Votes> {
    let malformed = |reason: String| FormatError::Malformed {
        context: context(),
        reason,
    };

    match cell {
        None | Some(DataType::Empty) => Ok(0),
        Some(DataType::Int(n)) if *n < 0 => Err(malformed(format!("negative count {}", n))),
        Some(DataType::Int(n)) => Ok(*n as Votes),
        Some(DataType::Float(f)) if f.is_nan() => Ok(0),
        Some(DataType::Float(f)) if *f < 0.0 => Err(malformed(format!("negative count {}", f))),
        Some(DataType::Float(f)) => Ok(f.trunc() as Votes),
        Some(DataType::String(s)) => {
            let s = s.trim();
            if s.starts_with('-') {
                return Err(malformed(format!("negative count {:?}", s)));
            }
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                return Ok(0);
            }
            digits
                .parse()
                .map_err(|_| malformed(format!("count out of range {:?}", s)))
        }
        Some(_) => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[DataType]]) -> Range<DataType> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(value: &str) -> DataType {
        DataType::String(value.to_string())
    }

    fn n(value: f64) -> DataType {
        DataType::Float(value)
    }

    const E: DataType = DataType::Empty;

    fn sample() -> Range<DataType> {
        sheet(&[
            &[s("Elección de Senadores 2025")],
            &[s("5 Senadores a elegir")],
            &[E],
            &[s("Lista/Pacto"), E, s("Partido"), s("Votos"), s("Porcentaje"), s("Candidatos"), s("Electos")],
            &[s("C - Unidad Por Chile"), E, E, s("103.000"), s("40,1 %"), n(3.0), n(2.0)],
            &[E, s("1 Ana Pérez"), s("PS"), n(60000.0), E, E, s("✓")],
            &[E, s("2 Luis Soto"), s("IND - PPD"), n(30000.0), E, E, E],
            &[E, s("3 Rosa Díaz"), s("IND"), n(13000.0), E, E, E],
            &[s("J - Cambio"), E, E, n(80000.0), E, n(1.0), n(1.0)],
            &[E, s("4 Pedro Ruiz"), s("REP"), n(80000.0), E, E, s("✓")],
            &[s("Válidamente Emitidos"), E, E, n(183000.0)],
            &[E, s("9 Nadie"), s("X"), n(1.0)],
        ])
    }

    #[test]
    fn test_parse_sheet() {
        let district = parse_sheet(&sample(), "Senadores CIRCUNSCRIPCIÓN SENATORIAL 7.xlsx").unwrap();

        assert_eq!(district.id, "7");
        assert_eq!(district.label, "Circunscripción Senatorial 7");
        assert_eq!(district.seats, 5);
        assert_eq!(district.pacts.len(), 2);

        let c = &district.pacts[0];
        assert_eq!((c.code.as_str(), c.name.as_str()), ("C", "Unidad Por Chile"));
        assert_eq!(c.declared_votes, Some(103000));
        assert_eq!(c.declared_seats, Some(2));
        assert_eq!(c.votes(), 103000);

        let codes: Vec<&str> = c.lists.iter().map(|l| l.id.code.as_str()).collect();
        assert_eq!(codes, vec!["PS", "PPD", "IND:Rosa Díaz"]);
        assert_eq!(c.lists[0].candidacies[0].number, 1);
        assert!(c.lists[0].candidacies[0].officially_elected);
        assert!(!c.lists[1].candidacies[0].officially_elected);

        // Rows past the summary line are ignored.
        assert_eq!(district.pacts[1].candidacy_count(), 1);
    }

    #[test]
    fn test_negative_votes_are_malformed() {
        let range = sheet(&[
            &[s("3 diputados a elegir")],
            &[s("Lista/Pacto"), E, s("Partido"), s("Votos")],
            &[s("C - Unidad"), E, E, n(10.0)],
            &[E, s("1 Ana"), s("PS"), DataType::Int(-4)],
        ]);
        assert!(matches!(
            parse_sheet(&range, "Distrito 3.xlsx"),
            Err(FormatError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_seats_and_header() {
        let range = sheet(&[&[s("Lista/Pacto"), E, s("Votos")]]);
        assert!(matches!(parse_sheet(&range, "x.xlsx"), Err(FormatError::MissingSeats(_))));

        let range = sheet(&[&[s("3 diputados a elegir")], &[s("nothing here")]]);
        assert!(matches!(parse_sheet(&range, "x.xlsx"), Err(FormatError::MissingHeader(_))));
    }

    #[test]
    fn test_district_metadata() {
        assert_eq!(
            district_metadata("Resultados DISTRITO 10.xlsx"),
            ("10".to_string(), "Distrito 10".to_string())
        );
        assert_eq!(
            district_metadata("circunscripción senatorial 3.xlsx"),
            ("3".to_string(), "Circunscripción Senatorial 3".to_string())
        );
        assert_eq!(
            district_metadata("Magallanes.xlsx"),
            ("Magallanes".to_string(), "Magallanes".to_string())
        );
    }

    #[test]
    fn test_label_helpers() {
        assert_eq!(
            split_pact_label("C - Unidad Por Chile"),
            ("C".to_string(), "Unidad Por Chile".to_string())
        );
        assert_eq!(split_pact_label("PDG"), ("PDG".to_string(), "PDG".to_string()));
        assert_eq!(split_candidacy("12 Jane Doe"), (12, "Jane Doe".to_string()));
        assert_eq!(split_candidacy("Jane Doe"), (0, "Jane Doe".to_string()));
        assert!(is_summary_row("  VOTOS NULOS"));
        assert!(!is_summary_row("C - Unidad"));
    }
}
