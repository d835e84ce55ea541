//! Ticket ingestion from spreadsheet exports
//!
//! Accepts a JSON array or YAML list of row objects using the dataset's
//! column names:
//!
//! | column                               | meaning                        |
//! |--------------------------------------|--------------------------------|
//! | `ticketID`                           | ticket id                      |
//! | `systemName`                         | affected system                |
//! | `faultText`, `customerComplaint`     | folded into the problem text   |
//! | `dateFinished`, `timeFinished`       | resolution timestamp           |
//! | `solution{N}`                        | remedy at escalation level N   |
//! | `dateReceived{N}`, `timeReceived{N}` | when remedy N was proposed     |
//!
//! Bad dates become absent timestamps; rows without an id are skipped.

mod dates;

pub use dates::parse_timestamp;

use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::AssistError;
use crate::storage::{Solution, Ticket};

/// Escalation levels present in the dataset
pub const SOLUTION_LEVELS: [u32; 3] = [1, 2, 3];

/// Load tickets from a `.json`, `.yaml` or `.yml` file
pub fn load_tickets(path: &Path) -> Result<Vec<Ticket>, AssistError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AssistError::Ingest(format!("{}: {}", path.display(), e)))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let rows: Vec<Value> = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .map_err(|e| AssistError::Ingest(format!("{}: {}", path.display(), e)))?,
        _ => serde_json::from_str(&content)
            .map_err(|e| AssistError::Ingest(format!("{}: {}", path.display(), e)))?,
    };

    let tickets = tickets_from_rows(&rows)?;
    info!(rows = rows.len(), tickets = tickets.len(), path = %path.display(), "loaded tickets");
    Ok(tickets)
}

/// Convert row objects to tickets
///
/// Rows without an id are skipped; a repeated id keeps its first row.
pub fn tickets_from_rows(rows: &[Value]) -> Result<Vec<Ticket>, AssistError> {
    let mut seen = HashSet::new();
    let mut tickets = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let Value::Object(row) = row else {
            return Err(AssistError::Ingest(format!("row {} is not an object", i + 1)));
        };

        let Some(ticket) = ticket_from_row(row) else {
            warn!(row = i + 1, "skipping row without ticketID");
            continue;
        };
        if !seen.insert(ticket.id.clone()) {
            warn!(row = i + 1, ticket_id = %ticket.id, "skipping duplicate ticketID");
            continue;
        }
        tickets.push(ticket);
    }

    Ok(tickets)
}

fn ticket_from_row(row: &Map<String, Value>) -> Option<Ticket> {
    let id = cell_text(row.get("ticketID"))?;
    let system = cell_text(row.get("systemName")).unwrap_or_default();

    let problem_text = format!(
        "System: {}\nFault: {}\nCustomer complaint: {}",
        system,
        cell_text(row.get("faultText")).unwrap_or_default(),
        cell_text(row.get("customerComplaint")).unwrap_or_default(),
    );

    let solutions = SOLUTION_LEVELS
        .iter()
        .filter_map(|&level| {
            let text = cell_text(row.get(&format!("solution{}", level)))?;
            Some(Solution {
                level,
                text,
                proposed_at: parse_timestamp(
                    row.get(&format!("dateReceived{}", level)),
                    row.get(&format!("timeReceived{}", level)),
                ),
            })
        })
        .collect();

    Some(Ticket {
        id,
        system,
        problem_text,
        solutions,
        resolved_at: parse_timestamp(row.get("dateFinished"), row.get("timeFinished")),
    })
}

/// Cell as trimmed text; empty, null and NaN cells are absent
fn cell_text(cell: Option<&Value>) -> Option<String> {
    let text = match cell? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            // Spreadsheets hand out integral ids as floats (4711.0)
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_row() -> Value {
        json!({
            "ticketID": 4711,
            "systemName": "Label printer",
            "faultText": "E-04 paper jam",
            "customerComplaint": "Printer stops after two labels",
            "dateFinished": "2024-05-02",
            "timeFinished": "16:20:00",
            "solution1": "Open cover and remove jammed labels",
            "dateReceived1": "2024-05-01",
            "solution2": "Clean the sensor",
            "dateReceived2": "garbage",
            "solution3": null
        })
    }

    #[test]
    fn test_row_to_ticket() {
        let tickets = tickets_from_rows(&[sample_row()]).unwrap();
        assert_eq!(tickets.len(), 1);

        let t = &tickets[0];
        assert_eq!(t.id, "4711");
        assert_eq!(t.system, "Label printer");
        assert_eq!(
            t.problem_text,
            "System: Label printer\nFault: E-04 paper jam\nCustomer complaint: Printer stops after two labels"
        );
        assert!(t.resolved_at.is_some());
        assert_eq!(t.levels(), vec![1, 2]);
        assert!(t.solutions[0].proposed_at.is_some());
        // Malformed date degrades, never fails
        assert!(t.solutions[1].proposed_at.is_none());
    }

    #[test]
    fn test_float_id_and_missing_fields() {
        let rows = [json!({"ticketID": 12.0, "solution2": "Replace unit"})];
        let tickets = tickets_from_rows(&rows).unwrap();
        assert_eq!(tickets[0].id, "12");
        assert_eq!(tickets[0].system, "");
        assert_eq!(tickets[0].levels(), vec![2]);
        assert!(tickets[0].resolved_at.is_none());
    }

    #[test]
    fn test_rows_without_id_or_duplicates_are_skipped() {
        let rows = [
            json!({"ticketID": "A", "solution1": "first"}),
            json!({"systemName": "orphan"}),
            json!({"ticketID": "nan"}),
            json!({"ticketID": "A", "solution1": "second"}),
        ];
        let tickets = tickets_from_rows(&rows).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].solutions[0].text, "first");
    }

    #[test]
    fn test_non_object_row_is_error() {
        let err = tickets_from_rows(&[json!(["not", "a", "row"])]).unwrap_err();
        assert!(matches!(err, AssistError::Ingest(_)));
    }

    #[test]
    fn test_load_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tickets.yaml");
        std::fs::write(
            &path,
            "- ticketID: T-1\n  systemName: Router\n  solution1: Reboot\n  dateFinished: 03/15/2024\n",
        )
        .unwrap();

        let tickets = load_tickets(&path).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, "T-1");
        assert!(tickets[0].resolved_at.is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_tickets(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, AssistError::Ingest(_)));
    }
}
