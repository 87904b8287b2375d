use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use serde_json::{Map, Value};

use crate::models::EmployeeExportRow;

const IMPORT_HEADERS: [(&str, &str); 6] = [
    ("Name", "name"),
    ("Email", "email"),
    ("Department", "department_id"),
    ("Salary", "salary"),
    ("Password", "password"),
    ("PasswordConfirm", "password_confirm"),
];

/// Render the export rows as an xlsx workbook.
pub fn render(rows: &[EmployeeExportRow]) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Employees")
        .map_err(|e| format!("Excel error: {e}"))?;

    let bold = Format::new().set_bold();
    for (col, header) in ["Name", "Email", "Department", "Salary"].iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| format!("Excel error: {e}"))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet
            .write_string(r, 0, row.name.as_str())
            .and_then(|s| s.write_string(r, 1, row.email.as_str()))
            .and_then(|s| s.write_string(r, 2, row.department.as_str()))
            .and_then(|s| s.write_string(r, 3, row.salary.as_str()))
            .map_err(|e| format!("Excel error: {e}"))?;
    }

    workbook
        .save_to_buffer()
        .map_err(|e| format!("Excel error: {e}"))
}

/// Parse an uploaded xlsx sheet into attribute maps ready for bulk insert.
///
/// The first row must carry the column headers; every header listed in
/// `IMPORT_HEADERS` is required. Fully empty rows are skipped.
pub fn parse_employee_sheet(bytes: &[u8]) -> Result<Vec<Map<String, Value>>, String> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| format!("Could not read Excel file: {e}"))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "Excel sheet is empty".to_string())?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Could not read Excel file: {e}"))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| "Excel sheet is empty".to_string())?;
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();

    let missing: Vec<&str> = IMPORT_HEADERS
        .iter()
        .filter(|(header, _)| !headers.iter().any(|h| h == header))
        .map(|(header, _)| *header)
        .collect();
    if !missing.is_empty() {
        return Err(format!("Missing required fields: {}", missing.join(", ")));
    }

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|cell| cell_text(cell).is_empty()) {
            continue;
        }

        let mut attrs = Map::new();
        for (header, attr) in IMPORT_HEADERS {
            let idx = headers.iter().position(|h| h == header).unwrap();
            let text = row.get(idx).map(cell_text).unwrap_or_default();
            attrs.insert(attr.to_string(), cell_value(&text, attr));
        }
        records.push(attrs);
    }

    if records.is_empty() {
        return Err("Excel sheet is empty".to_string());
    }

    let mismatched = records.iter().any(|attrs| {
        attrs.get("password").and_then(Value::as_str)
            != attrs.get("password_confirm").and_then(Value::as_str)
    });
    if mismatched {
        return Err("Password and PasswordConfirm must match for all employees".to_string());
    }

    Ok(records)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => format!("{i}"),
        Data::Bool(b) => format!("{b}"),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_value(text: &str, attr: &str) -> Value {
    if attr == "salary" {
        if let Ok(n) = text.parse::<f64>() {
            if let Some(num) = serde_json::Number::from_f64(n) {
                return Value::Number(num);
            }
        }
    }
    Value::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_sheet(rows: &[[&str; 6]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, (header, _)) in IMPORT_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (i, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                sheet
                    .write_string((i + 1) as u32, col as u16, *value)
                    .unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn parses_written_sheet() {
        let bytes = import_sheet(&[[
            "Ada",
            "ada@example.com",
            "0198c0de-0000-7000-8000-000000000001",
            "5000",
            "secret-pass",
            "secret-pass",
        ]]);
        let records = parse_employee_sheet(&bytes).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Ada");
        assert_eq!(records[0]["salary"], serde_json::json!(5000.0));
        assert_eq!(records[0]["password"], "secret-pass");
    }

    #[test]
    fn rejects_missing_headers() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "Email").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = parse_employee_sheet(&bytes).unwrap_err();
        assert!(err.starts_with("Missing required fields:"));
        assert!(err.contains("Salary"));
    }

    #[test]
    fn rejects_header_only_sheet() {
        let bytes = import_sheet(&[]);
        assert_eq!(parse_employee_sheet(&bytes).unwrap_err(), "Excel sheet is empty");
    }

    #[test]
    fn rejects_mismatched_password_pairs() {
        let bytes = import_sheet(&[[
            "Ada",
            "ada@example.com",
            "0198c0de-0000-7000-8000-000000000001",
            "5000",
            "secret-pass",
            "other-pass",
        ]]);
        let err = parse_employee_sheet(&bytes).unwrap_err();
        assert_eq!(err, "Password and PasswordConfirm must match for all employees");
    }
}
