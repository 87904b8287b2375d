use crate::models::EmployeeExportRow;

/// Render the export rows as a CSV document.
pub fn render(rows: &[EmployeeExportRow]) -> String {
    let mut out = String::from("Name,Email,Department,Salary\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{}\n",
            csv_escape(&row.name),
            csv_escape(&row.email),
            csv_escape(&row.department),
            csv_escape(&row.salary),
        ));
    }
    out
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, email: &str, department: &str, salary: &str) -> EmployeeExportRow {
        EmployeeExportRow {
            name: name.to_string(),
            email: email.to_string(),
            department: department.to_string(),
            salary: salary.to_string(),
        }
    }

    #[test]
    fn renders_header_and_rows() {
        let csv = render(&[row("Ada", "ada@example.com", "Engineering", "5000")]);
        assert_eq!(
            csv,
            "Name,Email,Department,Salary\nAda,ada@example.com,Engineering,5000\n"
        );
    }

    #[test]
    fn escapes_commas_and_quotes() {
        let csv = render(&[row("Smith, Jane", "j@example.com", "R\"D", "1200.50")]);
        assert!(csv.contains("\"Smith, Jane\""));
        assert!(csv.contains("\"R\"\"D\""));
    }

    #[test]
    fn empty_input_renders_header_only() {
        assert_eq!(render(&[]), "Name,Email,Department,Salary\n");
    }
}
