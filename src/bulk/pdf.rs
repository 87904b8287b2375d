use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::models::EmployeeExportRow;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const ROW_STEP: f32 = 7.0;
const BOTTOM_MARGIN: f32 = 15.0;

/// Render the export rows as a simple tabular PDF, one line per employee,
/// paginating onto fresh A4 pages as needed.
pub fn render(rows: &[EmployeeExportRow]) -> Result<Vec<u8>, String> {
    let (doc, page, layer) = PdfDocument::new(
        "Employee List",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| format!("PDF error: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| format!("PDF error: {e}"))?;

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text("Employee List", 18.0, Mm(78.0), Mm(280.0), &bold);

    let mut y = 266.0;
    let write_headers = |layer: &printpdf::PdfLayerReference, y: f32| {
        layer.use_text("Name", 11.0, Mm(15.0), Mm(y), &bold);
        layer.use_text("Email", 11.0, Mm(60.0), Mm(y), &bold);
        layer.use_text("Department", 11.0, Mm(125.0), Mm(y), &bold);
        layer.use_text("Salary", 11.0, Mm(170.0), Mm(y), &bold);
    };
    write_headers(&current, y);
    y -= ROW_STEP;

    for row in rows {
        if y < BOTTOM_MARGIN {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = 280.0;
            write_headers(&current, y);
            y -= ROW_STEP;
        }

        current.use_text(&row.name, 10.0, Mm(15.0), Mm(y), &regular);
        current.use_text(&row.email, 10.0, Mm(60.0), Mm(y), &regular);
        current.use_text(&row.department, 10.0, Mm(125.0), Mm(y), &regular);
        current.use_text(&row.salary, 10.0, Mm(170.0), Mm(y), &regular);
        y -= ROW_STEP;
    }

    doc.save_to_bytes().map_err(|e| format!("PDF error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_pdf_document() {
        let rows = vec![EmployeeExportRow {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            department: "Engineering".to_string(),
            salary: "5000".to_string(),
        }];
        let bytes = render(&rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn paginates_long_listings() {
        let rows: Vec<EmployeeExportRow> = (0..100)
            .map(|i| EmployeeExportRow {
                name: format!("Employee {i}"),
                email: format!("employee{i}@example.com"),
                department: "Engineering".to_string(),
                salary: "3000".to_string(),
            })
            .collect();
        let bytes = render(&rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 2000);
    }
}
