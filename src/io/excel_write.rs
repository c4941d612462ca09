use std::path::Path;

use rust_xlsxwriter::{
    Color, ConditionalFormatText, ConditionalFormatTextRule, Format, Workbook, Worksheet,
};

use crate::error::Result;
use crate::report::{REPORT_COLUMNS, ReportRow};

/// Fill applied to cells in good standing.
const GREEN: Color = Color::RGB(0xB7E1CD);
/// Fill applied to cells needing attention.
const RED: Color = Color::RGB(0xE06666);

const COLUMN_WIDTH: f64 = 14.29;
const SHEET_NAME: &str = "registration";

/// Status and age-verified columns, highlighted on the `Current` marker.
const STATUS_COLUMNS: [u16; 2] = [3, 5];
/// Mismatch columns, highlighted on the `False` marker.
const MISMATCH_COLUMNS: [u16; 4] = [6, 7, 8, 9];

/// Writes the registration report to the given path.
pub fn write_registration(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col_idx, header) in REPORT_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, *header, &bold)?;
        worksheet.set_column_width(col_idx as u16, COLUMN_WIDTH)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (row_idx, row) in rows.iter().enumerate() {
        let r = (row_idx + 1) as u32;
        worksheet.write_string(r, 0, &row.last)?;
        worksheet.write_string(r, 1, &row.first)?;
        worksheet.write_number(r, 2, f64::from(row.age))?;
        worksheet.write_string(r, 3, status_label(row.membership_current))?;
        if let Some(usatf_id) = row.usatf_id {
            worksheet.write_number(r, 4, f64::from(usatf_id))?;
        }
        worksheet.write_string(r, 5, if row.age_verified { "Current" } else { "" })?;
        worksheet.write_string(r, 6, mismatch_label(row.last_mismatch))?;
        worksheet.write_string(r, 7, mismatch_label(row.first_mismatch))?;
        worksheet.write_string(r, 8, mismatch_label(row.dob_mismatch))?;
        worksheet.write_string(r, 9, mismatch_label(row.gender_mismatch))?;
    }

    if !rows.is_empty() {
        let last_row = rows.len() as u32;
        for col in STATUS_COLUMNS {
            add_text_highlight(worksheet, col, last_row, "Current")?;
        }
        for col in MISMATCH_COLUMNS {
            add_text_highlight(worksheet, col, last_row, "False")?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn add_text_highlight(
    worksheet: &mut Worksheet,
    col: u16,
    last_row: u32,
    marker: &str,
) -> Result<()> {
    let good = ConditionalFormatText::new()
        .set_rule(ConditionalFormatTextRule::Contains(marker.to_string()))
        .set_format(Format::new().set_background_color(GREEN));
    worksheet.add_conditional_format(1, col, last_row, col, &good)?;

    let bad = ConditionalFormatText::new()
        .set_rule(ConditionalFormatTextRule::DoesNotContain(marker.to_string()))
        .set_format(Format::new().set_background_color(RED));
    worksheet.add_conditional_format(1, col, last_row, col, &bad)?;
    Ok(())
}

fn status_label(membership_current: bool) -> &'static str {
    if membership_current { "Current" } else { "Not Assoc" }
}

fn mismatch_label(mismatch: bool) -> &'static str {
    if mismatch { "True" } else { "False" }
}
