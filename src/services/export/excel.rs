//! Timetable spreadsheet renderer.
//!
//! ```text
//! row 1   | title (merged A1:H1)                                  |
//! row 2   | 节次/星期 | 星期一 | 星期二 | ... | 星期日              |
//! row 3   | 上午 (merged)                                         |
//! row 4-7 | 第1节 .. 第4节, one cell per weekday                   |
//! row 8   | 下午 ...                                              |
//! row 13  | 晚自习 ...                                            |
//! ```

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook, Worksheet};

use super::grid::{CORNER_HEADER, TIME_BLOCKS, period_label};
use super::{ExportError, ExportJob, Renderer};
use crate::models::Weekday;
use crate::services::color::Rgb;

const COLUMN_COUNT: u16 = 8;
const HEADER_FILL: u32 = 0xCCCCCC;
const BLOCK_FILL: u32 = 0xE2E8F0;
const MAX_SHEET_NAME: usize = 31;

#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    pub period_column_width: f64,
    pub day_column_width: f64,
    pub block_row_height: f64,
    pub row_height: f64,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            period_column_width: 12.0,
            day_column_width: 15.0,
            block_row_height: 25.0,
            row_height: 40.0,
        }
    }
}

struct ExcelFormats {
    title: Format,
    header: Format,
    block: Format,
    period: Format,
}

impl ExcelFormats {
    fn new() -> Self {
        let centered = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        Self {
            title: centered.clone().set_bold().set_font_size(16),
            header: centered
                .clone()
                .set_bold()
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_pattern(FormatPattern::Solid),
            block: centered
                .clone()
                .set_bold()
                .set_background_color(Color::RGB(BLOCK_FILL))
                .set_pattern(FormatPattern::Solid),
            period: centered,
        }
    }

    fn course(color: Rgb) -> Format {
        Format::new()
            .set_text_wrap()
            .set_align(FormatAlign::VerticalCenter)
            .set_background_color(Color::RGB(color.to_u32()))
            .set_pattern(FormatPattern::Solid)
    }
}

impl Renderer for ExcelRenderer {
    fn render(&self, job: &ExportJob) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let formats = ExcelFormats::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(&job.title))?;

        sheet.merge_range(0, 0, 0, COLUMN_COUNT - 1, &job.title, &formats.title)?;
        self.write_header(sheet, &formats)?;

        let mut row: u32 = 2;
        for block in TIME_BLOCKS {
            sheet.merge_range(row, 0, row, COLUMN_COUNT - 1, block.label, &formats.block)?;
            sheet.set_row_height(row, self.block_row_height)?;
            row += 1;

            for period in block.periods() {
                sheet.write_string_with_format(row, 0, period_label(period), &formats.period)?;
                self.write_period(sheet, job, row, period)?;
                sheet.set_row_height(row, self.row_height)?;
                row += 1;
            }
        }

        sheet.set_row_height(0, self.row_height)?;
        sheet.set_row_height(1, self.row_height)?;
        sheet.set_column_width(0, self.period_column_width)?;
        for col in 1..COLUMN_COUNT {
            sheet.set_column_width(col, self.day_column_width)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

impl ExcelRenderer {
    fn write_header(&self, sheet: &mut Worksheet, formats: &ExcelFormats) -> Result<(), ExportError> {
        sheet.write_string_with_format(1, 0, CORNER_HEADER, &formats.header)?;
        for (col, day) in (1..).zip(Weekday::ALL) {
            sheet.write_string_with_format(1, col, day.long_name(), &formats.header)?;
        }
        Ok(())
    }

    fn write_period(
        &self,
        sheet: &mut Worksheet,
        job: &ExportJob,
        row: u32,
        period: u32,
    ) -> Result<(), ExportError> {
        for (col, day) in (1..).zip(Weekday::ALL) {
            let Some(cell) = job.grid.cell(day, period) else {
                continue;
            };
            let Some(lead) = cell.lead() else {
                continue;
            };
            let format = ExcelFormats::course(job.colors.color(&lead.name));
            sheet.write_string_with_format(row, col, cell.text(), &format)?;
        }
        Ok(())
    }
}

/// Excel caps sheet names at 31 characters and forbids `[]:*?/\`.
fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned.to_string()
    }
}
