pub mod excel;
pub mod grid;
pub mod word;

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::error::AppError;
use crate::models::{CourseEntry, Weekday};
use crate::services::color::{ColorAssignment, ColorOverride, resolve_overrides};

pub use excel::ExcelRenderer;
pub use grid::{Cell, ScheduleGrid, TIME_BLOCKS, TimeBlock};
pub use word::WordRenderer;

pub const DEFAULT_TITLE: &str = "课程表";

/// Longest string a spreadsheet cell accepts.
pub const MAX_TEXT_CHARS: usize = 32_767;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Word,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Word => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Counter name in the usage statistics.
    pub fn stats_key(self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Word => "word",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub courses: Option<Vec<CourseEntry>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_selected_colors: Option<HashMap<String, ColorOverride>>,
}

/// Everything a renderer needs: the title, the bucketed grid and the colors
/// fixed for this job.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub title: String,
    pub grid: ScheduleGrid,
    pub colors: ColorAssignment,
}

impl ExportJob {
    pub fn prepare(request: ExportRequest) -> Result<Self, AppError> {
        let courses = request.courses.unwrap_or_default();
        if courses.is_empty() {
            return Err(AppError::Validation("没有课程数据可供导出".to_string()));
        }

        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        if title.chars().count() > MAX_TEXT_CHARS {
            return Err(AppError::Validation(format!(
                "标题不能超过{}个字符",
                MAX_TEXT_CHARS
            )));
        }

        let overrides = resolve_overrides(&request.user_selected_colors.unwrap_or_default())?;
        let grid = ScheduleGrid::new(courses);
        check_cell_lengths(&grid)?;
        let colors = ColorAssignment::build(grid.course_names(), &overrides);
        debug!(
            "prepared export {:?}: {} entries, {} colors",
            title,
            grid.entries().len(),
            colors.len()
        );

        Ok(Self {
            title,
            grid,
            colors,
        })
    }

    pub fn file_name(&self, format: ExportFormat) -> String {
        format!("{}.{}", self.title, format.extension())
    }
}

fn check_cell_lengths(grid: &ScheduleGrid) -> Result<(), AppError> {
    for block in TIME_BLOCKS {
        for period in block.periods() {
            for day in Weekday::ALL {
                let Some(cell) = grid.cell(day, period) else {
                    continue;
                };
                if cell.text().chars().count() > MAX_TEXT_CHARS {
                    return Err(AppError::Validation(format!(
                        "{}第{}节的课程内容超过{}个字符",
                        day.long_name(),
                        period,
                        MAX_TEXT_CHARS
                    )));
                }
            }
        }
    }
    Ok(())
}

pub trait Renderer {
    fn render(&self, job: &ExportJob) -> Result<Vec<u8>, ExportError>;
}

pub fn render(format: ExportFormat, job: &ExportJob) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Excel => ExcelRenderer::default().render(job),
        ExportFormat::Word => WordRenderer::default().render(job),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::color::{PALETTE, Rgb};
    use serde_json::json;

    fn request(value: serde_json::Value) -> ExportRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_prepare_rejects_empty_courses() {
        for body in [json!({}), json!({ "courses": [] }), json!({ "courses": null })] {
            assert!(matches!(
                ExportJob::prepare(request(body)),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_prepare_defaults_title() {
        let job = ExportJob::prepare(request(json!({
            "courses": [{ "课程名称": "语文", "星期": "周一", "节次": 1 }],
            "title": "   "
        })))
        .unwrap();

        assert_eq!(job.title, DEFAULT_TITLE);
        assert_eq!(job.file_name(ExportFormat::Excel), "课程表.xlsx");
        assert_eq!(job.file_name(ExportFormat::Word), "课程表.docx");
    }

    #[test]
    fn test_prepare_rejects_oversized_text() {
        let long_title = ExportJob::prepare(request(json!({
            "courses": [{ "课程名称": "语文", "星期": "周一", "节次": 1 }],
            "title": "课".repeat(40_000)
        })));
        assert!(matches!(long_title, Err(AppError::Validation(_))));

        let long_name = ExportJob::prepare(request(json!({
            "courses": [{ "课程名称": "x".repeat(MAX_TEXT_CHARS + 1), "星期": "周一", "节次": 1 }]
        })));
        assert!(matches!(long_name, Err(AppError::Validation(_))));

        let at_limit = ExportJob::prepare(request(json!({
            "courses": [{ "课程名称": "语文", "星期": "周一", "节次": 1 }],
            "title": "课".repeat(MAX_TEXT_CHARS)
        })));
        assert!(at_limit.is_ok());
    }

    #[test]
    fn test_prepare_rejects_bad_override() {
        let result = ExportJob::prepare(request(json!({
            "courses": [{ "课程名称": "语文", "星期": "周一", "节次": 1 }],
            "userSelectedColors": { "语文": "red" }
        })));

        assert!(matches!(result, Err(AppError::InvalidColorFormat(_))));
    }

    #[test]
    fn test_prepare_assigns_distinct_colors_per_job() {
        let job = ExportJob::prepare(request(json!({
            "courses": [
                { "课程名称": "History", "星期": "周一", "节次": 1 },
                { "课程名称": "History", "星期": "周二", "节次": 1 },
                { "课程名称": "Chemistry", "星期": "周三", "节次": 1 }
            ],
            "userSelectedColors": { "Art": [1, 2, 3] }
        })))
        .unwrap();

        assert_eq!(job.colors.get("History"), Some(PALETTE[1]));
        assert_eq!(job.colors.get("Chemistry"), Some(PALETTE[0]));
        assert_eq!(job.colors.get("Art"), None);
        assert_ne!(job.colors.get("History"), Some(Rgb::new(1, 2, 3)));
    }
}
