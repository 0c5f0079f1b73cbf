use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::models::{CourseEntry, Weekday};

pub const CORNER_HEADER: &str = "节次/星期";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBlock {
    pub label: &'static str,
    pub first_period: u32,
    pub period_count: u32,
}

impl TimeBlock {
    pub fn periods(&self) -> RangeInclusive<u32> {
        self.first_period..=self.first_period + self.period_count - 1
    }
}

pub const TIME_BLOCKS: [TimeBlock; 3] = [
    TimeBlock {
        label: "上午",
        first_period: 1,
        period_count: 4,
    },
    TimeBlock {
        label: "下午",
        first_period: 5,
        period_count: 4,
    },
    TimeBlock {
        label: "晚自习",
        first_period: 9,
        period_count: 4,
    },
];

pub fn period_label(period: u32) -> String {
    format!("第{}节", period)
}

/// Entries bucketed by `(weekday, period)`, each bucket in input order.
#[derive(Debug, Clone, Default)]
pub struct ScheduleGrid {
    entries: Vec<CourseEntry>,
    cells: HashMap<(Weekday, u32), Vec<usize>>,
}

impl ScheduleGrid {
    pub fn new(entries: Vec<CourseEntry>) -> Self {
        let mut cells: HashMap<(Weekday, u32), Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if let Some(slot) = entry.slot() {
                cells.entry(slot).or_default().push(idx);
            }
        }
        Self { entries, cells }
    }

    pub fn entries(&self) -> &[CourseEntry] {
        &self.entries
    }

    pub fn cell(&self, weekday: Weekday, period: u32) -> Option<Cell<'_>> {
        let indexes = self.cells.get(&(weekday, period))?;
        Some(Cell {
            entries: indexes.iter().map(|&i| &self.entries[i]).collect(),
        })
    }

    /// Course names in first-appearance order, duplicates included.
    pub fn course_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Cell<'a> {
    pub entries: Vec<&'a CourseEntry>,
}

impl Cell<'_> {
    /// The entry whose color fills the cell.
    pub fn lead(&self) -> Option<&CourseEntry> {
        self.entries.first().copied()
    }

    pub fn text(&self) -> String {
        self.entries
            .iter()
            .map(|e| entry_text(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn entry_text(entry: &CourseEntry) -> String {
    let mut text = entry.name.clone();
    if let Some(teacher) = entry.assigned_teacher() {
        text.push_str(&format!("\n教师：{}", teacher));
    }
    if let Some(location) = entry.assigned_location() {
        text.push_str(&format!("\n地点：{}", location));
    }
    if let (Some(start), Some(end)) = (&entry.start_time, &entry.end_time) {
        text.push_str(&format!("\n时间：{}~{}", start, end));
    }
    if let Some(notes) = &entry.notes {
        text.push_str(&format!("\n备注：{}", notes));
    }
    text
}
