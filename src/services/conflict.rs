//! Double-booking detection over a set of course entries.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::{CourseEntry, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDimension {
    Teacher,
    Class,
}

/// Two or more entries sharing a teacher (or class) in the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub dimension: ConflictDimension,
    /// Teacher or class name. `None` when the class check ran without a
    /// class column and treated the whole collection as one class.
    pub subject: Option<String>,
    pub weekday: Weekday,
    pub period: u32,
    pub count: usize,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.dimension {
            ConflictDimension::Teacher => "教师",
            ConflictDimension::Class => "班级",
        };
        write!(
            f,
            "冲突：{}{}在{}{}节有{}门课程",
            label,
            self.subject.as_deref().unwrap_or_default(),
            self.weekday,
            self.period,
            self.count
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conflicts(Vec<Conflict>);

impl Conflicts {
    pub fn iter(&self) -> std::slice::Iter<'_, Conflict> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a Conflicts {
    type Item = &'a Conflict;
    type IntoIter = std::slice::Iter<'a, Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Conflicts {
    type Item = Conflict;
    type IntoIter = std::vec::IntoIter<Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Teacher conflicts first, then class conflicts, each in key order.
///
/// Entries without a usable weekday or period never take part. Teacher
/// grouping skips entries with no teacher (or the unspecified placeholder).
/// Class grouping uses the class column when any entry has one, otherwise
/// every entry is assumed to belong to the same class.
pub fn detect(entries: &[CourseEntry]) -> Conflicts {
    let mut conflicts = teacher_conflicts(entries);
    conflicts.extend(class_conflicts(entries));
    Conflicts(conflicts)
}

fn teacher_conflicts(entries: &[CourseEntry]) -> Vec<Conflict> {
    let groups = count_groups(entries.iter().filter_map(|e| {
        let (weekday, period) = e.slot()?;
        Some((e.assigned_teacher()?, weekday, period))
    }));

    groups
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((teacher, weekday, period), count)| Conflict {
            dimension: ConflictDimension::Teacher,
            subject: Some(teacher.to_string()),
            weekday,
            period,
            count,
        })
        .collect()
}

fn class_conflicts(entries: &[CourseEntry]) -> Vec<Conflict> {
    let has_class_column = entries.iter().any(|e| e.class_or_room.is_some());

    let groups = count_groups(entries.iter().filter_map(|e| {
        let (weekday, period) = e.slot()?;
        let class = if has_class_column {
            Some(e.class_or_room.as_deref()?)
        } else {
            None
        };
        Some((class, weekday, period))
    }));

    groups
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((class, weekday, period), count)| Conflict {
            dimension: ConflictDimension::Class,
            subject: class.map(str::to_string),
            weekday,
            period,
            count,
        })
        .collect()
}

fn count_groups<K: Ord>(keys: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut groups = BTreeMap::new();
    for key in keys {
        *groups.entry(key).or_insert(0) += 1;
    }
    groups
}
