use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::AppError;

/// Placeholder the front-end writes into teacher/location when nothing was picked.
pub const UNSPECIFIED: &str = "未指定";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Token stored on entries and used in conflict messages (`周一`).
    pub fn short_name(self) -> &'static str {
        match self {
            Weekday::Mon => "周一",
            Weekday::Tue => "周二",
            Weekday::Wed => "周三",
            Weekday::Thu => "周四",
            Weekday::Fri => "周五",
            Weekday::Sat => "周六",
            Weekday::Sun => "周日",
        }
    }

    /// Column header used by the exporters (`星期一`).
    pub fn long_name(self) -> &'static str {
        match self {
            Weekday::Mon => "星期一",
            Weekday::Tue => "星期二",
            Weekday::Wed => "星期三",
            Weekday::Thu => "星期四",
            Weekday::Fri => "星期五",
            Weekday::Sat => "星期六",
            Weekday::Sun => "星期日",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(day) = Self::ALL
            .into_iter()
            .find(|d| d.short_name() == token || d.long_name() == token)
        {
            return Some(day);
        }

        match token.to_ascii_lowercase().as_str() {
            "mon" | "monday" => Some(Weekday::Mon),
            "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
            "wed" | "wednesday" => Some(Weekday::Wed),
            "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
            "fri" | "friday" => Some(Weekday::Fri),
            "sat" | "saturday" => Some(Weekday::Sat),
            "sun" | "sunday" => Some(Weekday::Sun),
            // 星期天 / 周天 are common spoken variants of Sunday
            "星期天" | "周天" => Some(Weekday::Sun),
            _ => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_name())
    }
}

/// One row of the timetable as submitted by the front-end.
///
/// Deserialization is lenient: unknown weekdays and malformed periods become
/// `None` so that conflict checks and exports can skip them instead of
/// rejecting the whole request. Ingestion runs [`CourseEntry::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseEntry {
    #[serde(rename = "课程名称", default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(
        rename = "教师",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub teacher: Option<String>,
    #[serde(
        rename = "星期",
        default,
        deserialize_with = "lenient_weekday",
        skip_serializing_if = "Option::is_none"
    )]
    pub weekday: Option<Weekday>,
    #[serde(
        rename = "节次",
        default,
        deserialize_with = "lenient_period",
        skip_serializing_if = "Option::is_none"
    )]
    pub period: Option<u32>,
    #[serde(
        rename = "地点",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(
        rename = "班级",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_or_room: Option<String>,
    #[serde(
        rename = "备注",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    #[serde(
        rename = "开始时间",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,
    #[serde(
        rename = "结束时间",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<String>,
}

impl CourseEntry {
    pub fn new(name: impl Into<String>, weekday: Weekday, period: u32) -> Self {
        Self {
            name: name.into(),
            weekday: Some(weekday),
            period: Some(period),
            ..Self::default()
        }
    }

    pub fn with_teacher(mut self, teacher: impl Into<String>) -> Self {
        self.teacher = Some(teacher.into());
        self
    }

    pub fn with_class(mut self, class_or_room: impl Into<String>) -> Self {
        self.class_or_room = Some(class_or_room.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// `(weekday, period)` when both are usable.
    pub fn slot(&self) -> Option<(Weekday, u32)> {
        Some((self.weekday?, self.period?))
    }

    /// Teacher name, ignoring the unspecified placeholder.
    pub fn assigned_teacher(&self) -> Option<&str> {
        specified(self.teacher.as_deref())
    }

    pub fn assigned_location(&self) -> Option<&str> {
        specified(self.location.as_deref())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("课程名称不能为空".to_string()));
        }
        if self.weekday.is_none() {
            return Err(AppError::Validation("星期无效或缺失".to_string()));
        }
        if self.period.is_none() {
            return Err(AppError::Validation("节次必须是大于0的整数".to_string()));
        }
        Ok(())
    }
}

fn specified(value: Option<&str>) -> Option<&str> {
    value.filter(|v| *v != UNSPECIFIED)
}

fn text_of(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(text_of))
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_weekday<'de, D>(deserializer: D) -> Result<Option<Weekday>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(text_of)
        .and_then(|token| Weekday::parse(&token)))
}

fn lenient_period<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let period = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(period
        .filter(|p| *p >= 1)
        .and_then(|p| u32::try_from(p).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_entry() {
        let entry: CourseEntry = serde_json::from_value(json!({
            "课程名称": "语文",
            "教师": "张三",
            "星期": "周一",
            "节次": 1,
            "地点": "101教室",
            "班级": "三年级二班",
            "备注": "带课本",
            "开始时间": "08:00",
            "结束时间": "08:45"
        }))
        .unwrap();

        assert_eq!(entry.name, "语文");
        assert_eq!(entry.teacher.as_deref(), Some("张三"));
        assert_eq!(entry.slot(), Some((Weekday::Mon, 1)));
        assert_eq!(entry.class_or_room.as_deref(), Some("三年级二班"));
        assert_eq!(entry.start_time.as_deref(), Some("08:00"));
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_weekday_aliases() {
        assert_eq!(Weekday::parse("Mon"), Some(Weekday::Mon));
        assert_eq!(Weekday::parse("friday"), Some(Weekday::Fri));
        assert_eq!(Weekday::parse("星期三"), Some(Weekday::Wed));
        assert_eq!(Weekday::parse("周日"), Some(Weekday::Sun));
        assert_eq!(Weekday::parse("星期天"), Some(Weekday::Sun));
        assert_eq!(Weekday::parse("someday"), None);
    }

    #[test]
    fn test_period_accepts_numeric_strings_and_rejects_garbage() {
        let parse = |v: Value| -> Option<u32> {
            serde_json::from_value::<CourseEntry>(json!({ "节次": v }))
                .unwrap()
                .period
        };

        assert_eq!(parse(json!(3)), Some(3));
        assert_eq!(parse(json!("4")), Some(4));
        assert_eq!(parse(json!(2.0)), Some(2));
        assert_eq!(parse(json!(2.5)), None);
        assert_eq!(parse(json!(0)), None);
        assert_eq!(parse(json!(-1)), None);
        assert_eq!(parse(json!("abc")), None);
        assert_eq!(parse(json!(null)), None);
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let entry: CourseEntry = serde_json::from_value(json!({
            "课程名称": "数学",
            "教师": "  ",
            "星期": "周二",
            "节次": 2,
            "地点": ""
        }))
        .unwrap();

        assert_eq!(entry.teacher, None);
        assert_eq!(entry.location, None);
    }

    #[test]
    fn test_unspecified_teacher_is_not_assigned() {
        let entry = CourseEntry::new("数学", Weekday::Tue, 2).with_teacher(UNSPECIFIED);
        assert_eq!(entry.assigned_teacher(), None);
    }

    #[test]
    fn test_serialize_uses_short_weekday_and_skips_absent_fields() {
        let entry = CourseEntry::new("英语", Weekday::Thu, 3);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            value,
            json!({ "课程名称": "英语", "星期": "周四", "节次": 3 })
        );
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let no_name = CourseEntry::new("  ", Weekday::Mon, 1);
        assert!(matches!(no_name.validate(), Err(AppError::Validation(_))));

        let no_period = CourseEntry {
            name: "体育".to_string(),
            weekday: Some(Weekday::Mon),
            ..CourseEntry::default()
        };
        assert!(matches!(no_period.validate(), Err(AppError::Validation(_))));
    }
}
