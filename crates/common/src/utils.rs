//! 通用工具函数

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// 生成新的 UUID v7（时间有序）
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// 按整周偏移时间点
pub fn add_weeks(at: DateTime<Utc>, weeks: u32) -> DateTime<Utc> {
    at + Duration::days(i64::from(weeks) * 7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_add_weeks() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(add_weeks(start, 0), start);
        assert_eq!(
            add_weeks(start, 3),
            Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_new_id_is_time_ordered() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.get_version_num(), 7);
    }
}
