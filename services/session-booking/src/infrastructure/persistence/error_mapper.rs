//! 数据库错误映射工具
//!
//! 提供统一的 SQLx 错误到 AppError 的转换，已知的业务约束映射为对应的业务错误

use learnhub_errors::AppError;

/// 同一用户在同一场次上至多一条 CONFIRMED 预约
pub const CONFIRMED_BOOKING_UNIQUE: &str = "bookings_one_confirmed_per_session";
/// 已报名人数不超过容量
pub const SESSION_CAPACITY_CHECK: &str = "sessions_capacity_check";
/// 积分余额非负
pub const PROFILE_POINTS_CHECK: &str = "profiles_points_check";

fn map_constraint(constraint: &str) -> Option<AppError> {
    match constraint {
        CONFIRMED_BOOKING_UNIQUE => Some(AppError::invalid_state(
            "Session is already booked by this user",
        )),
        SESSION_CAPACITY_CHECK => Some(AppError::resource_exhausted("Session is full")),
        PROFILE_POINTS_CHECK => Some(AppError::insufficient_balance(
            "Points balance cannot become negative",
        )),
        _ => None,
    }
}

/// 将 SQLx 错误转换为 AppError，区分不同错误类型
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::Database(db_err) => {
            if let Some(err) = db_err.constraint().and_then(map_constraint) {
                return err;
            }
            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    // PostgreSQL 约束违规代码
                    "23505" => AppError::conflict("Duplicate entry violates unique constraint"),
                    "23503" => AppError::validation("Foreign key constraint violation"),
                    "23514" => AppError::validation("Check constraint violation"),
                    "23502" => AppError::validation("Not null constraint violation"),
                    "22001" => AppError::validation("String data too long"),
                    "22P02" => AppError::validation("Invalid input syntax"),
                    // 语句超时
                    "57014" => AppError::internal("Statement timed out"),
                    _ => AppError::database(format!("Database error ({}): {}", code, db_err)),
                }
            } else {
                AppError::database(db_err.to_string())
            }
        }
        sqlx::Error::PoolTimedOut => AppError::internal("Database connection pool timeout"),
        sqlx::Error::PoolClosed => AppError::internal("Database connection pool is closed"),
        sqlx::Error::Protocol(msg) => AppError::internal(format!("Database protocol error: {}", msg)),
        _ => AppError::database(e.to_string()),
    }
}

/// 将 serde_json 错误转换为 AppError
pub fn map_json_error(e: serde_json::Error) -> AppError {
    AppError::internal(format!("JSON serialization error: {}", e))
}
