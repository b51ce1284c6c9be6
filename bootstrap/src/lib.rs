//! learnhub-bootstrap - 统一服务启动骨架
//!
//! 配置加载之后的运行时初始化与基础设施资源创建

mod infrastructure;
mod retry;
mod runtime;

pub use infrastructure::*;
pub use retry::*;
pub use runtime::*;
