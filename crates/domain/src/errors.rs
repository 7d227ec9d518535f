//! 领域错误定义
//!
//! 错误分类与 HTTP 状态码一一对应：InvalidArgument→400、Unauthorized→401、
//! Forbidden→403、NotFound→404、Conflict→409。映射本身在 web-api 层完成。

use thiserror::Error;

/// 领域错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 输入非法或缺失
    #[error("invalid argument: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 凭证校验失败
    #[error("invalid credentials")]
    Unauthorized,

    /// 已认证但无权执行该操作
    #[error("forbidden: {action}")]
    Forbidden { action: String },

    /// 资源不存在
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// 状态前置条件不满足
    #[error("conflict: {message}")]
    Conflict { message: String },
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// 领域结果类型
pub type DomainResult<T> = Result<T, DomainError>;
