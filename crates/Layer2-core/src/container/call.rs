//! Service Call - 서비스 호출 에러 컨텍스트
//!
//! 서비스 메서드는 `Result`를 반환합니다. 바인딩된 서비스를 호출하는 쪽에서
//! [`service_call`]로 감싸면 실패 시 서비스/연산 이름이 붙고 로그가 남습니다.

use tracing::error;
use uniapp_foundation::{Error, Result};

/// 서비스 호출을 감싸 실패에 `Error::Service` 컨텍스트를 붙임
///
/// 이미 `Error::Service`인 에러는 그대로 전달합니다.
pub fn service_call<T, F>(service: &str, operation: &str, call: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    call().map_err(|e| {
        let err = match e {
            Error::Service { .. } => e,
            other => Error::service(service, operation, other.to_string()),
        };
        error!(service = %service, operation = %operation, "Service call failed: {}", err);
        err
    })
}


