//! Service Plugin - 컨테이너에 능력 인터페이스를 등록하는 플러그인

use super::traits::Plugin;
use crate::container::{Container, InterfaceId};
use tracing::{error, info};
use uniapp_foundation::{Error, Result};

/// 서비스 플러그인
///
/// 어떤 인터페이스를 구현하는지 컴파일 타임에 선언하고,
/// 활성화 시 [`Container`]에 바인딩을 등록합니다.
pub trait ServicePlugin: Plugin {
    /// 구현하는 능력 인터페이스
    fn interface(&self) -> InterfaceId;

    /// 등록 훅 - 등록한 서비스 이름 목록 반환
    fn on_register_service(&self, container: &Container) -> Result<Vec<String>>;

    /// 서비스 등록 (초기화되지 않은 플러그인은 거부)
    fn register_service(&self, container: &Container) -> Result<Vec<String>> {
        if !self.is_initialized() {
            error!(
                "Cannot register service for uninitialized plugin {}",
                self.id()
            );
            return Err(Error::plugin(
                self.id(),
                "cannot register services before initialization",
            ));
        }

        info!(
            "Registering {} service for plugin {}",
            self.interface(),
            self.name()
        );
        let names = self.on_register_service(container)?;
        info!("Service registered for plugin {}: {:?}", self.name(), names);
        Ok(names)
    }
}
