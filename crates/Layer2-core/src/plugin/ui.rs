//! UI Plugin - 호스트 창에 페이지를 붙이는 플러그인
//!
//! 실제 창/위젯은 외부 협력자입니다. 런타임은 [`PageHost`]만 압니다.

use super::traits::Plugin;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info};
use uniapp_foundation::error::panic_message;
use uniapp_foundation::{Error, Result};

/// 페이지를 받아들이는 호스트 창
pub trait PageHost {
    /// 페이지 추가
    fn attach_page(&mut self, page_id: &str, title: &str) -> Result<()>;
}

/// 붙은 페이지 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedPage {
    pub page_id: String,
    pub title: String,
}

/// 창 없이 페이지 목록만 기록하는 호스트 (CLI, 테스트용)
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pages: Vec<AttachedPage>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[AttachedPage] {
        &self.pages
    }
}

impl PageHost for HeadlessHost {
    fn attach_page(&mut self, page_id: &str, title: &str) -> Result<()> {
        if self.pages.iter().any(|p| p.page_id == page_id) {
            return Err(Error::InvalidRegistration(format!(
                "Page '{}' is already attached",
                page_id
            )));
        }
        self.pages.push(AttachedPage {
            page_id: page_id.to_string(),
            title: title.to_string(),
        });
        Ok(())
    }
}

/// UI 플러그인
pub trait UiPlugin: Plugin {
    /// 페이지 등록 훅
    fn on_register_page(&self, host: &mut dyn PageHost) -> Result<()>;

    /// 페이지 등록 (미초기화 시 거부, 훅 실패는 로그 후 `false`)
    fn register_page(&self, host: &mut dyn PageHost) -> bool {
        if !self.is_initialized() {
            error!(
                "Cannot register page for uninitialized plugin {}",
                self.id()
            );
            return false;
        }

        info!("Registering UI page for plugin {}", self.name());
        match panic::catch_unwind(AssertUnwindSafe(|| self.on_register_page(host))) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(
                    "Error registering page for plugin {}: {}",
                    self.name(),
                    e
                );
                false
            }
            Err(payload) => {
                error!(
                    "Page registration panicked for plugin {}: {}",
                    self.name(),
                    panic_message(&*payload)
                );
                false
            }
        }
    }
}


