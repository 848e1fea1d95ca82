//! Builtin plugins - 기본 제공 예제 플러그인
//!
//! - `calculator`: 계산기 서비스 플러그인
//! - `calculator_ui`: 계산기 페이지 UI 플러그인

pub mod calculator;
pub mod calculator_ui;

pub use calculator::{
    BasicCalculator, CalculationPerformed, CalculationRecord, CalculatorPlugin, CalculatorService,
    CALCULATION_PERFORMED,
};
pub use calculator_ui::CalculatorUiPlugin;

use crate::plugin::{PluginFactory, PluginNamespace};
use uniapp_foundation::Result;

/// 기본 제공 네임스페이스 경로
pub const NAMESPACE: &str = "uniapp.builtin";

fn calculator_unit() -> Result<Vec<PluginFactory>> {
    Ok(vec![PluginFactory::of::<CalculatorPlugin>()])
}

fn calculator_ui_unit() -> Result<Vec<PluginFactory>> {
    Ok(vec![PluginFactory::of::<CalculatorUiPlugin>()])
}

/// 기본 제공 플러그인 네임스페이스
pub fn namespace() -> PluginNamespace {
    PluginNamespace::new(NAMESPACE)
        .with_unit("calculator", calculator_unit)
        .with_unit("calculator_ui", calculator_ui_unit)
}
