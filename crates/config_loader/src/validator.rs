//! 配置校验模块
//!
//! 校验规则：
//! - target_url / api_endpoint 为合法 URL
//! - 至少启用一个 sink (target_url / file / raw)
//! - 至少提供一种认证方式 (api_key / secret)

use contracts::{ContractError, RelayConfig};
use validator::Validate;

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_field_shapes(config)?;
    validate_sinks(config)?;
    validate_auth(config)?;
    Ok(())
}

/// 校验字段格式 (derive 规则)
///
/// 空字符串视为未设置，不参与 URL 校验。
fn validate_field_shapes(config: &RelayConfig) -> Result<(), ContractError> {
    let mut shaped = config.clone();
    if shaped.target_url().is_none() {
        shaped.target_url = None;
    }

    shaped.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

/// 校验至少一个输出目标
fn validate_sinks(config: &RelayConfig) -> Result<(), ContractError> {
    if !config.has_sink() {
        return Err(ContractError::config_validation(
            "target_url / file / raw",
            "at least one of target_url, file, or raw is required",
        ));
    }
    Ok(())
}

/// 校验认证方式
fn validate_auth(config: &RelayConfig) -> Result<(), ContractError> {
    if config.api_key().is_none() && config.secret().is_none() {
        return Err(ContractError::config_validation(
            "api_key / secret",
            "either api_key or secret is required",
        ));
    }
    Ok(())
}
