//! HMAC-SHA256 签名
//!
//! 对即将发送的字节本身签名，签名头格式为 `sha256=<hex>`。

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 签名头前缀
pub const SIGNATURE_PREFIX: &str = "sha256=";

fn keyed(secret: &str) -> HmacSha256 {
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length")
}

/// 计算 `body` 的 HMAC-SHA256，返回 64 位小写 hex
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = keyed(secret);
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// `X-CertWatch-Signature` 头的值
pub fn signature_header(body: &[u8], secret: &str) -> String {
    format!("{}{}", SIGNATURE_PREFIX, sign(body, secret))
}

/// 校验签名头 (常数时间比较)
///
/// 头必须是 `sha256=<hex>` 形式，否则视为无效。
pub fn verify_signature(body: &[u8], header: &str, secret: &str) -> bool {
    let Some(hex_digest) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let mut mac = keyed(secret);
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
