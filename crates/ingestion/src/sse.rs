//! Server-sent-event 行解析器
//!
//! 逐行输入，输出 (event-kind, data) 对。规则：
//! - `:` 开头为注释，忽略，不影响当前 event-kind
//! - 空行把当前 event-kind 重置为默认 (payload)
//! - `event:` 设置当前 event-kind (去掉首尾空白)
//! - `data:` 立即产出一个 (当前 event-kind, 去掉首尾空白的数据) 对，不清除 event-kind
//! - 其他形式的行忽略

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Stream 元数据 (`event: meta`)
    Meta,
    /// 流即将结束 (`event: complete`)
    Complete,
    /// 服务端报告错误 (`event: error`)
    Error,
    /// 默认类型：证书记录
    Payload,
}

impl EventKind {
    /// 从 `event:` 字段解析；未知类型按 payload 处理
    pub fn from_field(event: Option<&str>) -> Self {
        match event {
            Some("meta") => Self::Meta,
            Some("complete") => Self::Complete,
            Some("error") => Self::Error,
            _ => Self::Payload,
        }
    }

    /// 指标和日志使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Payload => "payload",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析出的原始事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// `event:` 字段值，未设置时为 `None`
    pub event: Option<String>,
    /// `data:` 字段值
    pub data: String,
}

impl RawEvent {
    /// 事件类型
    pub fn kind(&self) -> EventKind {
        EventKind::from_field(self.event.as_deref())
    }
}

/// 行解析器 (保存跨行的 event-kind 状态)
#[derive(Debug, Default)]
pub struct SseLineParser {
    event: Option<String>,
}

impl SseLineParser {
    /// 创建解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前待定的 event-kind
    pub fn pending_event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// 输入一行 (不含换行符)
    pub fn feed_line(&mut self, line: &str) -> Option<RawEvent> {
        if line.starts_with(':') {
            return None;
        }

        if line.is_empty() {
            self.event = None;
            return None;
        }

        if let Some(rest) = line.strip_prefix("event:") {
            let event = rest.trim();
            self.event = (!event.is_empty()).then(|| event.to_string());
            return None;
        }

        if let Some(rest) = line.strip_prefix("data:") {
            return Some(RawEvent {
                event: self.event.clone(),
                data: rest.trim().to_string(),
            });
        }

        None
    }
}
