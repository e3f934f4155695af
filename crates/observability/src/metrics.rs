//! Relay 指标收集模块
//!
//! 记录 stream 事件、记录接收与各 sink 投递的运行指标。

use contracts::DeliveryOutcome;
use metrics::{counter, gauge, histogram};

/// 记录 stream 事件 (按事件类型)
pub fn record_stream_event(kind: &str) {
    counter!(
        "certwatch_stream_events_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录一条成功解码的记录
pub fn record_record_received() {
    counter!("certwatch_records_received_total").increment(1);
}

/// 记录一条解码失败被丢弃的事件
pub fn record_record_dropped(kind: &str) {
    counter!(
        "certwatch_records_dropped_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录最新分配的序号 (用于检测跳号)
pub fn record_last_index(index: u64) {
    gauge!("certwatch_last_record_index").set(index as f64);
}

/// 从 DeliveryOutcome 记录投递指标
///
/// # Example
///
/// ```ignore
/// let outcome = webhook.deliver(&record, index).await;
/// record_delivery(&outcome);
/// ```
pub fn record_delivery(outcome: &DeliveryOutcome) {
    let status = if outcome.success { "success" } else { "failure" };
    counter!(
        "certwatch_deliveries_total",
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("certwatch_delivery_latency_ms").record(outcome.latency_ms as f64);
}

/// 记录 sink 写入
pub fn record_sink_write(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "certwatch_sink_writes_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 投递指标聚合器
///
/// 在内存中聚合投递结果，便于输出延迟分布和状态码摘要。
#[derive(Debug, Clone, Default)]
pub struct DeliveryStatsAggregator {
    /// 投递总数
    pub total: u64,

    /// 无响应 (status 0) 次数
    pub no_response: u64,

    /// 延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各状态码出现次数
    pub status_counts: std::collections::BTreeMap<u16, u64>,
}

impl DeliveryStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, outcome: &DeliveryOutcome) {
        self.total += 1;
        if outcome.status == 0 {
            self.no_response += 1;
        } else {
            *self.status_counts.entry(outcome.status).or_insert(0) += 1;
        }
        self.latency_stats.push(outcome.latency_ms as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DeliverySummary {
        DeliverySummary {
            total: self.total,
            no_response: self.no_response,
            latency_ms: StatsSummary::from(&self.latency_stats),
            status_counts: self.status_counts.clone(),
        }
    }
}

/// 投递摘要
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub total: u64,
    pub no_response: u64,
    pub latency_ms: StatsSummary,
    pub status_counts: std::collections::BTreeMap<u16, u64>,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deliveries={} latency_ms=[{}]", self.total, self.latency_ms)?;
        if self.no_response > 0 {
            write!(f, " no_response={}", self.no_response)?;
        }
        for (status, count) in &self.status_counts {
            write!(f, " {}x{}", status, count)?;
        }
        Ok(())
    }
}

/// 单项统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
