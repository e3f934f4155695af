//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（本地 mock 服务，无需真实 CertWatch API）

#[cfg(test)]
mod contract_tests {
    use contracts::{DeliveryOutcome, RelayConfig, StreamRecord, DEFAULT_API_ENDPOINT};

    #[test]
    fn test_default_endpoint() {
        assert_eq!(RelayConfig::default().api_endpoint, DEFAULT_API_ENDPOINT);
    }

    #[test]
    fn test_record_field_order_snapshot() {
        let json = serde_json::to_string(&StreamRecord::default()).unwrap();
        let keys = [
            "\"event\"",
            "\"event_id\"",
            "\"timestamp\"",
            "\"api_version\"",
            "\"data\"",
            "\"fingerprint\"",
            "\"serial_number\"",
            "\"common_name\"",
            "\"domains\"",
            "\"issuer_org\"",
            "\"issuer_cn\"",
            "\"not_before\"",
            "\"not_after\"",
            "\"ct_log_sources\"",
            "\"seen_at\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", json);
    }

    #[test]
    fn test_exit_code_contract() {
        use certwatch_cli::ExitStatus;
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failed.code(), 1);
        assert_eq!(ExitStatus::Fatal.code(), 2);
        assert!(!DeliveryOutcome::no_response(1, "cn", 0, "timeout").success);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::ops::ControlFlow;
    use std::time::Duration;

    use bytes::Bytes;
    use certwatch_cli::output::Console;
    use certwatch_cli::pipeline::{Pipeline, PipelineConfig, PipelineStats};
    use contracts::{RelayConfig, ShutdownHandle, ShutdownSignal, StreamMeta, StreamRecord};
    use dispatcher::{verify_signature, Dispatcher, WebhookSink};
    use ingestion::{EventStream, StreamEnd, StreamHandler};
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const STREAM_PATH: &str = "/api/v1/tools/webhook-test/stream";
    const SECRET: &str = "whsec_e2e";

    fn record_json(n: u32) -> String {
        format!(
            r#"{{"event":"ct.certificate.new","event_id":"evt_{n}","timestamp":"2026-01-01T00:00:0{n}Z","api_version":"2024-01-01","data":{{"fingerprint":"sha256:{n:02}","serial_number":"0{n}","common_name":"host{n}.example.com","domains":["host{n}.example.com"],"issuer_org":"Let's Encrypt","issuer_cn":"R11","not_before":"2026-01-01T00:00:00Z","not_after":"2026-04-01T00:00:00Z","ct_log_sources":["Google Argon 2026"],"seen_at":"2026-01-01T00:00:0{n}Z"}}}}"#
        )
    }

    /// Meta, a comment, three records, one malformed payload and a completion
    fn sse_body() -> String {
        format!(
            ": keep-alive\n\
             event: meta\ndata: {{\"testId\":\"t-e2e\",\"streamDurationSeconds\":30}}\n\n\
             data: {}\n\n\
             data: {{broken\n\n\
             data: {}\n\
             data: {}\n\
             event: complete\ndata: stream finished\n\n",
            record_json(1),
            record_json(2),
            record_json(3)
        )
    }

    async fn mount_stream(server: &MockServer, secret: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(STREAM_PATH))
            .and(query_param("secret", secret))
            .and(header("authorization", format!("Bearer {}", secret).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(server)
            .await;
    }

    async fn mount_webhook(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    /// File-loaded config drives a file-only run against the mock stream
    #[tokio::test]
    async fn test_e2e_config_file_run() {
        let server = MockServer::start().await;
        mount_stream(&server, SECRET, sse_body()).await;

        let dir = tempdir().unwrap();
        let out = dir.path().join("from-config.jsonl");
        let toml = format!(
            "secret = \"{}\"\nfile = \"{}\"\napi_endpoint = \"{}\"\n",
            SECRET,
            out.display(),
            server.uri()
        );
        let relay = config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
            .unwrap();
        config_loader::ConfigLoader::validate(&relay).unwrap();

        let stats = run(relay).await;
        assert_eq!(stats.saved, 3);
        assert!(!stats.delivered);
        assert_eq!(stats.exit_status().code(), 0);
    }

    async fn run(relay: RelayConfig) -> PipelineStats {
        let mut pipeline = Pipeline::new(
            PipelineConfig {
                relay,
                version: "e2e".to_string(),
            },
            Console::new(false, false),
        );
        pipeline.run(ShutdownSignal::never()).await.unwrap()
    }

    async fn webhook_requests(server: &MockServer) -> Vec<Request> {
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/hook")
            .collect()
    }

    /// End-to-end: SSE stream -> Dispatcher -> JSONL file + signed HTTP delivery
    #[tokio::test]
    async fn test_e2e_secret_mode_all_sinks() {
        let server = MockServer::start().await;
        mount_stream(&server, SECRET, sse_body()).await;
        mount_webhook(&server, 200).await;

        let dir = tempdir().unwrap();
        let file = dir.path().join("records.jsonl");

        let stats = run(RelayConfig {
            target_url: Some(format!("{}/hook", server.uri())),
            secret: Some(SECRET.to_string()),
            file: Some(file.clone()),
            api_endpoint: server.uri(),
            ..Default::default()
        })
        .await;

        assert_eq!(stats.result.records, 3);
        assert_eq!(stats.result.total, 3);
        assert_eq!(stats.result.succeeded, 3);
        assert_eq!(stats.saved, 3);
        assert_eq!(stats.stream.decode_failures, 1);
        assert_eq!(stats.exit_status().code(), 0);

        let lines: Vec<String> = std::fs::read_to_string(&file)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(lines, vec![record_json(1), record_json(2), record_json(3)]);

        let requests = webhook_requests(&server).await;
        assert_eq!(requests.len(), 3);
        for (request, line) in requests.iter().zip(&lines) {
            assert_eq!(request.body, line.as_bytes());
            let signature = request
                .headers
                .get("x-certwatch-signature")
                .unwrap()
                .to_str()
                .unwrap();
            assert!(verify_signature(&request.body, signature, SECRET));
        }

        let ids: Vec<_> = requests
            .iter()
            .map(|r| r.headers.get("x-certwatch-event-id").unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["evt_1", "evt_2", "evt_3"]);
    }

    #[tokio::test]
    async fn test_e2e_failed_delivery_exit_code() {
        let server = MockServer::start().await;
        mount_stream(&server, SECRET, sse_body()).await;
        mount_webhook(&server, 503).await;

        let stats = run(RelayConfig {
            target_url: Some(format!("{}/hook", server.uri())),
            secret: Some(SECRET.to_string()),
            api_endpoint: server.uri(),
            ..Default::default()
        })
        .await;

        assert_eq!(stats.result.total, 3);
        assert_eq!(stats.result.failed, 3);
        assert_eq!(stats.result.success_pct(), 0.0);
        assert_eq!(stats.exit_status().code(), 1);
    }

    #[tokio::test]
    async fn test_e2e_api_key_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/tools/webhook-test/session"))
            .and(header("x-api-key", "key_e2e"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "testId": "t-session",
                    "secret": "issued_secret",
                    "streamUrl": format!("{}{}?secret=issued_secret", server.uri(), STREAM_PATH),
                    "expiresInSeconds": 600,
                    "streamDurationSeconds": 30
                }
            })))
            .mount(&server)
            .await;
        mount_stream(&server, "issued_secret", sse_body()).await;
        mount_webhook(&server, 204).await;

        let stats = run(RelayConfig {
            target_url: Some(format!("{}/hook", server.uri())),
            api_key: Some("key_e2e".to_string()),
            api_endpoint: server.uri(),
            ..Default::default()
        })
        .await;

        assert_eq!(stats.result.succeeded, 3);
        assert_eq!(stats.exit_status().code(), 0);

        for request in webhook_requests(&server).await {
            let signature = request
                .headers
                .get("x-certwatch-signature")
                .unwrap()
                .to_str()
                .unwrap();
            assert!(verify_signature(&request.body, signature, "issued_secret"));
        }
    }

    #[tokio::test]
    async fn test_e2e_slow_receiver_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let webhook =
            WebhookSink::with_timeout(server.uri(), SECRET, Duration::from_millis(200)).unwrap();
        let mut dispatcher = Dispatcher::builder().webhook(webhook).build();

        let record: StreamRecord = serde_json::from_str(&record_json(1)).unwrap();
        let dispatched = dispatcher.dispatch(&record).await;
        let outcome = dispatched.outcome.unwrap();

        assert_eq!(dispatched.index, 1);
        assert_eq!(outcome.status, 0);
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert!(outcome.latency_ms >= 200);
        assert_eq!(dispatcher.result(Duration::ZERO).failed, 1);
    }

    /// Dispatches every payload and requests shutdown after `stop_after` records
    struct CancellingHandler {
        dispatcher: Dispatcher,
        shutdown: Option<ShutdownHandle>,
        stop_after: u64,
    }

    impl StreamHandler for CancellingHandler {
        async fn on_meta(&mut self, _meta: StreamMeta) -> ControlFlow<()> {
            ControlFlow::Continue(())
        }

        async fn on_payload(&mut self, record: StreamRecord) -> ControlFlow<()> {
            let dispatched = self.dispatcher.dispatch(&record).await;
            if dispatched.index >= self.stop_after {
                if let Some(handle) = self.shutdown.take() {
                    handle.trigger();
                }
            }
            ControlFlow::Continue(())
        }

        async fn on_complete(&mut self, _message: String) -> ControlFlow<()> {
            ControlFlow::Continue(())
        }

        async fn on_error(&mut self, _message: String) -> ControlFlow<()> {
            ControlFlow::Break(())
        }
    }

    #[tokio::test]
    async fn test_e2e_cancellation_keeps_finished_records() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("partial.jsonl");

        let body = format!("data: {}\n\ndata: {}\n\n", record_json(1), record_json(2));
        let chunks: Vec<ingestion::Result<Bytes>> = vec![Ok(Bytes::from(body))];
        let source = futures::stream::StreamExt::chain(
            futures::stream::iter(chunks),
            futures::stream::pending(),
        );
        let mut events = EventStream::from_byte_stream(source);

        let (handle, mut signal) = ShutdownHandle::new();
        let mut handler = CancellingHandler {
            dispatcher: Dispatcher::builder()
                .file(dispatcher::FileSink::open(&file).unwrap())
                .build(),
            shutdown: Some(handle),
            stop_after: 2,
        };

        let end = events.run(&mut handler, &mut signal).await.unwrap();
        handler.dispatcher.close().await;

        assert_eq!(end, StreamEnd::Cancelled);
        assert_eq!(handler.dispatcher.records(), 2);
        assert_eq!(std::fs::read_to_string(&file).unwrap().lines().count(), 2);
    }
}
