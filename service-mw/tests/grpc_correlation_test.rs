use std::sync::Arc;

use service_mw::{
    Context, Endpoint, EndpointExt,
    dtx::{self, HEADER_HTTP2},
    endpoint_fn,
    grpc::{Request, Status, correlation_interceptor, inject_correlation_id, request_context},
    keyer::Keys,
    log_value_debug,
    middleware::log,
    observability::RecordingSink,
};

#[derive(Debug, Clone)]
struct ChargeRequest {
    amount_cents: u64,
}

#[derive(Debug, Clone)]
struct ChargeResponse {
    payment_id: String,
}

log_value_debug!(ChargeRequest, ChargeResponse);

fn metadata_values<T>(request: &Request<T>) -> Vec<String> {
    request
        .metadata()
        .get_all(HEADER_HTTP2)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_server_to_client_propagation() {
    // Inbound call from an upstream service, carrying a duplicated key.
    let mut inbound = Request::new(());
    inbound
        .metadata_mut()
        .append(HEADER_HTTP2, "stale".parse().unwrap());
    inbound
        .metadata_mut()
        .append(HEADER_HTTP2, "tx-9".parse().unwrap());

    let inbound = correlation_interceptor(inbound).unwrap();
    let ctx = request_context(&inbound);
    assert_eq!(dtx::correlation_id(&ctx), Some("tx-9"));

    // Outbound call to a downstream service.
    let mut outbound = Request::new(ChargeRequest { amount_cents: 500 });
    outbound
        .metadata_mut()
        .insert(HEADER_HTTP2, "preset".parse().unwrap());
    inject_correlation_id(&ctx, &mut outbound);

    assert_eq!(metadata_values(&outbound), vec!["tx-9".to_string()]);
}

#[tokio::test]
async fn test_untagged_call_sets_no_metadata() {
    let inbound = correlation_interceptor(Request::new(())).unwrap();
    let ctx = request_context(&inbound);

    let mut outbound = Request::new(());
    inject_correlation_id(&ctx, &mut outbound);

    assert!(outbound.metadata().get(HEADER_HTTP2).is_none());
}

#[tokio::test]
async fn test_logged_grpc_handler() {
    let sink = RecordingSink::new();
    let charge = endpoint_fn(|_ctx: Context, req: ChargeRequest| async move {
        if req.amount_cents == 0 {
            return Err(Status::invalid_argument("amount must be positive"));
        }
        Ok(ChargeResponse {
            payment_id: "pay_1".to_string(),
        })
    })
    .wrap(&log(sink.clone(), Keys::new().with("module", "payments"), false));
    let charge = Arc::new(charge);

    let mut inbound = Request::new(());
    inbound
        .metadata_mut()
        .insert(HEADER_HTTP2, "tx-1".parse().unwrap());
    let ctx = request_context(&correlation_interceptor(inbound).unwrap());

    let ok = charge
        .call(ctx.clone(), ChargeRequest { amount_cents: 500 })
        .await
        .unwrap();
    assert_eq!(ok.payment_id, "pay_1");

    let err = charge
        .call(ctx, ChargeRequest { amount_cents: 0 })
        .await
        .unwrap_err();
    assert_eq!(err.code(), tonic::Code::InvalidArgument);

    let entries = sink.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0].1.get("request"),
        Some("ChargeRequest { amount_cents: 500 }")
    );
    assert_eq!(
        entries[0].1.get("response"),
        Some(r#"ChargeResponse { payment_id: "pay_1" }"#)
    );
    assert!(entries[1].1.get("err").unwrap().contains("amount must be positive"));
    assert!(entries.iter().all(|(_, e)| e.get("correlation_id") == Some("tx-1")));
}

#[tokio::test]
async fn test_concurrent_calls_log_independently() {
    let sink = RecordingSink::new();
    let endpoint = Arc::new(
        endpoint_fn(|_ctx: Context, n: u32| async move {
            tokio::task::yield_now().await;
            if n % 2 == 0 { Ok(n) } else { Err(Status::internal("odd")) }
        })
        .wrap(&log(sink.clone(), Keys::new(), false)),
    );

    let handles: Vec<_> = (0..20u32)
        .map(|n| {
            let endpoint = endpoint.clone();
            tokio::spawn(async move {
                let ctx = dtx::with_correlation_id(&Context::background(), format!("tx-{n}"));
                (n, endpoint.call(ctx, n).await)
            })
        })
        .collect();

    for handle in handles {
        let (n, result) = handle.await.unwrap();
        assert_eq!(result.is_ok(), n % 2 == 0);
    }

    let entries = sink.entries();
    let err_lines = entries.iter().filter(|(_, e)| e.contains_key("err")).count();
    let rr_lines = entries
        .iter()
        .filter(|(_, e)| e.contains_key("request") && e.contains_key("response"))
        .count();
    assert_eq!(err_lines, 10);
    assert_eq!(rr_lines, 20);
    for (_, entry) in entries.iter().filter(|(_, e)| e.contains_key("request")) {
        let n = entry.get("request").unwrap();
        assert_eq!(entry.get("correlation_id"), Some(format!("tx-{n}").as_str()));
    }
}
