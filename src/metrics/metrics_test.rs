use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("i18n".to_string()), None).unwrap();
    register_custom_metrics(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    RELOAD_TOTAL.with_label_values(&["ready"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"i18n_reload_total"),
        "Missing i18n_reload_total"
    );
}

#[test]
fn test_registering_twice_is_not_fatal() {
    let registry = create_test_registry();
    register_custom_metrics(&registry);
}

#[test]
fn test_counter_increment() {
    LOCALE_LOAD_FAILURES.with_label_values(&["xx-test"]).reset();

    LOCALE_LOAD_FAILURES.with_label_values(&["xx-test"]).inc();
    LOCALE_LOAD_FAILURES.with_label_values(&["xx-test"]).inc();

    let value = LOCALE_LOAD_FAILURES.with_label_values(&["xx-test"]).get();
    assert_eq!(value, 2, "Counter should increment correctly");
}

#[test]
fn test_histogram_labels() {
    RELOAD_DURATION_MS.with_label_values(&["test-a"]).observe(100.0);
    RELOAD_DURATION_MS.with_label_values(&["test-b"]).observe(200.0);

    let a = RELOAD_DURATION_MS.with_label_values(&["test-a"]).get_sample_count();
    let b = RELOAD_DURATION_MS.with_label_values(&["test-b"]).get_sample_count();

    assert_eq!(a, 1);
    assert_eq!(b, 1);
}

#[tokio::test]
async fn test_metrics_endpoint_format() {
    let registry = create_test_registry();
    WATCH_BATCHES.with_label_values(&["true"]).inc();

    let metrics_route = warp::path!("metrics")
        .map(move || registry.clone())
        .and_then(metrics_handler);

    let response = warp::test::request()
        .method("GET")
        .path("/metrics")
        .reply(&metrics_route)
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("Content-Type"),
        Some(&"text/plain; charset=utf-8".parse().unwrap())
    );

    let body = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(body.contains("i18n_watch_batches"));
}
