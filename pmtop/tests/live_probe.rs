use pmtop::api::DaemonClient;

// Integration probe: only runs when PMTOP_BASE is set to a daemon base URL.
// Example: PMTOP_BASE=http://127.0.0.1:9900 PMTOP_TOKEN=... \
//   cargo test -p pmtop --test live_probe -- --nocapture
#[tokio::test]
async fn probe_daemon_endpoints() {
    // Gate the test to avoid CI failures when no daemon is running.
    let base = match std::env::var("PMTOP_BASE") {
        Ok(v) if !v.is_empty() => v,
        _ => {
            eprintln!(
                "skipping live_probe: set PMTOP_BASE=http://host:port to run this integration test"
            );
            return;
        }
    };
    let token = std::env::var("PMTOP_TOKEN").ok();

    let client = DaemonClient::new(&base, token.as_deref());

    let items = client.list_processes(None).await.expect("list processes");
    eprintln!("{} processes", items.len());

    let metrics = client.daemon_metrics(None).await.expect("daemon metrics");
    assert!(!metrics.version.pkg.is_empty());
}
