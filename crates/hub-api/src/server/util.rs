fn apply_no_cache_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
}

fn fallback_message(reason: &FallbackReason) -> String {
    match reason {
        FallbackReason::NotConfigured => "test data (store not configured)".to_string(),
        FallbackReason::StoreFailed(err) => format!("test data (store error: {err})"),
    }
}

fn save_message(receipt: &SaveReceipt) -> String {
    match receipt {
        SaveReceipt::Persisted { .. } => "player saved".to_string(),
        SaveReceipt::Simulated {
            reason: FallbackReason::NotConfigured,
            ..
        } => "saved locally (store not configured)".to_string(),
        SaveReceipt::Simulated {
            reason: FallbackReason::StoreFailed(_),
            ..
        } => "saved locally (store error)".to_string(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                error!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
