#[derive(Clone)]
struct AppState {
    service: Arc<PlayerService>,
}

impl AppState {
    fn new(service: Arc<PlayerService>) -> Self {
        Self { service }
    }

    /// Runs a service call off the async workers; store calls block on disk I/O.
    async fn run<T, F>(&self, call: F) -> Result<T, HttpApiError>
    where
        T: Send + 'static,
        F: FnOnce(&PlayerService) -> T + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || call(&service))
            .await
            .map_err(|err| {
                error!(error = %err, "service task failed");
                HttpApiError::internal("service task failed", Some(err.to_string()))
            })
    }
}
