async fn debug_report(State(state): State<AppState>) -> Result<Json<DebugReport>, HttpApiError> {
    let now = Utc::now();
    let report = state.run(move |service| service.diagnose(now)).await?;
    Ok(Json(report))
}
