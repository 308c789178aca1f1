#[derive(Debug, Deserialize, Default)]
struct GetPlayerQuery {
    code: Option<String>,
}

async fn get_player(
    State(state): State<AppState>,
    query: Result<Query<GetPlayerQuery>, QueryRejection>,
) -> Result<Response, HttpApiError> {
    let Query(query) = query.map_err(HttpApiError::from_query_rejection)?;
    let Some(code) = query.code.filter(|code| !code.trim().is_empty()) else {
        return Err(HttpApiError::invalid_request("code is required", None));
    };

    let now = Utc::now();
    let lookup = state
        .run(move |service| service.get_player(&code, now))
        .await?
        .map_err(HttpApiError::from_service)?;

    let response = match lookup {
        Lookup::Found {
            player,
            source,
            fallback,
        } => Json(GetPlayerResponse {
            success: true,
            data: player,
            source,
            message: fallback.as_ref().map(fallback_message),
        })
        .into_response(),
        Lookup::NotFound {
            code,
            available_codes,
        } => (
            StatusCode::NOT_FOUND,
            Json(PlayerNotFoundResponse {
                success: false,
                error: format!("player {code} not found"),
                available_codes,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

async fn save_player(
    State(state): State<AppState>,
    payload: Result<Json<SavePlayerRequest>, JsonRejection>,
) -> Result<Json<SavePlayerResponse>, HttpApiError> {
    let Json(request) = payload.map_err(HttpApiError::from_json_rejection)?;

    let now = Utc::now();
    let receipt = state
        .run(move |service| {
            service.save_player(
                request.player_code.as_deref(),
                request.player_data.as_ref(),
                now,
            )
        })
        .await?
        .map_err(HttpApiError::from_service)?;

    let result = match &receipt {
        SaveReceipt::Persisted { outcome, .. } => Some(outcome.write_result()),
        SaveReceipt::Simulated { .. } => None,
    };

    Ok(Json(SavePlayerResponse {
        success: true,
        message: save_message(&receipt),
        player_code: receipt.code().to_string(),
        timestamp: now,
        source: receipt.source(),
        result,
    }))
}
