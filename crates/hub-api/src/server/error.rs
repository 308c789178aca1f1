#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, details),
        }
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }

    fn from_service(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingPlayerData => Self::invalid_request(err.to_string(), None),
            ServiceError::InvalidCode(code_err) => {
                Self::invalid_request("invalid player code", Some(code_err.to_string()))
            }
        }
    }

    fn from_json_rejection(rejection: JsonRejection) -> Self {
        Self::invalid_request("request body is not valid JSON", Some(rejection.body_text()))
    }

    fn from_query_rejection(rejection: QueryRejection) -> Self {
        Self::invalid_request("query string is malformed", Some(rejection.body_text()))
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
