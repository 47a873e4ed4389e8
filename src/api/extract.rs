use axum::extract::FromRequest;

use crate::error::Error;

/// JSON body extractor whose rejections use the clinic error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);
