//! The `{message, data, meta}` envelope every JSON endpoint responds with.
//! Storefront clients key on `message` for toasts and on `meta` for paging,
//! so the shape is part of the wire contract and stays stable.

use serde::Serialize;
use utoipa::ToSchema;

/// Paging block. List endpoints fill all three fields; everything else sends
/// `Meta::empty` or omits it.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Success envelope. Errors reuse the same shape with an error payload in
/// `data`, built in `error.rs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
