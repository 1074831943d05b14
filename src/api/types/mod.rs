//! Request and response bodies of the HTTP API

pub mod cache;
pub mod error;
pub mod finops;
pub mod json;
pub mod rag;

pub use cache::{
    CacheInvalidateRequest, CacheInvalidateResponse, CacheQueryRequest, CacheWarmupRequest,
    CacheWarmupResponse, WarmupEntry,
};
pub use error::{ApiError, ApiErrorResponse};
pub use finops::{AlertsResponse, ForecastQuery, StatsQuery, SuggestionsResponse};
pub use json::Json;
pub use rag::{
    DeleteDocumentsRequest, DeleteDocumentsResponse, IngestDocumentRequest, RagGenerateRequest,
    RagSearchRequest, RagSearchResponse, RagSearchResult,
};
