pub mod http;

pub use http::{FetchError, FetchResponse, Fetcher, HttpClient};
