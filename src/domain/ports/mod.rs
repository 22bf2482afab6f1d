mod http_fetcher_port;
mod image_cache_port;
mod image_decoder_port;
mod surface_port;

pub use http_fetcher_port::{
    CachePolicy, DEFAULT_REQUEST_TIMEOUT, FetchRequest, FetchResponse, HttpFetcherPort,
    TransportError,
};
pub use image_cache_port::{CacheError, CacheResult, ImageCachePort};
pub use image_decoder_port::{DecodeError, ImageDecoderPort};
pub use surface_port::{ImageSurface, SharedSurface};

#[cfg(test)]
pub mod mocks {
    pub use super::http_fetcher_port::mock::{MockFetcher, encoded_png};
}
