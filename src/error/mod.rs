mod consumer;
mod source;
mod store;

pub use consumer::DeliveryError;
pub use source::SourceError;
pub use store::StoreError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
