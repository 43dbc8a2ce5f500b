pub mod client;
pub mod error;
pub mod gate;
pub mod retry;
pub mod types;

pub use client::{GeocoderSettings, NominatimClient};
pub use error::GeocodeError;
pub use gate::RequestGate;
pub use retry::RetryPolicy;
pub use types::{Coordinates, Geocoder};
