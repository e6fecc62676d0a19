pub mod service;

pub use service::{RelayCommand, RelayCommandIssuer};
