pub mod traits;

pub use traits::{Frequency, RadioConfig, RadioError, Rfm69Radio, RxFrame};
