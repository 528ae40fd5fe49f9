pub mod packet;

pub use packet::{decode, encode, CodecError, Decoded, Payload};
