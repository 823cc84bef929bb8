pub mod pack;
pub mod scale;

pub use pack::{pack_pair, quantize_and_pack, unpack_byte, QuantizedTensor};
pub use scale::estimate_scale;
