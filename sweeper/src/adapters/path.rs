use alloy::primitives::{Address, Bytes};

use super::fee_tier::FeeTier;

/// Packed V3 path: `token_in ‖ fee ‖ token_out ‖ fee ‖ token_out …`.
pub fn encode_v3_path(token_in: Address, hops: &[(FeeTier, Address)]) -> Bytes {
    let mut path = Vec::with_capacity(20 + hops.len() * 23);
    path.extend_from_slice(token_in.as_slice());
    for (fee, token_out) in hops {
        let fee_bytes = fee.as_uint24().to_be_bytes::<3>();
        path.extend_from_slice(&fee_bytes);
        path.extend_from_slice(token_out.as_slice());
    }
    Bytes::from(path)
}

/// Fee of the first hop of a packed path, if the path is long enough.
pub fn first_hop_fee(path: &[u8]) -> Option<u32> {
    let fee = path.get(20..23)?;
    Some(u32::from_be_bytes([0, fee[0], fee[1], fee[2]]))
}
