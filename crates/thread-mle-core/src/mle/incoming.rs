//! Recover the handler inputs a command needs from its TLV stream
//! (spec §4.8, §4.7). Narrow on purpose: only the TLVs the attach cycle
//! and keep-alive tracks actually consume are parsed here, not a
//! general-purpose TLV-to-struct mapper.

use crate::codec::tlv::{find_tlv, TlvType};
use crate::error::{MleError, MleResult};
use crate::mle::attach::ParentCandidate;
use crate::neighbor::peer::Peer;
use crate::types::{ExtAddr, Rloc16};

/// Recover a [`ParentCandidate`] from a ParentResponse's TLV stream.
/// `SourceAddress` must be present; `LinkMargin`, `Connectivity` and
/// `Version` default to their "don't care" value when absent rather
/// than failing the whole response.
pub fn parent_candidate_from_tlvs(ext_addr: ExtAddr, tlvs: &[u8], is_router: bool) -> MleResult<ParentCandidate> {
    let rloc16 = read_be_u16(tlvs, TlvType::SourceAddress)?;
    let link_margin_db = read_u8(tlvs, TlvType::LinkMargin).unwrap_or(0) as i32;
    let (parent_priority, lq3, lq2, lq1) = read_connectivity(tlvs).unwrap_or((0, 0, 0, 0));
    let protocol_version = read_u8(tlvs, TlvType::Version).unwrap_or(0);

    Ok(ParentCandidate {
        ext_addr,
        rloc16,
        link_margin_db,
        link_quality_class: Peer::link_quality_class(link_margin_db),
        is_router,
        parent_priority,
        connectivity_lq3_count: lq3,
        connectivity_lq2_count: lq2,
        connectivity_lq1_count: lq1,
        protocol_version,
        sed_buffer_size: 0,
        sed_datagram_count: 0,
        parent_csl_power_metric: None,
    })
}

/// Recover the node's newly assigned RLOC16 from a ChildIdResponse's
/// `Address16` TLV.
pub fn own_rloc16_from_tlvs(tlvs: &[u8]) -> MleResult<Rloc16> {
    read_be_u16(tlvs, TlvType::Address16)
}

fn read_be_u16(tlvs: &[u8], tlv_type: TlvType) -> MleResult<u16> {
    let tlv = find_tlv(tlvs, tlv_type)?;
    let bytes: [u8; 2] = tlv.value.try_into().map_err(|_| MleError::Parse)?;
    Ok(u16::from_be_bytes(bytes))
}

fn read_u8(tlvs: &[u8], tlv_type: TlvType) -> MleResult<u8> {
    find_tlv(tlvs, tlv_type)?.value.first().copied().ok_or(MleError::Parse)
}

/// `(parent_priority, lq3_count, lq2_count, lq1_count)` from a
/// Connectivity TLV, `None` if the TLV is absent or too short.
fn read_connectivity(tlvs: &[u8]) -> Option<(i8, u8, u8, u8)> {
    let tlv = find_tlv(tlvs, TlvType::Connectivity).ok()?;
    if tlv.value.len() < 4 {
        return None;
    }
    Some((tlv.value[0] as i8, tlv.value[1], tlv.value[2], tlv.value[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tlv::append_tlv;
    use alloc::vec::Vec;

    #[test]
    fn parent_response_tlvs_recover_a_candidate() {
        let mut tlvs = Vec::new();
        append_tlv(&mut tlvs, TlvType::SourceAddress, &0x6c01u16.to_be_bytes()).unwrap();
        append_tlv(&mut tlvs, TlvType::LinkMargin, &[20]).unwrap();
        append_tlv(&mut tlvs, TlvType::Connectivity, &[1, 2, 0, 0]).unwrap();
        append_tlv(&mut tlvs, TlvType::Version, &[3]).unwrap();

        let candidate = parent_candidate_from_tlvs([9; 8], &tlvs, true).unwrap();
        assert_eq!(candidate.rloc16, 0x6c01);
        assert_eq!(candidate.link_margin_db, 20);
        assert_eq!(candidate.link_quality_class, 3);
        assert_eq!(candidate.parent_priority, 1);
        assert_eq!(candidate.connectivity_lq3_count, 2);
        assert_eq!(candidate.protocol_version, 3);
    }

    #[test]
    fn missing_source_address_is_an_error() {
        let tlvs = Vec::new();
        assert_eq!(parent_candidate_from_tlvs([1; 8], &tlvs, true).unwrap_err(), MleError::NotFound);
    }

    #[test]
    fn child_id_response_recovers_own_rloc16() {
        let mut tlvs = Vec::new();
        append_tlv(&mut tlvs, TlvType::Address16, &0x4401u16.to_be_bytes()).unwrap();
        assert_eq!(own_rloc16_from_tlvs(&tlvs).unwrap(), 0x4401);
    }
}
