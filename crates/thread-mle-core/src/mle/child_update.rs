//! Child Update Request/Response TLV negotiation, child side (spec
//! §4.8, §4.7 TLV set): instead of a side channel for address changes,
//! the child piggybacks its current Mode/Timeout/source-address and any
//! newly registered (DAD-cleared) addresses onto the next Child Update
//! Request, and echoes Mode/SourceAddress back on the matching Response.

use alloc::vec::Vec;

use crate::codec::tlv::{append_tlv, TlvType};
use crate::error::MleResult;
use crate::neighbor::child::RegisteredAddress;
use crate::types::Rloc16;

/// One compressed-IID entry's control byte: `0xff` means "uncompressed,
/// full 128-bit address follows" (no 6LoWPAN context applies).
const ADDRESS_REGISTRATION_UNCOMPRESSED: u8 = 0xff;

#[derive(Debug, Clone, Copy)]
pub struct ChildUpdateBuilder {
    pub device_mode: u8,
    pub timeout_sec: u32,
    pub own_rloc16: Rloc16,
}

impl ChildUpdateBuilder {
    pub fn new(device_mode: u8, timeout_sec: u32, own_rloc16: Rloc16) -> Self {
        Self { device_mode, timeout_sec, own_rloc16 }
    }

    /// Mode + Timeout + SourceAddress, plus AddressRegistration when any
    /// address has cleared DAD — a Child Update Request as sent to the
    /// parent.
    pub fn build_request(&self, registered: &[RegisteredAddress]) -> MleResult<Vec<u8>> {
        let mut tlvs = Vec::new();
        append_tlv(&mut tlvs, TlvType::Mode, &[self.device_mode])?;
        append_tlv(&mut tlvs, TlvType::Timeout, &self.timeout_sec.to_be_bytes())?;
        append_tlv(&mut tlvs, TlvType::SourceAddress, &self.own_rloc16.to_be_bytes())?;
        if let Some(registration) = Self::address_registration_value(registered) {
            append_tlv(&mut tlvs, TlvType::AddressRegistration, &registration)?;
        }
        Ok(tlvs)
    }

    /// Mode + SourceAddress, echoed back on the matching Response so the
    /// child can confirm which request it answers.
    pub fn build_response(&self) -> MleResult<Vec<u8>> {
        let mut tlvs = Vec::new();
        append_tlv(&mut tlvs, TlvType::Mode, &[self.device_mode])?;
        append_tlv(&mut tlvs, TlvType::SourceAddress, &self.own_rloc16.to_be_bytes())?;
        Ok(tlvs)
    }

    /// One 17-byte entry (control + full address) per address that has
    /// cleared DAD; `None` when there is nothing to register yet.
    fn address_registration_value(registered: &[RegisteredAddress]) -> Option<Vec<u8>> {
        let mut value = Vec::new();
        for entry in registered.iter().filter(|a| !a.dad_pending) {
            value.push(ADDRESS_REGISTRATION_UNCOMPRESSED);
            value.extend_from_slice(&entry.addr);
        }
        (!value.is_empty()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tlv::{find_tlv, read_all};

    #[test]
    fn request_carries_mode_timeout_and_source_address() {
        let builder = ChildUpdateBuilder::new(0x0f, 240, 0x6c01);
        let tlvs = builder.build_request(&[]).unwrap();

        assert_eq!(find_tlv(&tlvs, TlvType::Mode).unwrap().value, &[0x0f]);
        assert_eq!(find_tlv(&tlvs, TlvType::Timeout).unwrap().value, 240u32.to_be_bytes());
        assert_eq!(find_tlv(&tlvs, TlvType::SourceAddress).unwrap().value, 0x6c01u16.to_be_bytes());
        assert!(find_tlv(&tlvs, TlvType::AddressRegistration).is_err());
    }

    #[test]
    fn dad_pending_addresses_are_excluded_from_registration() {
        let builder = ChildUpdateBuilder::new(0x0f, 240, 0x6c01);
        let registered = [
            RegisteredAddress { addr: [1; 16], dad_pending: true },
            RegisteredAddress { addr: [2; 16], dad_pending: false },
        ];
        let tlvs = builder.build_request(&registered).unwrap();
        let all = read_all(&tlvs).unwrap();
        let registration = all
            .iter()
            .find(|(t, _)| *t == TlvType::AddressRegistration)
            .expect("one address cleared DAD");
        assert_eq!(registration.1.len(), 17);
        assert_eq!(registration.1[0], ADDRESS_REGISTRATION_UNCOMPRESSED);
        assert_eq!(&registration.1[1..], &[2u8; 16]);
    }

    #[test]
    fn response_echoes_mode_and_source_address_only() {
        let builder = ChildUpdateBuilder::new(0x0f, 240, 0x6c01);
        let tlvs = builder.build_response().unwrap();
        let all = read_all(&tlvs).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, TlvType::Mode);
        assert_eq!(all[1].0, TlvType::SourceAddress);
    }
}
