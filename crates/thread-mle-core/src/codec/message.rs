//! Whole-message build/parse (spec §4.7, §6): security-suite byte,
//! optional security header, command byte, TLV stream, optional tag.
//! The command byte travels in the clear (it sits before the TLV
//! region the wire diagram marks as ciphertext) but is folded into the
//! AEAD's associated data so it is still authenticated.

use alloc::vec::Vec;

use crate::error::{MleError, MleResult};
use crate::types::ExtAddr;

use super::security::{self, SecurityHeader, CCM_TAG_LEN, SECURITY_HEADER_LEN};

pub const SECURITY_SUITE_SECURED: u8 = 0;
pub const SECURITY_SUITE_NONE: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MleCommand {
    LinkRequest,
    LinkAccept,
    LinkAcceptAndRequest,
    LinkReject,
    Advertisement,
    Update,
    UpdateRequest,
    DataRequest,
    DataResponse,
    ParentRequest,
    ParentResponse,
    ChildIdRequest,
    ChildIdResponse,
    ChildUpdateRequest,
    ChildUpdateResponse,
    Announce,
    DiscoveryRequest,
    DiscoveryResponse,
    Unknown(u8),
}

impl MleCommand {
    pub fn to_byte(self) -> u8 {
        match self {
            Self::LinkRequest => 0,
            Self::LinkAccept => 1,
            Self::LinkAcceptAndRequest => 2,
            Self::LinkReject => 3,
            Self::Advertisement => 4,
            Self::Update => 5,
            Self::UpdateRequest => 6,
            Self::DataRequest => 7,
            Self::DataResponse => 8,
            Self::ParentRequest => 9,
            Self::ParentResponse => 10,
            Self::ChildIdRequest => 11,
            Self::ChildIdResponse => 12,
            Self::ChildUpdateRequest => 13,
            Self::ChildUpdateResponse => 14,
            Self::Announce => 15,
            Self::DiscoveryRequest => 16,
            Self::DiscoveryResponse => 17,
            Self::Unknown(byte) => byte,
        }
    }

    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::LinkRequest,
            1 => Self::LinkAccept,
            2 => Self::LinkAcceptAndRequest,
            3 => Self::LinkReject,
            4 => Self::Advertisement,
            5 => Self::Update,
            6 => Self::UpdateRequest,
            7 => Self::DataRequest,
            8 => Self::DataResponse,
            9 => Self::ParentRequest,
            10 => Self::ParentResponse,
            11 => Self::ChildIdRequest,
            12 => Self::ChildIdResponse,
            13 => Self::ChildUpdateRequest,
            14 => Self::ChildUpdateResponse,
            15 => Self::Announce,
            16 => Self::DiscoveryRequest,
            17 => Self::DiscoveryResponse,
            other => Self::Unknown(other),
        }
    }

    /// Commands the `NoSecurity` suite may carry (spec §4.8).
    pub fn allowed_unsecured(self) -> bool {
        matches!(self, Self::DiscoveryRequest | Self::DiscoveryResponse)
    }
}

/// Build an unsecured message (`DiscoveryRequest`/`DiscoveryResponse`
/// only).
pub fn build_unsecured(command: MleCommand, tlvs: &[u8]) -> MleResult<Vec<u8>> {
    if !command.allowed_unsecured() {
        return Err(MleError::Security);
    }
    let mut out = Vec::with_capacity(2 + tlvs.len());
    out.push(SECURITY_SUITE_NONE);
    out.push(command.to_byte());
    out.extend_from_slice(tlvs);
    Ok(out)
}

/// Build a secured message. `tlvs` is encrypted; `command` rides in the
/// clear but is authenticated via the AEAD's associated data.
#[allow(clippy::too_many_arguments)]
pub fn build_secured(
    header: &SecurityHeader,
    command: MleCommand,
    tlvs: &[u8],
    key: &[u8; 16],
    ext_addr: ExtAddr,
    sender_ip: [u8; 16],
    receiver_ip: [u8; 16],
    security_level: u8,
) -> MleResult<Vec<u8>> {
    let nonce = security::build_nonce(ext_addr, header.frame_counter, security_level);
    let mut aad = security::build_aad(sender_ip, receiver_ip, header);
    aad.push(command.to_byte());

    let mut ciphertext = tlvs.to_vec();
    security::encrypt(key, nonce, &aad, &mut ciphertext)?;

    let mut out = Vec::with_capacity(1 + SECURITY_HEADER_LEN + 1 + ciphertext.len());
    out.push(SECURITY_SUITE_SECURED);
    out.extend_from_slice(&header.encode());
    out.push(command.to_byte());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decoded secured message: header, command, and the decrypted TLV
/// stream (tag already stripped).
pub struct SecuredMessage {
    pub header: SecurityHeader,
    pub command: MleCommand,
    pub tlvs: Vec<u8>,
}

#[allow(clippy::too_many_arguments)]
pub fn parse_secured(
    buf: &[u8],
    key: &[u8; 16],
    ext_addr: ExtAddr,
    sender_ip: [u8; 16],
    receiver_ip: [u8; 16],
    security_level: u8,
) -> MleResult<SecuredMessage> {
    let min_len = 1 + SECURITY_HEADER_LEN + 1 + CCM_TAG_LEN;
    if buf.len() < min_len {
        return Err(MleError::Parse);
    }
    let header = SecurityHeader::decode(&buf[1..])?;
    let command_byte = buf[1 + SECURITY_HEADER_LEN];
    let mut body = buf[1 + SECURITY_HEADER_LEN + 1..].to_vec();

    let nonce = security::build_nonce(ext_addr, header.frame_counter, security_level);
    let mut aad = security::build_aad(sender_ip, receiver_ip, &header);
    aad.push(command_byte);
    security::decrypt(key, nonce, &aad, &mut body)?;

    Ok(SecuredMessage {
        header,
        command: MleCommand::from_byte(command_byte),
        tlvs: body,
    })
}

/// Peek the security suite byte without touching anything else.
pub fn security_suite(buf: &[u8]) -> MleResult<u8> {
    buf.first().copied().ok_or(MleError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::tlv::{append_tlv, find_tlv, TlvType};

    #[test]
    fn unsecured_build_rejects_non_discovery_commands() {
        let err = build_unsecured(MleCommand::ParentRequest, &[]).unwrap_err();
        assert_eq!(err, MleError::Security);
    }

    #[test]
    fn secured_round_trip_recovers_command_and_tlvs() {
        let key = [3u8; 16];
        let ext_addr = [4u8; 8];
        let header = SecurityHeader {
            control: 1,
            frame_counter: 9,
            key_id: 2,
        };
        let mut tlvs = Vec::new();
        append_tlv(&mut tlvs, TlvType::Timeout, &240u32.to_le_bytes()).unwrap();

        let wire = build_secured(
            &header,
            MleCommand::ChildUpdateRequest,
            &tlvs,
            &key,
            ext_addr,
            [1; 16],
            [2; 16],
            5,
        )
        .unwrap();

        assert_eq!(wire[0], SECURITY_SUITE_SECURED);

        let parsed = parse_secured(&wire, &key, ext_addr, [1; 16], [2; 16], 5).unwrap();
        assert_eq!(parsed.command, MleCommand::ChildUpdateRequest);
        assert_eq!(parsed.header, header);
        let tlv = find_tlv(&parsed.tlvs, TlvType::Timeout).unwrap();
        assert_eq!(tlv.value, 240u32.to_le_bytes());
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let ext_addr = [4u8; 8];
        let header = SecurityHeader::default();
        let wire = build_secured(
            &header,
            MleCommand::DataRequest,
            &[],
            &[1u8; 16],
            ext_addr,
            [0; 16],
            [0; 16],
            5,
        )
        .unwrap();
        let err = parse_secured(&wire, &[2u8; 16], ext_addr, [0; 16], [0; 16], 5).unwrap_err();
        assert_eq!(err, MleError::Security);
    }
}
