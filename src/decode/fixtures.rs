//! Hand-assembled frames for unit tests.

pub const DST_MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
pub const SRC_MAC: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];
pub const SRC_IP: [u8; 4] = [10, 0, 0, 1];
pub const DST_IP: [u8; 4] = [10, 0, 0, 2];

pub fn ethernet(ether_type: u16) -> Vec<u8> {
    let mut v = Vec::with_capacity(14);
    v.extend_from_slice(&DST_MAC);
    v.extend_from_slice(&SRC_MAC);
    v.extend_from_slice(&ether_type.to_be_bytes());
    v
}

pub fn vlan(id: u16, protocol: u16) -> Vec<u8> {
    let mut v = id.to_be_bytes().to_vec();
    v.extend_from_slice(&protocol.to_be_bytes());
    v
}

/// Option-less IPv4 header (checksum left at zero) followed by `payload`.
pub fn ipv4(protocol: u8, payload: &[u8]) -> Vec<u8> {
    let total = (20 + payload.len()) as u16;
    let mut v = vec![0x45, 0x00];
    v.extend_from_slice(&total.to_be_bytes());
    v.extend_from_slice(&[0x1c, 0x46, 0x40, 0x00, 64, protocol, 0, 0]);
    v.extend_from_slice(&SRC_IP);
    v.extend_from_slice(&DST_IP);
    v.extend_from_slice(payload);
    v
}

/// Option-less TCP header with only ACK set, followed by `payload`.
pub fn tcp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(20 + payload.len());
    v.extend_from_slice(&src_port.to_be_bytes());
    v.extend_from_slice(&dst_port.to_be_bytes());
    v.extend_from_slice(&1000u32.to_be_bytes());
    v.extend_from_slice(&2000u32.to_be_bytes());
    v.extend_from_slice(&[0x50, 0x10, 0xff, 0xff, 0, 0, 0, 0]);
    v.extend_from_slice(payload);
    v
}

pub fn udp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let len = (8 + payload.len()) as u16;
    let mut v = Vec::with_capacity(len as usize);
    v.extend_from_slice(&src_port.to_be_bytes());
    v.extend_from_slice(&dst_port.to_be_bytes());
    v.extend_from_slice(&len.to_be_bytes());
    v.extend_from_slice(&[0, 0]);
    v.extend_from_slice(payload);
    v
}

fn link(vlan_id: Option<u16>) -> Vec<u8> {
    match vlan_id {
        Some(id) => {
            let mut v = ethernet(0x8100);
            v.extend(vlan(id, 0x0800));
            v
        }
        None => ethernet(0x0800),
    }
}

pub fn tcp_frame(vlan_id: Option<u16>, src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = link(vlan_id);
    v.extend(ipv4(6, &tcp(src_port, dst_port, payload)));
    v
}

pub fn udp_frame(vlan_id: Option<u16>, src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = link(vlan_id);
    v.extend(ipv4(17, &udp(src_port, dst_port, payload)));
    v
}
