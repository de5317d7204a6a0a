//! End-to-end checks of the decoder and the detector through the public API.
//!
//! Frames are built with `etherparse::PacketBuilder` and, where the two can be
//! compared, the decoded headers are checked against `etherparse`'s slicer.

use etherparse::{PacketBuilder, SlicedPacket, TransportSlice};
use novelscan::detect::Verdict;
use novelscan::{decode, DecodeError, Detector, DetectorConfig, Header, Layer, Outcome, PacketReport, Protocol};

const SRC_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x0a];
const DST_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x0b];
const CLIENT: [u8; 4] = [192, 168, 1, 20];
const SERVER: [u8; 4] = [192, 168, 1, 1];

fn tcp_frame(vlan: Option<u16>, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    match vlan {
        Some(id) => PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .single_vlan(id)
            .ipv4(CLIENT, SERVER, 64)
            .tcp(40000, dst_port, 1000, 4096)
            .ack(2000)
            .write(&mut out, payload)
            .unwrap(),
        None => PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
            .ipv4(CLIENT, SERVER, 64)
            .tcp(40000, dst_port, 1000, 4096)
            .ack(2000)
            .write(&mut out, payload)
            .unwrap(),
    }
    out
}

fn syn_frame(src_port: u16, dst_port: u16) -> Vec<u8> {
    let mut out = Vec::new();
    PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4(CLIENT, SERVER, 128)
        .tcp(src_port, dst_port, 0xdead_beef, 65535)
        .syn()
        .write(&mut out, &[])
        .unwrap();
    out
}

/// UDP-Lite over IPv4; etherparse has no UDP-Lite step, so the transport
/// header is written by hand behind IP protocol 136.
fn udplite_frame(coverage: u16, payload: &[u8]) -> Vec<u8> {
    let mut lite = Vec::new();
    lite.extend_from_slice(&5004u16.to_be_bytes());
    lite.extend_from_slice(&5004u16.to_be_bytes());
    lite.extend_from_slice(&coverage.to_be_bytes());
    lite.extend_from_slice(&[0, 0]);
    lite.extend_from_slice(payload);

    let mut out = Vec::new();
    PacketBuilder::ethernet2(SRC_MAC, DST_MAC)
        .ipv4(CLIENT, SERVER, 64)
        .write(&mut out, 136, &lite)
        .unwrap();
    out
}

fn detector(max_training: u64) -> Detector {
    Detector::new(DetectorConfig { max_training, ..Default::default() }).unwrap()
}

fn scored(outcome: Outcome) -> PacketReport {
    match outcome {
        Outcome::Decoded { verdict: Verdict::Scored(r), .. } => r,
        other => panic!("expected a scored packet, got {:?}", other),
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

#[test]
fn tcp_header_matches_etherparse() {
    let frame = syn_frame(51515, 443);
    let sliced = SlicedPacket::from_ethernet(&frame).unwrap();
    let reference = match sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => tcp,
        other => panic!("etherparse sliced {:?}", other),
    };

    let packet = decode(&frame, 3).unwrap();
    let tcp = match packet.header(Protocol::Tcp) {
        Some(Header::Tcp(tcp)) => tcp,
        other => panic!("decoded {:?}", other),
    };

    assert_eq!(tcp.src_port, reference.source_port());
    assert_eq!(tcp.dst_port, reference.destination_port());
    assert_eq!(tcp.seq, reference.sequence_number());
    assert_eq!(tcp.ack, reference.acknowledgment_number());
    assert_eq!(tcp.data_offset, reference.data_offset() * 4);
    assert_eq!(tcp.window, reference.window_size());
    assert_eq!(tcp.checksum, reference.checksum());
    assert_eq!(tcp.flags.syn, reference.syn());
    assert_eq!(tcp.flags.ack, reference.ack());
    assert_eq!(tcp.flags.letters(), "S");

    let fields = packet.header(Protocol::Tcp).unwrap().fields();
    assert_eq!(fields.get("tcp_syn").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(fields.get("tcp_fin").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(fields.get("tcp_seqnum").and_then(|v| v.as_u64()), Some(0xdead_beef));
}

#[test]
fn zero_depth_keeps_the_frame_opaque() {
    let frame = tcp_frame(None, 80, b"GET /");
    let packet = decode(&frame, 0).unwrap();
    assert_eq!(packet.layers(), &[Layer::Payload(frame.clone())]);
    assert!(packet.scored_fields().is_empty());
}

#[test]
fn vlan_tag_does_not_cost_depth() {
    let tagged = decode(&tcp_frame(Some(100), 80, b"x"), 2).unwrap();
    assert_eq!(
        tagged.protocols(),
        vec![Protocol::Ethernet, Protocol::Vlan, Protocol::Ipv4, Protocol::Tcp]
    );
    assert_eq!(tagged.payload(), b"x");

    let untagged = decode(&tcp_frame(None, 80, b"x"), 2).unwrap();
    assert_eq!(untagged.protocols(), vec![Protocol::Ethernet, Protocol::Ipv4]);

    let untagged = decode(&tcp_frame(None, 80, b"x"), 3).unwrap();
    assert_eq!(tagged.scored_fields(), untagged.scored_fields());
}

#[test]
fn truncated_tcp_header_is_rejected() {
    let mut frame = tcp_frame(None, 80, b"");
    frame.truncate(14 + 20 + 10);
    assert_eq!(
        decode(&frame, 3),
        Err(DecodeError::TruncatedHeader { protocol: Protocol::Tcp, needed: 20, available: 10 })
    );
    // The same bytes are fine as long as TCP is out of reach.
    assert_eq!(decode(&frame, 2).unwrap().payload().len(), 10);
}

#[test]
fn packet_serialises_to_json() {
    let packet = decode(&tcp_frame(Some(7), 22, b"\x00\xff"), 3).unwrap();
    let json = serde_json::to_value(&packet).unwrap();
    let layers = json["layers"].as_array().unwrap();
    assert_eq!(layers.len(), 5);
    assert_eq!(layers[1]["header"]["protocol"], "vlan");
    assert_eq!(layers[1]["header"]["fields"]["vlan_id"], 7);
    assert_eq!(layers[2]["header"]["fields"]["ip_src"], "192.168.1.20");
    assert_eq!(layers[3]["header"]["fields"]["tcp_dstport"], 22);
    assert_eq!(layers[4]["payload"], "00ff");
}

// ── Detection ────────────────────────────────────────────────────────────────

#[test]
fn novel_value_after_long_training_scores_one() {
    let mut d = detector(1000);
    let common = tcp_frame(None, 80, b"");
    for _ in 0..1000 {
        d.process_frame(&common).unwrap();
    }
    assert!(d.is_trained());

    let report = scored(d.process_frame(&tcp_frame(None, 8081, b"")).unwrap());
    assert_eq!(report.index, 1000);
    assert_eq!(report.score, 1.0);
    assert!(report.anomalous);
    let top = report.top_field().unwrap();
    assert_eq!((top.field.as_str(), top.value.as_str()), ("tcp_dstport", "8081"));

    // Every other field was seen in the previous packet, 1000 out of 1000 times.
    for f in report.fields.iter().filter(|f| f.field != "tcp_dstport" && f.field != "ip_sum") {
        assert!(f.score <= 1e-6 + f64::EPSILON, "{} scored {}", f.field, f.score);
    }

    let report = scored(d.process_frame(&common).unwrap());
    assert!(!report.anomalous);
    assert!(report.score < 0.01);
}

#[test]
fn packet_is_scored_before_it_is_observed() {
    let mut d = detector(10);
    for _ in 0..10 {
        d.process_frame(&tcp_frame(None, 80, b"")).unwrap();
    }

    let novel = tcp_frame(None, 3389, b"");
    let first = scored(d.process_frame(&novel).unwrap());
    assert_eq!(first.score, 1.0);

    let stat = d.store().lookup_value("tcp_dstport", "3389").unwrap();
    assert_eq!((stat.total_seen_count, stat.last_seen_index), (1, 10));

    // Seen once, one packet ago; the 11:1 ratio is capped at the training size.
    let second = scored(d.process_frame(&novel).unwrap());
    let port = second.fields.iter().find(|f| f.field == "tcp_dstport").unwrap();
    assert_eq!(port.time_score, 1.0);
    assert_eq!(port.frequency_score, 10.0);
}

#[test]
fn udplite_checksum_coverage_is_scored() {
    let mut d = detector(20);
    for _ in 0..20 {
        d.process_frame(&udplite_frame(8, b"rtp")).unwrap();
    }
    assert_eq!(d.store().lookup_value("udpl_cover", "8").unwrap().total_seen_count, 20);

    let report = scored(d.process_frame(&udplite_frame(11, b"rtp")).unwrap());
    assert!(report.anomalous);
    let top = report.top_field().unwrap();
    assert_eq!((top.field.as_str(), top.value.as_str(), top.score), ("udpl_cover", "11", 1.0));
    assert!(report.fields.iter().any(|f| f.field == "udpl_srcport"));
    assert!(report.fields.iter().all(|f| f.field != "udpl_sum"));
}

#[test]
fn statistics_grow_monotonically() {
    let frames = [
        tcp_frame(None, 80, b""),
        tcp_frame(Some(5), 443, b""),
        syn_frame(50000, 22),
    ];
    let mut d = detector(4);
    let mut last = (0, 0);

    for i in 0..30u64 {
        d.process_frame(&frames[(i % 3) as usize]).unwrap();

        let field = d.store().lookup_field("tcp_dstport").unwrap();
        assert_eq!(field.total_seen_count, i + 1);
        assert_eq!(field.last_seen_index, i);

        let counts = (d.store().field_count(), d.store().value_count());
        assert!(counts.0 >= last.0 && counts.1 >= last.1);
        last = counts;
    }

    let https = d.store().lookup_value("tcp_dstport", "443").unwrap();
    assert_eq!(https.total_seen_count, 10);
    assert_eq!(https.last_seen_index, 28);
}

#[test]
fn malformed_frames_are_counted_and_skipped() {
    let mut d = detector(2);
    let frame = tcp_frame(None, 80, b"");
    d.process_frame(&frame).unwrap();
    assert!(matches!(d.process_frame(&frame[..30]).unwrap(), Outcome::Malformed { index: 1, .. }));
    let report = scored(d.process_frame(&frame).unwrap());
    assert_eq!(report.index, 2);

    let summary = d.summary();
    assert_eq!(summary.packets, 3);
    assert_eq!(summary.trained, 1);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.scored, 1);
}

#[test]
fn synthetic_stream_flags_only_rare_packets() {
    use novelscan::synthetic::SyntheticStream;

    let mut d = detector(1000);
    let mut flagged = Vec::new();
    for frame in SyntheticStream::new(3000) {
        if let Outcome::Decoded { verdict: Verdict::Scored(r), .. } = d.process_frame(&frame.unwrap()).unwrap() {
            if r.anomalous {
                flagged.push(r.index);
            }
        }
    }
    assert_eq!(flagged, vec![1000, 2000]);
}
