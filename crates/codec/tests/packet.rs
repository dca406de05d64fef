use codec::{Error, Packet};

#[test]
fn round_trip_matches_for_every_payload_length() -> Result<(), Error> {
    let mut buf = [0u8; 600];

    for length in [0usize, 1, 12, 255, 511, 512] {
        let payload: Vec<u8> = (0..length).map(|i| (i % 256) as u8).collect();
        let pkt = Packet::data(length as u8, 17, 0xdead_beef, payload)?;

        let n = pkt.encode(&mut buf)?;
        let decoded = Packet::decode(&buf[..n])?;

        assert_eq!(decoded, pkt);
    }

    Ok(())
}

#[test]
fn decode_rejects_truncated_datagram() {
    let pkt = Packet::data(4, 3, 1, vec![1, 2, 3, 4, 5]).unwrap();
    let mut buf = [0u8; 64];
    let n = pkt.encode(&mut buf).unwrap();

    assert_eq!(Packet::decode(&buf[..n - 2]), Err(Error::Inconsistent));
}

#[test]
fn decode_rejects_trailing_garbage() {
    let pkt = Packet::data(4, 3, 1, vec![1, 2, 3]).unwrap();
    let mut buf = [0u8; 64];
    let n = pkt.encode(&mut buf).unwrap();

    assert_eq!(Packet::decode(&buf[..n + 3]), Err(Error::Inconsistent));
}

#[test]
fn truncated_data_packet_round_trips_with_no_payload() -> Result<(), Error> {
    let pkt = Packet::truncated(200, 9, 123)?;
    let mut buf = [0u8; 64];
    let n = pkt.encode(&mut buf)?;

    assert_eq!(n, 12);

    let decoded = Packet::decode(&buf[..n])?;
    assert!(decoded.tr());
    assert_eq!(decoded.length(), 0);
    assert_eq!(decoded.payload(), None);

    Ok(())
}

#[test]
fn ack_and_nack_carry_no_payload() -> Result<(), Error> {
    for pkt in [Packet::ack(5, 31, 1)?, Packet::nack(5, 31, 1)?] {
        let mut buf = [0u8; 64];
        let n = pkt.encode(&mut buf)?;
        assert_eq!(n, 12);
        assert_eq!(Packet::decode(&buf[..n])?, pkt);
    }

    Ok(())
}
