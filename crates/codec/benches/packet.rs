use codec::Packet;
use criterion::{criterion_group, criterion_main, Criterion};

fn encode_decode(c: &mut Criterion) {
    let payload = vec![0xab; 512];
    let pkt = Packet::data(42, 17, 0x1234_5678, payload).unwrap();
    let mut buf = [0u8; 600];

    c.bench_function("packet encode (512B payload)", |b| {
        b.iter(|| pkt.encode(&mut buf).unwrap())
    });

    let n = pkt.encode(&mut buf).unwrap();
    c.bench_function("packet decode (512B payload)", |b| {
        b.iter(|| Packet::decode(&buf[..n]).unwrap())
    });
}

criterion_group!(benches, encode_decode);
criterion_main!(benches);
