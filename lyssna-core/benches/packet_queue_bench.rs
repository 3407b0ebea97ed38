#[macro_use]
extern crate criterion;

use criterion::Criterion;

use lyssna_capture::Packet;
use lyssna_core::queue::PacketQueue;

fn bench_enqueue_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_queue_throughput");
    let packet = Packet::new(6, 40, "10.0.0.1:443", "10.0.0.2:50000", b"payload");

    for batch in [1usize, 64, 1024] {
        group.throughput(criterion::Throughput::Elements(batch as u64)); // Packets per second
        group.bench_function(format!("batch_{}", batch), |b| {
            let queue = PacketQueue::new();
            b.iter(|| {
                for _ in 0..batch {
                    queue.enqueue(packet.clone());
                }
                assert_eq!(queue.drain_all().len(), batch);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enqueue_drain);
criterion_main!(benches);
