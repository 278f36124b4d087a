use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lzwpack::{pack_bytes, unpack_bytes, MaxBits};
use std::hint::black_box;

fn generate_test_data(size: usize, pattern: &str) -> Vec<u8> {
    match pattern {
        "text" => {
            let base = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ";
            let mut data = Vec::with_capacity(size);
            while data.len() < size {
                data.extend_from_slice(base);
            }
            data.truncate(size);
            data
        }
        "binary" => (0..size).map(|i| ((i * 17 + 11) % 256) as u8).collect(),
        "constant" => vec![0x0A; size],
        _ => panic!("unknown pattern: {pattern}"),
    }
}

fn pack_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_throughput");

    for size in [1024usize, 65536, 1048576] {
        for pattern in ["text", "binary", "constant"] {
            let data = generate_test_data(size, pattern);
            for bits in [12u8, 15] {
                let max_bits = MaxBits::for_pack(bits).unwrap();
                let id = BenchmarkId::from_parameter(format!("{size}/{pattern}/b{bits}"));
                group.throughput(Throughput::Bytes(size as u64));
                group.bench_with_input(id, &data, |b, data| {
                    b.iter(|| pack_bytes(black_box(data), max_bits).unwrap());
                });
            }
        }
    }
    group.finish();
}

fn unpack_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack_throughput");

    for size in [65536usize, 1048576] {
        for pattern in ["text", "binary"] {
            let data = generate_test_data(size, pattern);
            let packed = pack_bytes(&data, MaxBits::DEFAULT).unwrap();
            let id = BenchmarkId::from_parameter(format!("{size}/{pattern}"));
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(id, &packed, |b, packed| {
                b.iter(|| unpack_bytes(black_box(packed)).unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, pack_throughput, unpack_throughput);
criterion_main!(benches);
