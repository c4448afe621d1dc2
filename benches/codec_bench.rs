use criterion::{criterion_group, criterion_main, Criterion, Throughput};

fn sample_text(len: usize) -> Vec<u8> {
    let line = b"Now is the winter of our discontent made glorious summer by this sun of York;\n";
    line.iter().cycle().take(len).cloned().collect()
}

fn sample_binary(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545f491;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 8) as u8
        })
        .collect()
}

fn bench_arith(c: &mut Criterion) {
    let mut group = c.benchmark_group("arith");
    for (name, data) in [("text", sample_text(1 << 16)), ("binary", sample_binary(1 << 16))] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("encode_{name}"), |b| {
            b.iter(|| entropress::arith::compress(&data).unwrap())
        });
        let compressed = entropress::arith::compress(&data).unwrap();
        group.bench_function(format!("decode_{name}"), |b| {
            b.iter(|| entropress::arith::expand(&compressed).unwrap())
        });
    }
}

fn bench_huffman(c: &mut Criterion) {
    let mut group = c.benchmark_group("huffman");
    for (name, data) in [("text", sample_text(1 << 16)), ("binary", sample_binary(1 << 16))] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("encode_{name}"), |b| {
            b.iter(|| entropress::huffman::compress(&data))
        });
        let compressed = entropress::huffman::compress(&data);
        group.bench_function(format!("decode_{name}"), |b| {
            b.iter(|| entropress::huffman::expand(&compressed).unwrap())
        });
    }
}

criterion_group!(benches, bench_arith, bench_huffman);
criterion_main!(benches);
