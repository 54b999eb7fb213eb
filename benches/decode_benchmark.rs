//! Performance benchmarks for the decode and dispatch hot path
//!
//! Measures throughput of turning raw stream bytes into sink callbacks.
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flowlink::sse::{DataInfo, Dispatcher, EventSink, LineDecoder, NullSink};
use flowlink::stream::StreamDriver;

/// Counts delivered bytes so the work cannot be optimised away
#[derive(Default)]
struct CountingSink {
    bytes: usize,
}

impl EventSink for CountingSink {
    fn on_data(&mut self, content: &str, _is_first_message: bool, _info: &DataInfo) {
        self.bytes += content.len();
    }
}

/// Generate a stream body of `messages` answer frames with mixed scripts
fn generate_stream(messages: usize) -> Vec<u8> {
    (0..messages)
        .map(|i| {
            format!(
                "data: {{\"event\":\"message\",\"id\":\"m1\",\"task_id\":\"t1\",\"conversation_id\":\"c1\",\"answer\":\"token {} caf\\\\u00e9 你好 \"}}\n\n",
                i
            )
        })
        .collect::<String>()
        .into_bytes()
}

/// Benchmark line decoding alone at different chunk sizes
fn bench_line_decoder(c: &mut Criterion) {
    let body = generate_stream(500);
    let mut group = c.benchmark_group("line_decoder");
    group.throughput(Throughput::Bytes(body.len() as u64));

    for chunk_size in [16, 256, 4096].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_byte_chunks", chunk_size)),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = LineDecoder::new();
                    let mut lines = 0;
                    for chunk in body.chunks(chunk_size) {
                        lines += decoder.decode(black_box(chunk)).len();
                    }
                    black_box(lines)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark frame parsing and dispatch of pre-split lines
fn bench_dispatch(c: &mut Criterion) {
    let body = String::from_utf8(generate_stream(500)).unwrap_or_default();
    let lines: Vec<&str> = body.lines().collect();

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("500_messages", |b| {
        b.iter(|| {
            let mut dispatcher = Dispatcher::new();
            let mut sink = NullSink;
            for line in &lines {
                black_box(dispatcher.dispatch_line(black_box(line), &mut sink));
            }
        });
    });
    group.finish();
}

/// Benchmark the full driver path fed chunk by chunk
fn bench_driver_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("driver_feed");

    for messages in [10, 100, 1000].iter() {
        let body = generate_stream(*messages);
        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_messages", messages)),
            &body,
            |b, body| {
                b.iter(|| {
                    let mut driver = StreamDriver::new();
                    let mut sink = CountingSink::default();
                    for chunk in body.chunks(1024) {
                        if driver.feed(black_box(chunk), &mut sink).is_some() {
                            break;
                        }
                    }
                    black_box(sink.bytes)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_line_decoder,
    bench_dispatch,
    bench_driver_feed
);
criterion_main!(benches);
