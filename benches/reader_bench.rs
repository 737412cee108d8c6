use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fastqio::FastqReaderBuilder;
use std::io::Write;
use tempfile::NamedTempFile;

fn generate_fastq(num_records: usize, seq_len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let bases = b"ACGT";

    for i in 0..num_records {
        writeln!(file, "@SEQ_{} description", i).unwrap();
        let seq: Vec<u8> = (0..seq_len).map(|j| bases[(i + j) % 4]).collect();
        file.write_all(&seq).unwrap();
        writeln!(file, "\n+").unwrap();
        let qual: Vec<u8> = (0..seq_len).map(|j| b'!' + ((i * 3 + j) % 41) as u8).collect();
        file.write_all(&qual).unwrap();
        writeln!(file).unwrap();
    }

    file
}

fn bench_operations(c: &mut Criterion) {
    let file = generate_fastq(20_000, 150);
    let bytes = std::fs::metadata(file.path()).unwrap().len();

    let mut group = c.benchmark_group("reader");
    group.throughput(Throughput::Bytes(bytes));
    group.sample_size(10);

    for workers in [1, 2, 4, 8] {
        let mut reader = FastqReaderBuilder::new()
            .workers(workers)
            .chunk_size(2_000)
            .open(file.path())
            .unwrap();

        group.bench_with_input(BenchmarkId::new("count_reads", workers), &workers, |b, _| {
            b.iter(|| black_box(reader.count_reads().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("trim", workers), &workers, |b, _| {
            b.iter(|| black_box(reader.trim(5, 10).unwrap().len()));
        });
        group.bench_with_input(BenchmarkId::new("filter_quality", workers), &workers, |b, _| {
            b.iter(|| black_box(reader.filter_quality(20.0).unwrap().len()));
        });
        group.bench_with_input(BenchmarkId::new("extract", workers), &workers, |b, _| {
            b.iter(|| black_box(reader.extract(10, 60).unwrap().len()));
        });
    }

    group.finish();
}

fn bench_iteration(c: &mut Criterion) {
    let file = generate_fastq(20_000, 150);
    let mut reader = FastqReaderBuilder::new().open(file.path()).unwrap();

    c.bench_function("records_sequential", |b| {
        b.iter(|| black_box(reader.records().unwrap().count()));
    });
}

criterion_group!(benches, bench_operations, bench_iteration);
criterion_main!(benches);
