use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rustyhdf5_space::{
    Dataspace, PointOp, SelectOp, SelectionIter, Strategy, TransferEngine, TransferProps,
};

const N: u64 = 1024;

fn strided() -> Dataspace {
    let mut s = Dataspace::simple(&[N, N]).unwrap();
    s.select_hyperslab(SelectOp::Set, &[0, 0], Some(&[2, 4]), &[N / 2, N / 4], Some(&[1, 3]))
        .unwrap();
    s
}

fn checkerboard() -> Dataspace {
    let mut s = Dataspace::simple(&[N, N]).unwrap();
    s.select_block(SelectOp::Set, &[0, 0], &[7, 7]).unwrap();
    for i in 1..64u64 {
        let o = i * 16;
        s.select_block(SelectOp::Or, &[o, o], &[o + 7, o + 7]).unwrap();
    }
    s
}

/// 32768 row bands, one node each after the Or.
fn banded() -> Dataspace {
    let mut s = Dataspace::simple(&[65536, 16]).unwrap();
    s.select_hyperslab(SelectOp::Set, &[0, 0], Some(&[2, 1]), &[32768, 1], Some(&[1, 8]))
        .unwrap();
    s.select_block(SelectOp::Or, &[65535, 15], &[65535, 15]).unwrap();
    s
}

fn bench_seq_lists(c: &mut Criterion) {
    let all = Dataspace::simple(&[N, N]).unwrap();
    let strided = strided();
    let irregular = checkerboard();
    let bands = banded();
    for (name, space) in [
        ("all", &all),
        ("regular", &strided),
        ("irregular", &irregular),
        ("irregular_bands", &bands),
    ] {
        c.bench_function(&format!("seq_list_{name}"), |b| {
            b.iter(|| {
                let mut it = SelectionIter::new(space, 8).unwrap();
                let mut total = 0usize;
                loop {
                    let list = it.get_seq_list(1024, 1 << 20).unwrap();
                    if list.seqs.is_empty() {
                        break;
                    }
                    total += list.nbytes;
                }
                black_box(total)
            })
        });
    }
}

fn bench_combine(c: &mut Criterion) {
    c.bench_function("combine_or_64_blocks", |b| b.iter(|| black_box(checkerboard().num_elem())));
}

fn bench_points(c: &mut Criterion) {
    let points: Vec<Vec<u64>> = (0..10_000u64).map(|i| vec![(i * 7) % N, (i * 13) % N]).collect();
    c.bench_function("select_elements_10k", |b| {
        b.iter(|| {
            let mut s = Dataspace::simple(&[N, N]).unwrap();
            s.select_elements(PointOp::Set, black_box(&points)).unwrap();
            black_box(s.num_elem())
        })
    });
}

fn bench_transfer(c: &mut Criterion) {
    let file = strided();
    let mem = Dataspace::simple(&[file.num_elem()]).unwrap();
    let store = vec![0u8; (N * N * 8) as usize];
    let mut dst = vec![0u8; (file.num_elem() * 8) as usize];
    for strategy in [Strategy::Zipper, Strategy::Buffered] {
        let mut engine = TransferEngine::new(TransferProps::new().strategy(strategy)).unwrap();
        c.bench_function(&format!("read_strided_{strategy:?}"), |b| {
            b.iter(|| engine.read(&file, &mem, 8, &store, &mut dst).unwrap())
        });
    }
}

criterion_group!(benches, bench_seq_lists, bench_combine, bench_points, bench_transfer);
criterion_main!(benches);
