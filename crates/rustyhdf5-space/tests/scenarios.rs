use rustyhdf5_space::{
    gather, scatter, shape_same, Dataspace, DefaultProfiler, HyperDim, PointOp, SelectOp,
    SelectionIter, SelectionKind, Sequence, Strategy, TransferEngine, TransferProps,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn drain(space: &Dataspace, elem_size: usize) -> Vec<Sequence> {
    let mut it = SelectionIter::new(space, elem_size).unwrap();
    let mut out = Vec::new();
    loop {
        let list = it.get_seq_list(1024, usize::MAX).unwrap();
        if list.seqs.is_empty() {
            break;
        }
        out.extend(list.seqs);
    }
    out
}

#[test]
fn scenario_a_block_in_wider_rows() {
    init_tracing();
    let mut s = Dataspace::simple(&[10, 10]).unwrap();
    s.select_hyperslab(SelectOp::Set, &[0, 0], Some(&[1, 1]), &[5, 5], Some(&[1, 1]))
        .unwrap();
    assert_eq!(s.num_elem(), 25);
    let seqs = drain(&s, 4);
    assert_eq!(seqs.len(), 5);
    for (row, seq) in seqs.iter().enumerate() {
        assert_eq!(*seq, Sequence::new(row as u64 * 40, 20));
    }
}

#[test]
fn scenario_b_all_is_one_run() {
    let s = Dataspace::simple(&[10, 10]).unwrap();
    assert_eq!(drain(&s, 4), vec![Sequence::new(0, 400)]);
}

#[test]
fn scenario_c_union_survives_serialization() {
    init_tracing();
    let mut s = Dataspace::simple(&[20]).unwrap();
    s.select_hyperslab(SelectOp::Set, &[0], None, &[5], Some(&[1])).unwrap();
    s.select_hyperslab(SelectOp::Or, &[10], None, &[5], Some(&[1])).unwrap();
    assert_eq!(s.hyper_nblocks().unwrap(), 2);
    assert_eq!(s.num_elem(), 10);

    let bytes = s.serialize_selection().unwrap();
    let mut t = Dataspace::simple(&[20]).unwrap();
    assert_eq!(t.deserialize_selection(&bytes).unwrap(), bytes.len());
    assert_eq!(t.num_elem(), 10);
    assert_eq!(t.hyper_blocklist().unwrap(), s.hyper_blocklist().unwrap());
    assert_eq!(drain(&t, 1), vec![Sequence::new(0, 5), Sequence::new(10, 5)]);
}

#[test]
fn scenario_d_points_keep_insertion_order() {
    let mut s = Dataspace::simple(&[10, 10]).unwrap();
    s.select_elements(PointOp::Set, &[vec![2, 3], vec![5, 5], vec![1, 1]])
        .unwrap();
    assert_eq!(s.num_elem(), 3);
    assert_eq!(
        drain(&s, 4),
        vec![
            Sequence::new(23 * 4, 4),
            Sequence::new(55 * 4, 4),
            Sequence::new(11 * 4, 4),
        ]
    );
}

#[test]
fn normalization_collapses_touching_blocks() {
    let mut s = Dataspace::simple(&[12]).unwrap();
    s.select_hyperslab(SelectOp::Set, &[0], Some(&[2]), &[3], Some(&[2])).unwrap();
    let selection = s.selection().clone();
    if let rustyhdf5_space::Selection::Hyperslab(h) = selection {
        assert_eq!(h.regular_descriptor().unwrap(), vec![HyperDim::new(0, 1, 1, 6)]);
    } else {
        panic!("expected a hyperslab");
    }
    assert_eq!(s.regular_hyperslab().unwrap(), vec![HyperDim::new(0, 2, 3, 2)]);
    assert_eq!(drain(&s, 1), vec![Sequence::new(0, 6)]);
}

#[test]
fn shape_is_translation_invariant() {
    let mut a = Dataspace::simple(&[10, 10]).unwrap();
    a.select_hyperslab(SelectOp::Set, &[0, 0], Some(&[3, 2]), &[2, 3], Some(&[2, 1]))
        .unwrap();
    let mut b = Dataspace::simple(&[40, 40]).unwrap();
    b.select_hyperslab(SelectOp::Set, &[7, 20], Some(&[3, 2]), &[2, 3], Some(&[2, 1]))
        .unwrap();
    assert!(shape_same(&a, &b));

    let mut c = b.clone();
    c.select_block(SelectOp::Or, &[0, 0], &[0, 0]).unwrap();
    assert!(!shape_same(&a, &c));

    let mut shifted = a.clone();
    shifted.set_offset(&[1, 1]).unwrap();
    assert!(shape_same(&a, &shifted));
}

#[test]
fn engine_moves_a_column_into_a_packed_buffer() {
    init_tracing();
    let store: Vec<u8> = (0..100).collect();
    let mut file = Dataspace::simple(&[10, 10]).unwrap();
    file.select_block(SelectOp::Set, &[0, 3], &[9, 3]).unwrap();
    let mem = Dataspace::simple(&[10]).unwrap();

    let profiler = Arc::new(DefaultProfiler::new());
    let mut engine = TransferEngine::new(TransferProps::new().max_sequences(3))
        .unwrap()
        .with_profiler(profiler.clone());
    let mut dst = [0u8; 10];
    assert_eq!(engine.read(&file, &mem, 1, &store, &mut dst).unwrap(), 10);
    assert_eq!(dst, [3, 13, 23, 33, 43, 53, 63, 73, 83, 93]);
    assert_eq!(profiler.total_bytes_read(), 10);
    assert!(profiler.total_sequences() >= 10);
}

#[test]
fn buffered_write_matches_zipper_write() {
    let mut file = Dataspace::simple(&[6, 6]).unwrap();
    file.select_hyperslab(SelectOp::Set, &[0, 0], Some(&[2, 2]), &[3, 3], None)
        .unwrap();
    let mut mem = Dataspace::simple(&[3, 3]).unwrap();
    mem.select_elements(
        PointOp::Set,
        &[
            vec![2, 2], vec![2, 1], vec![2, 0],
            vec![1, 2], vec![1, 1], vec![1, 0],
            vec![0, 2], vec![0, 1], vec![0, 0],
        ],
    )
    .unwrap();
    let src: Vec<u8> = (0..9).collect();

    let mut zipped: Vec<u8> = vec![0; 36];
    TransferEngine::default()
        .write(&file, &mem, 1, &mut zipped, &src)
        .unwrap();

    let props = TransferProps::new().strategy(Strategy::Buffered).buffer_size(2);
    let mut buffered: Vec<u8> = vec![0; 36];
    TransferEngine::new(props)
        .unwrap()
        .write(&file, &mem, 1, &mut buffered, &src)
        .unwrap();

    assert_eq!(zipped, buffered);
    assert_eq!(zipped[0], 8);
    assert_eq!(zipped[2 * 6 + 2], 4);
    assert_eq!(zipped[1], 0);
}

#[test]
fn gather_then_scatter_restores_selection() {
    let mut s = Dataspace::simple(&[4, 5]).unwrap();
    s.select_block(SelectOp::Set, &[1, 1], &[2, 3]).unwrap();
    s.select_block(SelectOp::Xor, &[2, 2], &[3, 4]).unwrap();
    let src: Vec<u8> = (0..20).collect();
    let packed = gather(&s, 1, &src).unwrap();
    assert_eq!(packed.len() as u64, s.num_elem());

    let mut dst = vec![0xffu8; 20];
    scatter(&s, 1, &packed, &mut dst).unwrap();
    for (i, (&d, &o)) in dst.iter().zip(&src).enumerate() {
        let coords = [i as u64 / 5, i as u64 % 5];
        let selected = s.intersect_block(&coords, &coords).unwrap();
        assert_eq!(d == o, selected, "element {i}");
    }
}

#[test]
fn codec_roundtrip_keeps_kind_and_extent() {
    let mut s = Dataspace::simple(&[8, 8]).unwrap();
    s.select_elements(PointOp::Set, &[vec![7, 0], vec![0, 7]]).unwrap();
    let decoded = Dataspace::decode(&s.encode().unwrap()).unwrap();
    assert_eq!(decoded.selection_kind(), SelectionKind::Points);
    assert_eq!(decoded.dims(), &[8, 8]);
    assert_eq!(decoded.elem_pointlist().unwrap(), vec![vec![7, 0], vec![0, 7]]);
}
