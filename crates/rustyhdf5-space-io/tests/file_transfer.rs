use rustyhdf5_space::{ByteStore, Dataspace, SelectOp, Strategy, TransferEngine, TransferProps};
use rustyhdf5_space_io::{BaseAddr, FileStore};

#[test]
fn write_then_read_a_strided_selection_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = FileStore::create(dir.path().join("dset.bin")).unwrap();
    // the dataset's bytes start after a 64-byte header
    let mut store = BaseAddr::new(file_store, 64);
    store.write_at(0, &[0u8; 8 * 8 * 4]).unwrap();

    let mut file = Dataspace::simple(&[8, 8]).unwrap();
    file.select_hyperslab(SelectOp::Set, &[1, 0], Some(&[2, 3]), &[4, 3], Some(&[1, 2]))
        .unwrap();
    let mem = Dataspace::simple(&[file.num_elem()]).unwrap();
    let src: Vec<u8> = (0..file.num_elem() as u32)
        .flat_map(|v| (v + 1).to_le_bytes())
        .collect();

    let mut engine = TransferEngine::default();
    let written = engine.write(&file, &mem, 4, &mut store, &src).unwrap();
    assert_eq!(written, src.len() as u64);

    let mut back = vec![0u8; src.len()];
    let mut buffered =
        TransferEngine::new(TransferProps::new().strategy(Strategy::Buffered).buffer_size(12))
            .unwrap();
    buffered.read(&file, &mem, 4, &store, &mut back).unwrap();
    assert_eq!(back, src);

    // element (1, 0) is the first selected one
    let mut first = [0u8; 4];
    store.read_at(4 * 8, &mut first).unwrap();
    assert_eq!(u32::from_le_bytes(first), 1);
    let mut header = [0xffu8; 4];
    store.into_inner().read_at(0, &mut header).unwrap();
    assert_eq!(header, [0; 4]);
}

#[test]
fn short_file_reports_bytes_moved() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::create(dir.path().join("short.bin")).unwrap();
    store.write_at(0, &[1u8; 6]).unwrap();

    let file = Dataspace::simple(&[10]).unwrap();
    let mem = Dataspace::simple(&[10]).unwrap();
    let mut dst = [0u8; 10];
    let err = TransferEngine::new(TransferProps::new().direct(false).max_bytes(4))
        .unwrap()
        .read(&file, &mem, 1, &store, &mut dst)
        .unwrap_err();
    assert_eq!(err.bytes_moved(), Some(4));
}
