#![no_main]
use libfuzzer_sys::fuzz_target;
use rustyhdf5_space::{Dataspace, SelectionIter};

fuzz_target!(|data: &[u8]| {
    if let Some(space) = Dataspace::decode(data).ok().filter(|s| s.num_elem() <= 1 << 20) {
        if let Ok(mut it) = SelectionIter::new(&space, 1) {
            while let Ok(list) = it.get_seq_list(64, 1 << 16) {
                if list.seqs.is_empty() {
                    break;
                }
            }
        }
    }
    for dims in [&[16u64][..], &[8, 8], &[4, 4, 4]] {
        let mut space = Dataspace::simple(dims).unwrap();
        let _ = space.deserialize_selection(data);
    }
});
