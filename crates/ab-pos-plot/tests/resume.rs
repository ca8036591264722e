//! Resume-after-failure property from §8: killing the build after table 4
//! commits, then retrying, reproduces a clean plot's T1..T4 bytes exactly
//! and still yields valid proofs.

use ab_pos_plot::{FileStorage, ForwardPropagator, Header, Plotter, Prover};

const K: u32 = 18;
const MEMORY_BUDGET: u64 = 64 * 1024 * 1024;

#[test]
fn resuming_after_table_four_matches_a_clean_plot_through_table_four() {
    let seed = [0x11u8; 32];

    let clean_file = tempfile::NamedTempFile::new().unwrap();
    let clean_storage = FileStorage::open(clean_file.path()).unwrap();
    let clean_header = Plotter::new(seed, K, MEMORY_BUDGET)
        .unwrap()
        .run(&clean_storage, false, None)
        .unwrap();

    let partial_file = tempfile::NamedTempFile::new().unwrap();
    let partial_storage = FileStorage::open(partial_file.path()).unwrap();
    let mut partial_header = Header::new(seed, K).unwrap();
    partial_header.write(&partial_storage).unwrap();
    let propagator = ForwardPropagator::new(&partial_storage, seed, K, MEMORY_BUDGET);
    propagator.write_t1(&mut partial_header).unwrap();
    for t in 2..=4u8 {
        propagator.propagate_table(t, &mut partial_header).unwrap();
    }
    assert_eq!(partial_header.cursor_idx, 4);
    let table_four_end = partial_header.cursor_end;

    let resumed_header = Plotter::new(seed, K, MEMORY_BUDGET)
        .unwrap()
        .run(&partial_storage, true, None)
        .unwrap();
    assert_eq!(resumed_header.cursor_idx, 8);

    let clean_bytes = std::fs::read(clean_file.path()).unwrap();
    let resumed_bytes = std::fs::read(partial_file.path()).unwrap();
    assert_eq!(
        clean_bytes[..table_four_end as usize],
        resumed_bytes[..table_four_end as usize]
    );
    assert_eq!(clean_header.cursor_end, resumed_header.cursor_end);
    assert_eq!(clean_bytes, resumed_bytes);

    let prover = Prover::open(&partial_storage).unwrap();
    let challenge = {
        let mut c = [0u8; 32];
        c[0] = 0x99;
        c
    };
    assert!(
        (0..256u16)
            .map(|i| {
                let mut c = challenge;
                c[31] = c[31].wrapping_add(i as u8);
                c
            })
            .any(|c| prover.prove(&c).is_ok())
    );
}
