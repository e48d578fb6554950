//! Scans a byte buffer for `0xAA995566` sync words.
//!
//! Sync candidates are found at every byte offset, not only word-aligned
//! ones, because the same byte pattern can legitimately appear inside an
//! FDRI configuration payload.

/// The 32-bit sync word that marks the start of a configuration section.
pub const SYNC_WORD: [u8; 4] = [0xAA, 0x99, 0x55, 0x66];

/// Returns every byte offset at which [`SYNC_WORD`] occurs in `buf`, in
/// ascending order.
pub fn find_all_syncs(buf: &[u8]) -> Vec<usize> {
    if buf.len() < SYNC_WORD.len() {
        return Vec::new();
    }
    buf.windows(SYNC_WORD.len())
        .enumerate()
        .filter_map(|(i, w)| if w == SYNC_WORD { Some(i) } else { None })
        .collect()
}

/// Returns the smallest sync offset that is `>= threshold`, given a
/// sorted list of sync offsets.
pub fn next_sync_at_or_after(syncs: &[usize], threshold: usize) -> Option<usize> {
    let idx = syncs.partition_point(|&s| s < threshold);
    syncs.get(idx).copied()
}
