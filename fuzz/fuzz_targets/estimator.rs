#![no_main]

use hll_estimator::HyperLogLog;
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let precision = 4 + data[0] % 15;
    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data[1..].split_at(split_index.min(data.len() - 1));

    let mut estimator = HyperLogLog::new(precision).unwrap();
    for chunk in first_half.chunks(4) {
        estimator.add(chunk);
        assert!(estimator.count() > 0);
    }
    let snapshot = estimator.clone();

    for chunk in second_half.chunks(4) {
        estimator.add(chunk);
        assert!(estimator.count() > 0);
    }
    assert!(snapshot
        .registers()
        .iter()
        .zip(estimator.registers())
        .all(|(old, new)| old <= new));

    // re-adding seen elements never changes state
    let before = estimator.clone();
    for chunk in first_half.chunks(4).chain(second_half.chunks(4)) {
        estimator.add(chunk);
    }
    assert!(before == estimator);
    assert!(estimator.registers().iter().all(|&r| r <= 64 - precision + 1));
});
