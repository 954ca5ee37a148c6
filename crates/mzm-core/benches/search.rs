use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use mzm_core::config::PushConfig;
use mzm_core::level_data::LevelData;
use mzm_core::search::{SearchType, Searcher};

/// A level wide and tall enough to give the push-optimal search a real
/// amount of zone-flooding and expansion work to do, still solvable.
fn benchmark_level() -> LevelData {
    let mut l = LevelData::new(8, 20, 0, 7).unwrap();
    for y in 0..8i16 {
        let x = (y * 3 + 2) % 20;
        if !(y == l.start() && x == 0) {
            l.set_block(y, x, true);
        }
    }
    l
}

fn search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_config_breadth_first");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));

    let level = benchmark_level();
    group.bench_function("solve", |b| {
        b.iter(|| {
            let searcher = Searcher::new();
            let init = PushConfig::new(black_box(&level));
            let (result, path) = searcher.find_solution(SearchType::BreadthFirst, init);
            black_box((result, path.len()))
        });
    });

    group.finish();
}

criterion_group!(benches, search_benchmark);
criterion_main!(benches);
