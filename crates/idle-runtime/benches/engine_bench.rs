use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use idle_core::{Catalog, ManualClock, UpgradeId};
use idle_runtime::Game;
use persistence::MemoryStore;

fn bench_engines(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    let mut game = Game::builder()
        .catalog(Catalog::builtin())
        .store(MemoryStore::new())
        .clock(clock.clone())
        .build()
        .unwrap();
    game.start();
    for _ in 0..2_000 {
        game.click();
    }
    for id in ["stronger_finger", "auto_tapper", "steel_gloves", "point_farm"] {
        while game.purchase_upgrade(&UpgradeId::new(id)).is_ok() {
            if game.upgrade_level(&UpgradeId::new(id)) >= 10 {
                break;
            }
        }
    }

    c.bench_function("click", |b| b.iter(|| game.click()));
    c.bench_function("tick", |b| {
        b.iter(|| {
            clock.advance_secs(1);
            game.tick();
        })
    });
}

criterion_group!(benches, bench_engines);
criterion_main!(benches);
