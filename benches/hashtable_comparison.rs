use alloc::format;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::hash::Hasher;
use core::hint::black_box;

use chain_hash::HashMap as ChainHashMap;
use chain_hash::HashTable as ChainHashTable;
use chain_hash::hash::spread;
use chain_hash::hash_table::Entry as ChainEntry;
use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::hash_table::Entry as HashbrownEntry;
use hashbrown::hash_table::HashTable as HashbrownHashTable;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use siphasher::sip::SipHasher;

extern crate alloc;

trait KeyValuePair: Clone {
    fn new(key: u64) -> Self;

    fn hash_key(&self) -> u64;
    fn eq_key(&self, other: &Self) -> bool;

    /// The 32-bit spread hash the chained table indexes by.
    fn chain_hash(&self) -> u32 {
        spread(self.hash_key() as u32)
    }
}

#[derive(Clone)]
struct TestItem {
    key: String,
    _value: u64,
}

impl KeyValuePair for TestItem {
    fn new(key: u64) -> Self {
        black_box(Self {
            key: format!("key_{:016X}", key),
            _value: key,
        })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

#[derive(Clone)]
struct SmallTestItem {
    key: u64,
}

impl KeyValuePair for SmallTestItem {
    fn new(key: u64) -> Self {
        black_box(Self { key })
    }

    fn hash_key(&self) -> u64 {
        let mut hasher = SipHasher::new();
        self.key.hash(&mut hasher);
        hasher.finish()
    }

    fn eq_key(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

#[derive(Clone, Default)]
struct SipState;

impl BuildHasher for SipState {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> SipHasher {
        SipHasher::new()
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 11),
    (1 << 12),
    (1 << 13),
    (1 << 14),
    (1 << 15),
    (1 << 16),
];

fn random_items<TestItem: KeyValuePair>(count: usize) -> Vec<TestItem> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| TestItem::new(rng.try_next_u64().unwrap()))
        .collect()
}

fn fill_chain<TestItem: KeyValuePair>(
    table: &mut ChainHashTable<TestItem>,
    items: impl IntoIterator<Item = TestItem>,
) {
    for item in items {
        match table.entry(item.chain_hash(), |v| v.eq_key(&item)) {
            ChainEntry::Vacant(entry) => {
                black_box(entry.insert(item));
            }
            ChainEntry::Occupied(_) => unreachable!(),
        }
    }
}

fn fill_hashbrown<TestItem: KeyValuePair>(
    table: &mut HashbrownHashTable<TestItem>,
    items: impl IntoIterator<Item = TestItem>,
) {
    for item in items {
        match table.entry(item.hash_key(), |v| v.eq_key(&item), |v| v.hash_key()) {
            HashbrownEntry::Vacant(entry) => {
                black_box(entry.insert(item));
            }
            HashbrownEntry::Occupied(_) => unreachable!(),
        }
    }
}

fn bench_insert_random<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "insert_random_{}",
        core::any::type_name::<TestItem>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = random_items::<TestItem>(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut items = items.clone();
                    items.shuffle(&mut SmallRng::from_os_rng());
                    items
                },
                |items| {
                    // Start small so the benchmark covers every doubling.
                    let mut table = ChainHashTable::<TestItem>::with_capacity(16).unwrap();
                    fill_chain(&mut table, items);
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut items = items.clone();
                    items.shuffle(&mut SmallRng::from_os_rng());
                    items
                },
                |items| {
                    let mut table = HashbrownHashTable::with_capacity(0);
                    fill_hashbrown(&mut table, items);
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_insert_random_preallocated<TestItem: KeyValuePair, const MAX_SIZE: usize>(
    c: &mut Criterion,
) {
    let mut group = c.benchmark_group(format!(
        "insert_random_preallocated_{}",
        core::any::type_name::<TestItem>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = random_items::<TestItem>(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut items = items.clone();
                    items.shuffle(&mut SmallRng::from_os_rng());
                    items
                },
                |items| {
                    // Large enough that the threshold is never crossed.
                    let mut table = ChainHashTable::<TestItem>::with_capacity(size * 2).unwrap();
                    fill_chain(&mut table, items);
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut items = items.clone();
                    items.shuffle(&mut SmallRng::from_os_rng());
                    items
                },
                |items| {
                    let mut table = HashbrownHashTable::<TestItem>::with_capacity(size);
                    fill_hashbrown(&mut table, items);
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_find_hit_miss<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "find_hit_miss_{}",
        core::any::type_name::<TestItem>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        // Even keys are stored, odd keys miss.
        let stored = (0..size as u64 * 2)
            .step_by(2)
            .map(TestItem::new)
            .collect::<Vec<_>>();
        let probes = (0..size as u64).map(TestItem::new).collect::<Vec<_>>();

        let mut chain_table = ChainHashTable::<TestItem>::new();
        fill_chain(&mut chain_table, stored.iter().cloned());

        let mut hashbrown_table = HashbrownHashTable::<TestItem>::with_capacity(0);
        fill_hashbrown(&mut hashbrown_table, stored.iter().cloned());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut probes = probes.clone();
                    probes.shuffle(&mut SmallRng::from_os_rng());
                    probes
                },
                |probes| {
                    for item in probes.iter() {
                        black_box(chain_table.find(item.chain_hash(), |v| v.eq_key(item)));
                    }
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut probes = probes.clone();
                    probes.shuffle(&mut SmallRng::from_os_rng());
                    probes
                },
                |probes| {
                    for item in probes.iter() {
                        black_box(hashbrown_table.find(item.hash_key(), |v| v.eq_key(item)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_iteration<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "iteration_{}",
        core::any::type_name::<TestItem>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let items = random_items::<TestItem>(size);

        let mut chain_table = ChainHashTable::<TestItem>::new();
        fill_chain(&mut chain_table, items.iter().cloned());

        let mut hashbrown_table = HashbrownHashTable::<TestItem>::with_capacity(0);
        fill_hashbrown(&mut hashbrown_table, items.iter().cloned());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter(|| {
                for item in chain_table.iter() {
                    black_box(item);
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for item in hashbrown_table.iter() {
                    black_box(item);
                }
            })
        });
    }
    group.finish();
}

fn bench_mixed_zipf<TestItem: KeyValuePair, const MAX_SIZE: usize>(c: &mut Criterion) {
    for exponent in [1.0, 1.3] {
        let mut group = c.benchmark_group(format!(
            "mixed_zipf_{:.01}_{}",
            exponent,
            core::any::type_name::<TestItem>()
        ));
        group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

        for &size in SIZES[..=MAX_SIZE].iter() {
            let mut rng = SmallRng::from_os_rng();
            let key_distr = Zipf::new(size as f32 * 2.0 - 1.0, exponent).unwrap();

            // Odd draws insert, even draws look up.
            let operations = (0..size * 3)
                .map(|i| (i % 2 == 1, TestItem::new(rng.sample(key_distr) as u64)))
                .collect::<Vec<(bool, TestItem)>>();

            group.throughput(Throughput::Elements(operations.len() as u64));
            group.bench_function(format!("chain_hash/{size}"), |b| {
                b.iter_batched(
                    || operations.clone(),
                    |operations| {
                        let mut table = ChainHashTable::<TestItem>::with_capacity(16).unwrap();
                        for (insert, item) in operations {
                            let hash = item.chain_hash();
                            if insert {
                                match table.entry(hash, |v| v.eq_key(&item)) {
                                    ChainEntry::Vacant(entry) => {
                                        black_box(entry.insert(item));
                                    }
                                    ChainEntry::Occupied(mut occupied) => {
                                        *occupied.get_mut() = item;
                                    }
                                }
                            } else {
                                black_box(table.find(hash, |v| v.eq_key(&item)));
                            }
                        }
                        black_box(table)
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_function(format!("hashbrown/{size}"), |b| {
                b.iter_batched(
                    || operations.clone(),
                    |operations| {
                        let mut table = HashbrownHashTable::<TestItem>::with_capacity(0);
                        for (insert, item) in operations {
                            let hash = item.hash_key();
                            if insert {
                                match table.entry(hash, |v| v.eq_key(&item), |v| v.hash_key()) {
                                    HashbrownEntry::Vacant(entry) => {
                                        black_box(entry.insert(item));
                                    }
                                    HashbrownEntry::Occupied(mut occupied) => {
                                        *occupied.get_mut() = item;
                                    }
                                }
                            } else {
                                black_box(table.find(hash, |v| v.eq_key(&item)));
                            }
                        }
                        black_box(table)
                    },
                    BatchSize::SmallInput,
                )
            });
        }
        group.finish();
    }
}

fn bench_map_put_get<const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_put_get");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let keys = (0..size).map(|i| format!("key_{i}")).collect::<Vec<_>>();

        group.throughput(Throughput::Elements(size as u64 * 2));
        group.bench_function(format!("chain_hash/{size}"), |b| {
            b.iter(|| {
                let mut map = ChainHashMap::with_capacity_and_hasher(16, SipState).unwrap();
                for (i, key) in keys.iter().enumerate() {
                    map.put(key.as_str(), i);
                }
                for key in keys.iter() {
                    black_box(map.get(key.as_str()));
                }
                black_box(map)
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                let mut map = hashbrown::HashMap::with_hasher(SipState);
                for (i, key) in keys.iter().enumerate() {
                    map.insert(key.as_str(), i);
                }
                for key in keys.iter() {
                    black_box(map.get(key.as_str()));
                }
                black_box(map)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<SmallTestItem, 6>,
    bench_insert_random::<TestItem, 6>,
    bench_insert_random_preallocated::<SmallTestItem, 6>,
    bench_insert_random_preallocated::<TestItem, 6>,
    bench_find_hit_miss::<SmallTestItem, 6>,
    bench_find_hit_miss::<TestItem, 6>,
    bench_iteration::<SmallTestItem, 6>,
    bench_iteration::<TestItem, 6>,
    bench_mixed_zipf::<SmallTestItem, 6>,
    bench_mixed_zipf::<TestItem, 6>,
    bench_map_put_get::<6>,
);

criterion_main!(benches);
